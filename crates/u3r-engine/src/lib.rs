//! u3r engine crate.
//!
//! A minimal retained-mode rendering core. Callers describe a scene as a few
//! resource objects (camera, light, pass, render objects, textures) and drive
//! one `clear` + `render` per frame through an [`Instance`].
//!
//! All resources are created against an explicit device [`Context`]. The
//! window, surface and frame loop are owned by the caller.

pub mod device;
pub mod logging;
pub mod pass;

mod camera;
mod instance;
mod light;
mod math;
mod object;
mod texture;

pub use camera::Camera;
pub use device::Context;
pub use instance::Instance;
pub use light::{Light, LightColor};
pub use math::{Array, Color, Number, Shared, Transform, Vector3, Vector4, shared};
pub use object::RenderObject;
pub use pass::{CompileReport, Pass, UniformLocation};
pub use texture::{ColorMode, DataType, FilterMode, Texture};
