//! Device context and rendering backends.
//!
//! This module is responsible for:
//! - the [`Backend`] contract every resource talks to
//! - the [`Context`] capability token threaded through constructors
//! - the wgpu backend and a headless recording backend

mod backend;
mod context;
mod gpu;
mod handle;
mod headless;

pub use backend::{
    Backend, BufferKind, DrawCall, ProgramDesc, TextureDesc, UniformBinding, UploadHint,
    VertexAttribute,
};
pub use context::Context;
pub use gpu::{WgpuBackend, WgpuBackendConfig};
pub use handle::{BufferId, ProgramId, TextureId, VertexArrayId};
pub use headless::{DrawRecord, HeadlessBackend};
