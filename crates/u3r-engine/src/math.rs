//! Value types shared across the public API.

use std::cell::RefCell;
use std::rc::Rc;

pub type Vector3 = glam::Vec3;
pub type Vector4 = glam::Vec4;
pub type Transform = glam::Mat4;

/// Linear RGBA color.
pub type Color = glam::Vec4;

pub type Number = f32;

/// CPU-side numeric storage for vertex attributes and uniform values.
///
/// Insertion order is the layout order consumed by the device.
pub type Array = Vec<Number>;

/// Shared, single-threaded handle to a resource that several holders read.
///
/// The latest state is always observed by every holder.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps `value` in a [`Shared`] handle.
#[inline]
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}
