use std::fmt;
use std::rc::Rc;

use super::{Backend, HeadlessBackend};

/// Capability token for the current device.
///
/// Every resource is created against a `Context` and keeps a clone of it so it
/// can release its handles on drop. Cloning is cheap; all clones refer to the
/// same backend.
///
/// `Context` is `!Send`: resources are bound to the thread that owns the device.
#[derive(Clone)]
pub struct Context {
    backend: Rc<dyn Backend>,
}

impl Context {
    pub fn new<B>(backend: B) -> Self
    where
        B: Backend + 'static,
    {
        Self {
            backend: Rc::new(backend),
        }
    }

    /// Builds a context over an already shared backend.
    ///
    /// Useful when the caller keeps its own handle to the concrete backend
    /// (e.g. to bind frame targets or inspect a [`HeadlessBackend`]).
    pub fn from_shared(backend: Rc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Context over a fresh [`HeadlessBackend`].
    pub fn headless() -> Self {
        Self::new(HeadlessBackend::new())
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    #[inline]
    pub(crate) fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("backend", &self.backend.name())
            .finish()
    }
}
