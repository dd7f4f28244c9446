use std::cell::Cell;

macro_rules! device_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub struct $name(u32);

        impl $name {
            /// Raw identifier. Zero is never issued.
            #[inline]
            pub fn raw(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            #[inline]
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }
    };
}

device_handle!(
    /// Device buffer (vertex, index or uniform storage).
    BufferId
);
device_handle!(
    /// Vertex-attribute layout bound to a set of buffers.
    VertexArrayId
);
device_handle!(
    /// Linked shader program.
    ProgramId
);
device_handle!(
    /// Device-resident image.
    TextureId
);

/// Issues monotonically increasing, non-zero handle identifiers.
///
/// Identifiers are never reused, so a stale handle can never alias a newer
/// resource.
#[derive(Debug)]
pub(crate) struct HandleCounter {
    next: Cell<u32>,
}

impl Default for HandleCounter {
    fn default() -> Self {
        Self { next: Cell::new(1) }
    }
}

impl HandleCounter {
    pub(crate) fn issue<H: From<u32>>(&self) -> H {
        let id = self.next.get();
        self.next.set(id.wrapping_add(1).max(1));
        H::from(id)
    }
}
