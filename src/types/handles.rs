//! Context-scoped resource handles.
//!
//! Every handle carries the id of the [`DeviceContext`](crate::DeviceContext)
//! that issued it and a non-zero resource id. Zero is never a valid id, so
//! "creation failed" is carried by `Result` instead of a sentinel handle.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_CONTEXT_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of one device context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(NonZeroU32);

impl ContextId {
    pub(crate) fn next() -> Self {
        let raw = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU32::new(raw).unwrap_or(NonZeroU32::MIN))
    }

    pub fn raw(self) -> u32 {
        self.0.get()
    }
}

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            pub(crate) context: ContextId,
            pub(crate) id: NonZeroU32,
        }

        impl $name {
            pub(crate) fn new(context: ContextId, id: NonZeroU32) -> Self {
                Self { context, id }
            }

            /// The non-zero integer id, unique within the issuing context.
            pub fn raw(self) -> u32 {
                self.id.get()
            }

            /// The context that issued this handle.
            pub fn context(self) -> ContextId {
                self.context
            }
        }
    };
}

define_handle!(
    /// A linked shader program.
    ShaderHandle
);
define_handle!(
    /// A static vertex buffer.
    BufferHandle
);
define_handle!(
    /// An RGBA8 texture, usable for sampling and as a render target.
    TextureHandle
);

/// Hands out non-zero ids, one sequence per context.
#[derive(Debug)]
pub(crate) struct IdAllocator {
    next: NonZeroU32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            next: NonZeroU32::MIN,
        }
    }
}

impl IdAllocator {
    pub fn allocate(&mut self) -> NonZeroU32 {
        let id = self.next;
        self.next = self.next.checked_add(1).unwrap_or(NonZeroU32::MIN);
        id
    }
}
