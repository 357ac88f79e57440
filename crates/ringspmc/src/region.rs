use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::fmt;
use std::ptr::NonNull;

use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::element::Element;
use crate::header::{RingHeader, HEADER_BYTES};

/// Region alignment. The header only needs 4; a cache-line base keeps the
/// first slots from straddling the header's line.
const REGION_ALIGN: usize = 64;

/// Error types for attaching a view over an existing region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AttachError {
    /// The region was allocated for a different configuration or element
    /// type than the one being attached.
    #[error("region is {actual} bytes, the configured layout needs {expected}")]
    SizeMismatch {
        /// Bytes the configuration requires.
        expected: usize,
        /// Bytes the region actually holds.
        actual: usize,
    },
}

/// One contiguous pre-allocated block shared by every view.
///
/// Holds the 24-byte counter header followed by `capacity` fixed-width
/// slots, zero-initialized (all-zero is the valid empty state for the
/// header and a valid value for every [`Element`]). The region is the only
/// shared mutable resource in the system; it is created once, handed to
/// threads behind an `Arc`, and freed only when the last view drops it.
pub struct Region {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl Region {
    /// Allocates a zeroed region sized for `config` with elements of type
    /// `E`.
    ///
    /// Domain errors (a slot area overflowing the address space) are
    /// reported; allocator exhaustion is surfaced through
    /// [`handle_alloc_error`] like any other failed allocation.
    pub fn allocate<E: Element>(config: Config) -> Result<Self, ConfigError> {
        let bytes = config
            .region_bytes::<E>()
            .ok_or(ConfigError::RegionTooLarge {
                capacity: config.capacity(),
                frame_len: config.frame_len(),
                element_width: std::mem::size_of::<E>(),
            })?;
        let layout =
            Layout::from_size_align(bytes, REGION_ALIGN).map_err(|_| ConfigError::RegionTooLarge {
                capacity: config.capacity(),
                frame_len: config.frame_len(),
                element_width: std::mem::size_of::<E>(),
            })?;

        // SAFETY: layout has non-zero size (the header alone is 24 bytes).
        let raw = unsafe { alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            handle_alloc_error(layout)
        };
        Ok(Self { ptr, layout })
    }

    /// Total size in bytes: header plus slot area.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.layout.size()
    }

    /// Base address, for callers exporting the region to another mapping.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub(crate) fn header(&self) -> &RingHeader {
        // SAFETY: offset 0 holds a RingHeader: the allocation is at least
        // HEADER_BYTES long, 64-byte aligned, and zero-initialized, and
        // AtomicU32 is valid for any bit pattern.
        unsafe { &*self.ptr.as_ptr().cast::<RingHeader>() }
    }

    /// First byte of the slot area.
    #[inline]
    pub(crate) fn slot_base(&self) -> *mut u8 {
        // SAFETY: in bounds; every region is at least HEADER_BYTES long.
        unsafe { self.ptr.as_ptr().add(HEADER_BYTES) }
    }
}

// SAFETY: all shared mutation inside the region goes through the header's
// atomics; slot bytes are coordinated by the counter protocol (a slot is
// written only between its claim and its publish).
unsafe impl Send for Region {}
unsafe impl Sync for Region {}

impl Drop for Region {
    fn drop(&mut self) {
        // SAFETY: ptr/layout are exactly what alloc_zeroed returned.
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("byte_len", &self.byte_len())
            .finish()
    }
}
