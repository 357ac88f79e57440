use crate::element::Element;
use crate::header::HEADER_BYTES;
use thiserror::Error;

/// Error types for ring construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Capacity must be a power of two so indices wrap by masking.
    #[error("capacity {capacity} is not a power of two")]
    CapacityNotPowerOfTwo {
        /// The rejected capacity.
        capacity: usize,
    },
    /// Capacity must leave headroom in the 32-bit counter scheme.
    #[error("capacity {capacity} does not fit the 32-bit counters (max {max})")]
    CapacityTooLarge {
        /// The rejected capacity.
        capacity: usize,
        /// Largest accepted capacity.
        max: usize,
    },
    /// Frames must hold at least one element.
    #[error("frame length must be non-zero")]
    ZeroFrameLen,
    /// The ring must hold at least one slot.
    #[error("capacity must be non-zero")]
    ZeroCapacity,
    /// The slot area would overflow the address space.
    #[error("region size overflows: {capacity} slots of {frame_len} x {element_width}-byte elements")]
    RegionTooLarge {
        /// Configured capacity.
        capacity: usize,
        /// Configured frame length.
        frame_len: usize,
        /// Byte width of one element.
        element_width: usize,
    },
}

/// Configuration for a frame ring: elements per frame and slots in the ring.
///
/// Validated once at construction; a `Config` in hand is always internally
/// consistent. The element type is chosen separately, at region allocation
/// and view attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    frame_len: usize,
    capacity: usize,
}

impl Config {
    /// Occupancy arithmetic runs mod 2^32, so capacity must stay clear of
    /// the counter wrap distance.
    pub const MAX_CAPACITY: usize = 1 << 31;

    /// Creates a validated configuration.
    pub fn new(frame_len: usize, capacity: usize) -> Result<Self, ConfigError> {
        if frame_len == 0 {
            return Err(ConfigError::ZeroFrameLen);
        }
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !capacity.is_power_of_two() {
            return Err(ConfigError::CapacityNotPowerOfTwo { capacity });
        }
        if capacity > Self::MAX_CAPACITY {
            return Err(ConfigError::CapacityTooLarge {
                capacity,
                max: Self::MAX_CAPACITY,
            });
        }
        Ok(Self {
            frame_len,
            capacity,
        })
    }

    /// Elements per frame.
    #[inline]
    pub const fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Slots in the ring.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Index mask for wrapping (capacity is a power of two).
    #[inline]
    pub(crate) const fn mask(&self) -> u32 {
        (self.capacity - 1) as u32
    }

    /// Bytes occupied by one slot holding elements of type `E`.
    #[inline]
    pub fn slot_bytes<E: Element>(&self) -> usize {
        self.frame_len * std::mem::size_of::<E>()
    }

    /// Total region size: header plus `capacity` slots. `None` on overflow.
    pub(crate) fn region_bytes<E: Element>(&self) -> Option<usize> {
        self.frame_len
            .checked_mul(std::mem::size_of::<E>())?
            .checked_mul(self.capacity)?
            .checked_add(HEADER_BYTES)
    }
}
