//! Debug assertion macros for the ring's structural invariants.
//!
//! Active only in debug builds, so there is zero overhead on the hot paths
//! in release builds.

/// Assert that occupancy stays within `[0, capacity]`.
///
/// Occupancy is `in_count - out_count` under wraparound arithmetic; a
/// larger value means a counter update was lost or misordered.
macro_rules! debug_assert_occupancy_bounded {
    ($occupancy:expr, $capacity:expr) => {
        debug_assert!(
            ($occupancy as usize) <= $capacity,
            "occupancy {} exceeds capacity {}",
            $occupancy,
            $capacity
        )
    };
}

/// Assert that a slot index is inside the slot area.
macro_rules! debug_assert_slot_in_bounds {
    ($slot:expr, $capacity:expr) => {
        debug_assert!(
            ($slot as usize) < $capacity,
            "slot index {} out of bounds for capacity {}",
            $slot,
            $capacity
        )
    };
}

/// Assert the producer-side pointer identity `write_ptr == in_count & mask`.
///
/// Only the producer writes either field, so this holds exactly on the
/// push path (the consumer-side twin is transiently violated between a
/// claim and its `read_ptr` advance and is not asserted).
macro_rules! debug_assert_write_ptr_coherent {
    ($write_ptr:expr, $expected:expr) => {
        debug_assert!(
            $write_ptr == $expected,
            "write_ptr {} diverged from masked in_count {}",
            $write_ptr,
            $expected
        )
    };
}

pub(crate) use debug_assert_occupancy_bounded;
pub(crate) use debug_assert_slot_in_bounds;
pub(crate) use debug_assert_write_ptr_coherent;
