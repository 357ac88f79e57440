/// Marker for plain fixed-width numeric types that can live in a shared region.
///
/// Frames are homogeneous arrays of one element type; the slot area of a
/// region is raw zero-initialized bytes that get reused across pushes, so
/// element types must tolerate byte-wise copies.
///
/// # Safety
///
/// Implementors must be plain-old-data:
/// - no padding bytes and no pointers/references,
/// - every bit pattern is a valid value (the all-zeroes pattern in
///   particular, since freshly allocated regions are zeroed),
/// - no drop glue.
pub unsafe trait Element: Copy + Default + Send + Sync + 'static {}

unsafe impl Element for u8 {}
unsafe impl Element for i8 {}
unsafe impl Element for u16 {}
unsafe impl Element for i16 {}
unsafe impl Element for u32 {}
unsafe impl Element for i32 {}
unsafe impl Element for u64 {}
unsafe impl Element for i64 {}
unsafe impl Element for f32 {}
unsafe impl Element for f64 {}
