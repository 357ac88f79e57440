use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr;
use std::sync::Arc;

use crossbeam_utils::Backoff;

use crate::config::Config;
use crate::element::Element;
use crate::header::RingHeader;
use crate::invariants::{
    debug_assert_occupancy_bounded, debug_assert_slot_in_bounds, debug_assert_write_ptr_coherent,
};
use crate::region::{AttachError, Region};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// One producer, any number of consumers, coordinating through the six
// header atomics. Counters run mod 2^32; slot indices are `count & mask`.
//
// ## Slot ownership
//
// A slot is owned by whoever holds the counter value that maps to it:
// - The producer owns the write slot `in_count & mask` from the moment it
//   reads `in_count` (it is the only writer of `in_count`) until the
//   Release store that publishes the incremented count.
// - A consumer owns the read slot `claimed & mask` by winning the CAS on
//   `out_count` for the value `claimed`. CAS winners of distinct values
//   hold distinct sequence positions, so no two pops ever return the same
//   logical frame.
// - The producer's eviction path competes in the same CAS, so a racing
//   consumer claim and an eviction cannot both take one sequence position,
//   and a frame is accounted as delivered or dropped, never both.
//
// ## Ordering protocol
//
// **Producer (push):**
// 1. Load `in_count` Relaxed (single writer), `out_count` Acquire
// 2. If full: one strong CAS on `out_count` (AcqRel); on success bump
//    `dropped_count`, advance `read_ptr`, latch `wrap_flag` (all Relaxed —
//    statistics and derived bookkeeping)
// 3. Copy the frame into the write slot (plain bytes, no ordering needed:
//    protected by the protocol)
// 4. Store `write_ptr` Relaxed, then `in_count` Release (the publish; the
//    copy in step 3 happens-before any Acquire load that observes it)
//
// **Consumer (pop):**
// 1. Load `in_count` Acquire (synchronizes with the producer's publish),
//    `out_count` Acquire
// 2. Empty if equal; otherwise CAS `out_count` (AcqRel), retry on loss
// 3. Advance `read_ptr` (Relaxed RMW, bookkeeping), copy the claimed slot
//    out into an owned frame
//
// ## The aliasing window
//
// A claim grants logical ownership, but the physical slot is reused: once
// the producer laps the ring, it overwrites slots whose sequence positions
// were claimed `capacity` pushes ago. `pop` copies out immediately after
// claiming, which bounds the exposure to the copy itself; a producer that
// laps the entire ring within that window can still tear the copy. That
// needs `capacity` full pushes to happen between two adjacent instructions
// of a consumer, so sizing the ring for the expected rate mismatch makes
// the window practically unreachable. No reference into the region ever
// escapes this module.
//
// =============================================================================

/// A typed view over a shared [`Region`].
///
/// Views are cheap: a handle on the region plus the validated
/// configuration. All mutable state lives in the region, so any number of
/// views may be attached to it, one per thread. A bare `RingView` only
/// observes; pushing and popping go through the [`Producer`] and
/// [`Consumer`] handles.
pub struct RingView<E: Element> {
    region: Arc<Region>,
    config: Config,
    _elem: PhantomData<E>,
}

impl<E: Element> RingView<E> {
    /// Binds a view over an existing region.
    ///
    /// Fails if the region's size does not match the layout implied by
    /// `config` and `E` — the one cheap check that catches attaching with
    /// the wrong configuration or element type.
    pub fn attach(region: Arc<Region>, config: Config) -> Result<Self, AttachError> {
        let expected = config.region_bytes::<E>().unwrap_or(usize::MAX);
        if region.byte_len() != expected {
            return Err(AttachError::SizeMismatch {
                expected,
                actual: region.byte_len(),
            });
        }
        Ok(Self {
            region,
            config,
            _elem: PhantomData,
        })
    }

    /// The configuration this view was attached with.
    #[inline]
    pub fn config(&self) -> Config {
        self.config
    }

    /// Elements per frame.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.config.frame_len()
    }

    /// Slots in the ring.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.capacity()
    }

    /// The shared region backing this view.
    #[inline]
    pub fn region(&self) -> &Arc<Region> {
        &self.region
    }

    /// Frames currently unread.
    ///
    /// A snapshot: under concurrent pushes and pops the value is already
    /// stale when returned. Each counter read is itself atomic.
    #[inline]
    pub fn count(&self) -> usize {
        let hdr = self.header();
        // out before in: out_count never passes in_count, so this order
        // keeps the wrapping difference non-negative.
        let oc = hdr.out_count_relaxed();
        let ic = hdr.in_count_relaxed();
        ic.wrapping_sub(oc) as usize
    }

    /// True if no unread frames are buffered (snapshot, like [`count`]).
    ///
    /// [`count`]: RingView::count
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Total frames evicted by overwrite since allocation.
    #[inline]
    pub fn dropped_count(&self) -> u32 {
        self.header().dropped()
    }

    /// True once the ring has overwritten at least one unread frame;
    /// latches permanently.
    #[inline]
    pub fn has_wrapped(&self) -> bool {
        self.header().wrap_flag()
    }

    /// The header's `write_ptr` field, for diagnostics and external
    /// observers of the region layout. Always `in_count & mask`.
    #[inline]
    pub fn write_ptr(&self) -> u32 {
        self.header().write_ptr()
    }

    /// The header's `read_ptr` field, for diagnostics and external
    /// observers of the region layout. Tracks `out_count & mask`;
    /// momentarily behind while a claim's bookkeeping is in flight.
    #[inline]
    pub fn read_ptr(&self) -> u32 {
        self.header().read_ptr()
    }

    #[inline]
    pub(crate) fn header(&self) -> &RingHeader {
        self.region.header()
    }

    /// Base address of slot `slot`.
    #[inline]
    fn slot_ptr(&self, slot: u32) -> *mut E {
        debug_assert_slot_in_bounds!(slot, self.config.capacity());
        // SAFETY: slot < capacity, so the offset stays inside the slot
        // area whose size was validated at attach; the base is aligned for
        // every Element width (header is 24 bytes, region base 64-aligned).
        unsafe {
            self.region
                .slot_base()
                .cast::<E>()
                .add(slot as usize * self.config.frame_len())
        }
    }
}

impl<E: Element> Clone for RingView<E> {
    fn clone(&self) -> Self {
        Self {
            region: Arc::clone(&self.region),
            config: self.config,
            _elem: PhantomData,
        }
    }
}

/// Producer handle: the single writer of a ring.
///
/// Exactly one thread may push into a given region at a time; the write
/// path has no claim CAS of its own, that is what keeps it wait-free.
pub struct Producer<E: Element> {
    view: RingView<E>,
}

impl<E: Element> Producer<E> {
    /// Attaches the producer view over a region.
    ///
    /// Nothing in the region records that a producer exists, so attaching
    /// two producers is not detected at runtime; the handle being
    /// `!Clone` and `push` taking `&mut self` make single-writer misuse a
    /// compile-time error within one process.
    pub fn attach(region: Arc<Region>, config: Config) -> Result<Self, AttachError> {
        Ok(Self {
            view: RingView::attach(region, config)?,
        })
    }

    /// Pushes one frame, evicting the oldest unread frame if the ring is
    /// full. Never blocks and never fails: eviction is a counted side
    /// effect, not an error.
    ///
    /// # Panics
    ///
    /// If `frame` does not hold exactly `frame_len` elements.
    pub fn push(&mut self, frame: &[E]) -> bool {
        let frame_len = self.view.config.frame_len();
        assert_eq!(
            frame.len(),
            frame_len,
            "frame has {} elements, ring is configured for {}",
            frame.len(),
            frame_len
        );

        let capacity = self.view.config.capacity() as u32;
        let mask = self.view.config.mask();
        let hdr = self.view.header();

        let ic = hdr.in_count_relaxed();
        let oc = hdr.out_count();
        debug_assert_occupancy_bounded!(ic.wrapping_sub(oc), self.view.config.capacity());

        if ic.wrapping_sub(oc) >= capacity {
            // Full: evict the single oldest unread frame. The CAS keeps a
            // racing consumer claim from being accounted as both delivered
            // and dropped; on failure the consumer just freed the slot and
            // no eviction is needed.
            if hdr.claim_out(oc).is_ok() {
                hdr.add_dropped();
                hdr.advance_read_ptr(mask);
                hdr.latch_wrap();
            }
        }

        let slot = ic & mask;
        debug_assert_write_ptr_coherent!(hdr.write_ptr(), slot);
        // SAFETY: this producer exclusively owns the write slot until the
        // publish below; source and destination are distinct allocations
        // of frame_len elements.
        unsafe {
            ptr::copy_nonoverlapping(frame.as_ptr(), self.view.slot_ptr(slot), frame_len);
        }
        hdr.store_write_ptr(slot.wrapping_add(1) & mask);
        hdr.publish_in(ic.wrapping_add(1));
        true
    }

    /// See [`RingView::count`].
    #[inline]
    pub fn count(&self) -> usize {
        self.view.count()
    }

    /// See [`RingView::dropped_count`].
    #[inline]
    pub fn dropped_count(&self) -> u32 {
        self.view.dropped_count()
    }

    /// See [`RingView::has_wrapped`].
    #[inline]
    pub fn has_wrapped(&self) -> bool {
        self.view.has_wrapped()
    }

    /// The underlying view.
    #[inline]
    pub fn view(&self) -> &RingView<E> {
        &self.view
    }
}

// Note: Producer intentionally does NOT implement Clone. A second handle
// would allow two threads onto the unprotected write path.

/// One frame copied out of the ring.
///
/// Owned storage, independent of the shared region; hand it back to the
/// consumer it came from via [`Consumer::recycle`] to avoid allocation
/// churn in steady state.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<E: Element> {
    data: Box<[E]>,
}

impl<E: Element> Frame<E> {
    /// The frame's elements.
    #[inline]
    pub fn as_slice(&self) -> &[E] {
        &self.data
    }

    /// Takes the storage out of the frame.
    #[inline]
    pub fn into_boxed_slice(self) -> Box<[E]> {
        self.data
    }
}

impl<E: Element> Deref for Frame<E> {
    type Target = [E];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<E: Element> AsRef<[E]> for Frame<E> {
    fn as_ref(&self) -> &[E] {
        &self.data
    }
}

/// Consumer handle: claims and copies out frames.
///
/// Any number of consumers may be attached to one region; claims are
/// arbitrated by the CAS on `out_count`, so each frame is delivered to at
/// most one of them. Each consumer carries a private arena of spare frame
/// buffers, refilled through [`recycle`].
///
/// [`recycle`]: Consumer::recycle
pub struct Consumer<E: Element> {
    view: RingView<E>,
    spares: Vec<Box<[E]>>,
}

impl<E: Element> Consumer<E> {
    /// Attaches a consumer view over a region.
    pub fn attach(region: Arc<Region>, config: Config) -> Result<Self, AttachError> {
        Ok(Self {
            view: RingView::attach(region, config)?,
            spares: Vec::new(),
        })
    }

    /// Pops the oldest unread frame, or `None` if the ring is empty.
    ///
    /// The returned [`Frame`] is an owned copy, never a live alias into
    /// the region. The copy is made immediately after the claim; if the
    /// producer laps the entire ring inside that window the copy can mix
    /// two writes (see the module protocol notes) — size the capacity for
    /// the expected rate mismatch.
    pub fn pop(&mut self) -> Option<Frame<E>> {
        let claimed = self.claim()?;
        let mut data = self.take_spare();
        self.copy_out(claimed, &mut data);
        Some(Frame { data })
    }

    /// Copy variant of [`pop`] for callers bringing their own buffer.
    ///
    /// Returns `false` (leaving `out` untouched) if the ring is empty.
    ///
    /// # Panics
    ///
    /// If `out` does not hold exactly `frame_len` elements.
    ///
    /// [`pop`]: Consumer::pop
    pub fn pop_into(&mut self, out: &mut [E]) -> bool {
        let frame_len = self.view.config.frame_len();
        assert_eq!(
            out.len(),
            frame_len,
            "output buffer has {} elements, ring is configured for {}",
            out.len(),
            frame_len
        );
        match self.claim() {
            Some(claimed) => {
                self.copy_out(claimed, out);
                true
            }
            None => false,
        }
    }

    /// Like [`pop`], but waits out short empty gaps with a bounded
    /// spin-then-yield backoff before giving up.
    ///
    /// This is a busy-wait policy, not a lock: the wait is bounded (a few
    /// microseconds of spinning, then a handful of scheduler yields) and
    /// returns `None` once patience is exhausted. Callers that need
    /// longer waits poll in their own loop, where cancellation flags can
    /// be checked between calls.
    ///
    /// [`pop`]: Consumer::pop
    pub fn pop_with_backoff(&mut self) -> Option<Frame<E>> {
        let backoff = Backoff::new();
        loop {
            if let Some(frame) = self.pop() {
                return Some(frame);
            }
            if backoff.is_completed() {
                return None;
            }
            backoff.snooze();
        }
    }

    /// Returns a frame's storage to this consumer's arena so the next
    /// [`pop`] reuses it instead of allocating.
    ///
    /// Frames from a ring with a different frame length are dropped.
    ///
    /// [`pop`]: Consumer::pop
    pub fn recycle(&mut self, frame: Frame<E>) {
        if frame.data.len() == self.view.config.frame_len() {
            self.spares.push(frame.data);
        }
    }

    /// See [`RingView::count`].
    #[inline]
    pub fn count(&self) -> usize {
        self.view.count()
    }

    /// See [`RingView::dropped_count`].
    #[inline]
    pub fn dropped_count(&self) -> u32 {
        self.view.dropped_count()
    }

    /// See [`RingView::has_wrapped`].
    #[inline]
    pub fn has_wrapped(&self) -> bool {
        self.view.has_wrapped()
    }

    /// The underlying view.
    #[inline]
    pub fn view(&self) -> &RingView<E> {
        &self.view
    }

    /// Claims the next unread sequence position, or `None` when empty.
    ///
    /// Retry loop: a lost CAS means another consumer claimed first, or
    /// the producer's eviction path advanced `out_count` underneath us;
    /// either way the observed state is stale and we start over.
    fn claim(&self) -> Option<u32> {
        let hdr = self.view.header();
        let mask = self.view.config.mask();
        loop {
            // out before in. out_count never passes in_count, so a later
            // in_count load is >= the earlier out_count load; if the CAS
            // below then wins on that out_count value, the position it
            // claims was published. The reverse order would let a stale
            // in_count pair with a fresher out_count and claim past the
            // publish point.
            let oc = hdr.out_count();
            let ic = hdr.in_count();
            if ic == oc {
                return None;
            }
            if hdr.claim_out(oc).is_ok() {
                hdr.advance_read_ptr(mask);
                return Some(oc);
            }
        }
    }

    fn copy_out(&self, claimed: u32, dest: &mut [E]) {
        let slot = claimed & self.view.config.mask();
        // SAFETY: the claim grants exclusive logical ownership of this
        // slot; dest is a distinct owned allocation of frame_len elements.
        unsafe {
            ptr::copy_nonoverlapping(
                self.view.slot_ptr(slot).cast_const(),
                dest.as_mut_ptr(),
                self.view.config.frame_len(),
            );
        }
    }

    fn take_spare(&mut self) -> Box<[E]> {
        self.spares.pop().unwrap_or_else(|| {
            vec![E::default(); self.view.config.frame_len()].into_boxed_slice()
        })
    }
}
