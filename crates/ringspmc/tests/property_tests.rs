//! Property-based tests pitting the ring against a linear reference model.
//!
//! Single-threaded, so the eviction semantics are deterministic: a push
//! into a full ring always discards exactly the oldest unread frame. The
//! model is a VecDeque with the same policy.

use proptest::prelude::*;
use ringspmc_rs::{Config, Consumer, Producer, Region};
use std::collections::VecDeque;
use std::sync::Arc;

fn ring(frame_len: usize, capacity: usize) -> (Producer<u64>, Consumer<u64>) {
    let config = Config::new(frame_len, capacity).unwrap();
    let region = Arc::new(Region::allocate::<u64>(config).unwrap());
    let producer = Producer::attach(Arc::clone(&region), config).unwrap();
    let consumer = Consumer::attach(region, config).unwrap();
    (producer, consumer)
}

proptest! {
    /// Any interleaving of pushes and pops agrees with the linear model:
    /// same delivered frames, same occupancy, same drop count.
    #[test]
    fn interleavings_match_reference_model(
        capacity_bits in 0u32..5,
        ops in prop::collection::vec(prop::bool::ANY, 0..200),
    ) {
        let capacity = 1usize << capacity_bits;
        let (mut producer, mut consumer) = ring(2, capacity);

        let mut model: VecDeque<u64> = VecDeque::new();
        let mut dropped = 0u32;
        let mut seq = 0u64;

        for is_push in ops {
            if is_push {
                if model.len() == capacity {
                    model.pop_front();
                    dropped += 1;
                }
                model.push_back(seq);
                producer.push(&[seq, !seq]);
                seq += 1;
            } else {
                match consumer.pop() {
                    Some(frame) => {
                        let expected = model.pop_front()
                            .expect("ring delivered a frame the model does not hold");
                        prop_assert_eq!(frame[0], expected);
                        prop_assert_eq!(frame[1], !expected);
                        consumer.recycle(frame);
                    }
                    None => prop_assert!(model.is_empty(),
                        "ring empty but model holds {} frames", model.len()),
                }
            }

            prop_assert_eq!(consumer.count(), model.len());
            prop_assert!(consumer.count() <= capacity);
            prop_assert_eq!(consumer.dropped_count(), dropped);
        }
    }

    /// A drain after an unconsumed burst of n pushes yields exactly the
    /// newest min(n, capacity) frames in push order.
    #[test]
    fn burst_drain_yields_newest_suffix(
        capacity_bits in 0u32..5,
        n in 0u64..300,
    ) {
        let capacity = 1usize << capacity_bits;
        let (mut producer, mut consumer) = ring(1, capacity);

        for seq in 0..n {
            producer.push(&[seq]);
        }

        let mut drained = Vec::new();
        while let Some(frame) = consumer.pop() {
            drained.push(frame[0]);
            consumer.recycle(frame);
        }

        let kept = n.min(capacity as u64);
        let expected: Vec<u64> = (n - kept..n).collect();
        prop_assert_eq!(drained, expected);
        prop_assert_eq!(u64::from(consumer.dropped_count()), n - kept);
        prop_assert_eq!(consumer.has_wrapped(), n > capacity as u64);
    }
}
