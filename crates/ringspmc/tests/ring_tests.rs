use ringspmc_rs::{Config, Consumer, Producer, Region, RingView};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn fifo_ordering_without_eviction() {
    let config = Config::new(2, 1024).unwrap();
    let region = Arc::new(Region::allocate::<u32>(config).unwrap());
    let mut producer = Producer::<u32>::attach(Arc::clone(&region), config).unwrap();
    let mut consumer = Consumer::<u32>::attach(region, config).unwrap();

    const N: u32 = 1000;
    for i in 0..N {
        producer.push(&[i, i.wrapping_mul(31)]);
    }

    for expected in 0..N {
        let frame = consumer.pop().unwrap();
        assert_eq!(
            frame[0], expected,
            "FIFO violation: expected {}, got {}",
            expected, frame[0]
        );
        assert_eq!(frame[1], expected.wrapping_mul(31));
        consumer.recycle(frame);
    }
    assert!(consumer.pop().is_none());
    assert_eq!(consumer.dropped_count(), 0);
}

#[test]
fn burst_drain_keeps_newest() {
    const CAPACITY: usize = 64;
    const N: u32 = 1000;

    let config = Config::new(1, CAPACITY).unwrap();
    let region = Arc::new(Region::allocate::<u32>(config).unwrap());
    let mut producer = Producer::<u32>::attach(Arc::clone(&region), config).unwrap();
    let mut consumer = Consumer::<u32>::attach(region, config).unwrap();

    for i in 0..N {
        producer.push(&[i]);
    }

    // A drain after an unconsumed burst yields exactly the newest
    // CAPACITY frames, in order.
    let mut drained = Vec::new();
    while let Some(frame) = consumer.pop() {
        drained.push(frame[0]);
    }
    let expected: Vec<u32> = (N - CAPACITY as u32..N).collect();
    assert_eq!(drained, expected);
    assert_eq!(consumer.dropped_count(), N - CAPACITY as u32);
    assert!(consumer.has_wrapped());
}

#[test]
fn concurrent_claims_are_distinct_and_frames_consistent() {
    const N_CONSUMERS: usize = 3;
    const TOTAL: u32 = 50_000;
    const FRAME_LEN: usize = 4;

    // Capacity exceeds the total frame count, so no slot is ever written
    // twice: content checks are exact while the consumers still contend
    // on every claim.
    let config = Config::new(FRAME_LEN, 65_536).unwrap();
    let region = Arc::new(Region::allocate::<u32>(config).unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let producer_region = Arc::clone(&region);
    let producer_handle = thread::spawn(move || {
        let mut producer = Producer::<u32>::attach(producer_region, config).unwrap();
        for seq in 0..TOTAL {
            producer.push(&[seq; FRAME_LEN]);
        }
    });

    let mut consumer_handles = vec![];
    for _ in 0..N_CONSUMERS {
        let region = Arc::clone(&region);
        let done = Arc::clone(&done);
        consumer_handles.push(thread::spawn(move || {
            let mut consumer = Consumer::<u32>::attach(region, config).unwrap();
            let mut seen = Vec::new();
            loop {
                if let Some(frame) = consumer.pop() {
                    let seq = frame[0];
                    assert!(
                        frame.iter().all(|&e| e == seq),
                        "torn frame: {:?}",
                        &frame[..]
                    );
                    seen.push(seq);
                    consumer.recycle(frame);
                } else if done.load(Ordering::Acquire) && consumer.count() == 0 {
                    break;
                } else {
                    thread::yield_now();
                }
            }
            seen
        }));
    }

    producer_handle.join().unwrap();
    done.store(true, Ordering::Release);

    let mut all: Vec<u32> = Vec::new();
    for handle in consumer_handles {
        all.extend(handle.join().unwrap());
    }

    let distinct: HashSet<u32> = all.iter().copied().collect();
    assert_eq!(
        distinct.len(),
        all.len(),
        "two consumers claimed the same logical frame"
    );
    assert_eq!(all.len(), TOTAL as usize, "frames lost without eviction");
    all.sort_unstable();
    assert!(all.iter().copied().eq(0..TOTAL), "delivered set has gaps");

    let view = RingView::<u32>::attach(region, config).unwrap();
    assert_eq!(view.dropped_count(), 0);
    assert!(!view.has_wrapped());
}

#[test]
fn conservation_with_eviction() {
    const N_CONSUMERS: usize = 2;
    const TOTAL: u32 = 200_000;

    let config = Config::new(2, 32).unwrap();
    let region = Arc::new(Region::allocate::<u32>(config).unwrap());
    let done = Arc::new(AtomicBool::new(false));

    // Free-running producer: consumers will fall behind and the ring will
    // evict. Delivered plus dropped must still account for every push.
    let producer_region = Arc::clone(&region);
    let producer_handle = thread::spawn(move || {
        let mut producer = Producer::<u32>::attach(producer_region, config).unwrap();
        for seq in 0..TOTAL {
            producer.push(&[seq, seq]);
        }
    });

    let mut consumer_handles = vec![];
    for _ in 0..N_CONSUMERS {
        let region = Arc::clone(&region);
        let done = Arc::clone(&done);
        consumer_handles.push(thread::spawn(move || {
            let mut consumer = Consumer::<u32>::attach(region, config).unwrap();
            let mut delivered = 0u64;
            loop {
                if let Some(frame) = consumer.pop() {
                    delivered += 1;
                    consumer.recycle(frame);
                } else if done.load(Ordering::Acquire) && consumer.count() == 0 {
                    break;
                } else {
                    thread::yield_now();
                }
            }
            delivered
        }));
    }

    producer_handle.join().unwrap();
    done.store(true, Ordering::Release);

    let delivered: u64 = consumer_handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .sum();

    let view = RingView::<u32>::attach(region, config).unwrap();
    assert_eq!(
        delivered + u64::from(view.dropped_count()),
        u64::from(TOTAL),
        "delivered + dropped must equal pushed"
    );
    assert_eq!(view.count(), 0);
    assert!(view.has_wrapped());
}

#[test]
fn jittery_consumer_accounts_for_every_frame() {
    const TOTAL: u32 = 50_000;

    let config = Config::new(4, 16).unwrap();
    let region = Arc::new(Region::allocate::<i16>(config).unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let producer_region = Arc::clone(&region);
    let producer_handle = thread::spawn(move || {
        let mut producer = Producer::<i16>::attach(producer_region, config).unwrap();
        let block = [7i16; 4];
        for _ in 0..TOTAL {
            producer.push(&block);
        }
    });

    let consumer_region = Arc::clone(&region);
    let consumer_done = Arc::clone(&done);
    let consumer_handle = thread::spawn(move || {
        let mut consumer = Consumer::<i16>::attach(consumer_region, config).unwrap();
        let mut delivered = 0u64;
        let mut ticks = 0u64;
        loop {
            match consumer.pop_with_backoff() {
                Some(frame) => {
                    delivered += 1;
                    consumer.recycle(frame);
                }
                None => {
                    if consumer_done.load(Ordering::Acquire) && consumer.count() == 0 {
                        break;
                    }
                }
            }
            // Stall periodically so the producer laps us.
            ticks += 1;
            if ticks % 1024 == 0 {
                thread::yield_now();
            }
        }
        delivered
    });

    producer_handle.join().unwrap();
    done.store(true, Ordering::Release);
    let delivered = consumer_handle.join().unwrap();

    let view = RingView::<i16>::attach(region, config).unwrap();
    assert_eq!(delivered + u64::from(view.dropped_count()), u64::from(TOTAL));
}
