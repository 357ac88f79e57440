//! Audio-shaped demo: a producer generating 128-sample f32 blocks at full
//! speed against a consumer that occasionally stalls, the classic
//! rate-mismatch this ring is built for. Run with:
//!
//! ```sh
//! cargo run --release --example audio_blocks
//! ```

use ringspmc_rs::{Config, Consumer, Producer, Region, RingView};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const BLOCK_LEN: usize = 128;
const BLOCKS: u32 = 20_000;

fn main() {
    let config = Config::new(BLOCK_LEN, 32).unwrap();
    let region = Arc::new(Region::allocate::<f32>(config).unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let producer_region = Arc::clone(&region);
    let producer_done = Arc::clone(&done);
    let producer_handle = thread::spawn(move || {
        let mut producer = Producer::<f32>::attach(producer_region, config).unwrap();
        let mut block = [0.0f32; BLOCK_LEN];
        for seq in 0..BLOCKS {
            // A cheap ramp so every block is distinguishable.
            let base = seq as f32;
            for (i, sample) in block.iter_mut().enumerate() {
                *sample = base + i as f32 / BLOCK_LEN as f32;
            }
            producer.push(&block);
        }
        producer_done.store(true, Ordering::Release);
    });

    let consumer_region = Arc::clone(&region);
    let consumer_handle = thread::spawn(move || {
        let mut consumer = Consumer::<f32>::attach(consumer_region, config).unwrap();
        let mut delivered = 0u64;
        let mut peak = 0.0f32;
        loop {
            match consumer.pop_with_backoff() {
                Some(frame) => {
                    peak = peak.max(frame[BLOCK_LEN - 1]);
                    delivered += 1;
                    consumer.recycle(frame);
                    // Simulate a consumer that can't always keep up.
                    if delivered % 500 == 0 {
                        thread::sleep(Duration::from_micros(200));
                    }
                }
                None => {
                    if done.load(Ordering::Acquire) && consumer.count() == 0 {
                        break;
                    }
                }
            }
        }
        (delivered, peak)
    });

    producer_handle.join().unwrap();
    let (delivered, peak) = consumer_handle.join().unwrap();

    let view = RingView::<f32>::attach(region, config).unwrap();
    println!("blocks produced:  {BLOCKS}");
    println!("blocks delivered: {delivered}");
    println!("blocks dropped:   {}", view.dropped_count());
    println!("ring wrapped:     {}", view.has_wrapped());
    println!("peak sample:      {peak:.3}");
    assert_eq!(delivered + u64::from(view.dropped_count()), u64::from(BLOCKS));
}
