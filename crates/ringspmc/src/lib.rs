//! RingSPMC - Lock-Free Single-Producer Multi-Consumer frame ring
//!
//! A fixed-capacity circular buffer over one pre-allocated shared memory
//! region, moving fixed-size frames (homogeneous numeric arrays, e.g.
//! audio blocks) from one producer thread to any number of consumer
//! threads without per-operation allocation or locking. When consumers
//! fall behind, the producer overwrites the oldest unread frame instead of
//! blocking, and counts the drop.
//!
//! # Key Features
//!
//! - 24-byte atomic counter header + fixed-width slots, bit-compatible
//!   across every view attached to the same region
//! - Overwrite-oldest eviction with exact drop accounting, even when an
//!   eviction races a consumer's claim
//! - CAS-claimed pops: each frame is delivered to at most one consumer
//! - Copy-out frames recycled through a per-consumer arena (no allocation
//!   in steady state, no live aliases into shared memory)
//! - Bounded spin-then-yield wait for consumers riding an empty ring
//!
//! # Example
//!
//! ```
//! use ringspmc_rs::{Config, Consumer, Producer, Region};
//! use std::sync::Arc;
//!
//! let config = Config::new(4, 8).unwrap();
//! let region = Arc::new(Region::allocate::<f32>(config).unwrap());
//!
//! // The region, not the view, is what gets shared between threads;
//! // each thread attaches its own handle.
//! let mut producer = Producer::<f32>::attach(Arc::clone(&region), config).unwrap();
//! let mut consumer = Consumer::<f32>::attach(Arc::clone(&region), config).unwrap();
//!
//! producer.push(&[1.0, 2.0, 3.0, 4.0]);
//!
//! let frame = consumer.pop().unwrap();
//! assert_eq!(&frame[..], &[1.0, 2.0, 3.0, 4.0]);
//! consumer.recycle(frame);
//! ```

mod config;
mod element;
mod header;
mod invariants;
mod region;
mod ring;

pub use config::{Config, ConfigError};
pub use element::Element;
pub use header::HEADER_BYTES;
pub use region::{AttachError, Region};
pub use ring::{Consumer, Frame, Producer, RingView};
