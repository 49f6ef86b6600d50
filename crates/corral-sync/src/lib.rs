//! # corral-sync
//!
//! Task-safe primitives shared by the corral connection pools.
//!
//! Two building blocks live here:
//!
//! - [`AtomicCounter`]: a linearizable integer cell used for capacity
//!   accounting. All operations are sequentially consistent, so no caller
//!   ever observes a value that was not a real intermediate state.
//! - [`BoundedChannel`]: a fixed-capacity MPMC queue with cooperative
//!   blocking-with-timeout push/pop. It is the rendezvous point between
//!   idle connections and waiting acquirers.
//!
//! Both types are cheap to share behind an `Arc` and are safe to call from
//! any number of tasks across any number of runtime worker threads.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod channel;
pub mod counter;

pub use channel::BoundedChannel;
pub use counter::AtomicCounter;
