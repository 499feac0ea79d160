//! A keyed-event style parking facility.
//!
//! A thread parks on a key and another thread releases the same key; every
//! release matches exactly one park, regardless of which side reaches the
//! facility first. Keys are addresses of live wait blocks, so at most one
//! thread is ever parked on a given key.

#[cfg(feature = "loom")]
use loom::sync::{Condvar, Mutex};
#[cfg(not(feature = "loom"))]
use std::sync::{Condvar, Mutex};

/// Number of rendezvous buckets; keys are spread by address.
const BUCKETS: usize = 16;

/// The parking facility backing a single lock, installed on first use.
pub(crate) struct KeyedEvent {
    buckets: Box<[Bucket]>,
}

struct Bucket {
    /// Keys whose release arrived before their waiter finished parking.
    signaled: Mutex<Vec<usize>>,
    arrival: Condvar,
}

impl KeyedEvent {
    pub(crate) fn new() -> Self {
        Self {
            buckets: (0..BUCKETS)
                .map(|_| Bucket {
                    signaled: Mutex::new(Vec::new()),
                    arrival: Condvar::new(),
                })
                .collect(),
        }
    }

    fn bucket(&self, key: usize) -> &Bucket {
        // Wait blocks are cache-line aligned, so the low bits carry nothing.
        &self.buckets[(key >> 7) % BUCKETS]
    }

    /// Blocks the calling thread until a release for `key` is observed.
    ///
    /// A park that cannot reach its mutex is a protocol violation: the
    /// flags handoff guarantees a matching release is (or will be) in
    /// flight, and returning without consuming it would desynchronize the
    /// wait-block rendezvous.
    pub(crate) fn park(&self, key: usize) {
        let bucket = self.bucket(key);
        let Ok(mut signaled) = bucket.signaled.lock() else {
            unreachable!("the parking mutex cannot be poisoned");
        };
        loop {
            if let Some(index) = signaled.iter().position(|&signaled_key| signaled_key == key) {
                signaled.swap_remove(index);
                return;
            }
            let Ok(returned) = bucket.arrival.wait(signaled) else {
                unreachable!("the parking mutex cannot be poisoned");
            };
            signaled = returned;
        }
    }

    /// Wakes the thread parked on `key`.
    ///
    /// The wakeup is recorded first, so a waiter that has committed to
    /// parking but has not yet reached the condition variable still consumes
    /// it on arrival.
    pub(crate) fn release(&self, key: usize) {
        let bucket = self.bucket(key);
        let Ok(mut signaled) = bucket.signaled.lock() else {
            unreachable!("the parking mutex cannot be poisoned");
        };
        debug_assert!(!signaled.contains(&key));
        signaled.push(key);
        drop(signaled);
        bucket.arrival.notify_all();
    }
}
