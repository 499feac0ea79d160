//! Spin-wait tuning shared by the fast-path retry loop and the wait-block
//! rendezvous.

/// Number of state observations a contender makes before enqueueing, and a
/// freshly enqueued waiter makes before parking.
#[cfg(not(feature = "loom"))]
const DEFAULT_SPIN_LIMIT: usize = 4096;

/// How often the backoff yields the CPU instead of issuing a spin hint.
#[cfg(not(feature = "loom"))]
const YIELD_INTERVAL: usize = 64;

/// Returns the spin budget recommended for this host.
///
/// Zero on single-processor hosts: with nobody running concurrently there is
/// nothing to spin for.
#[cfg(not(feature = "loom"))]
pub(crate) fn recommended_spin_limit() -> usize {
    if std::thread::available_parallelism().map_or(1, usize::from) > 1 {
        DEFAULT_SPIN_LIMIT
    } else {
        0
    }
}

/// Spinning is pointless under the model checker; contenders go straight to
/// the wait queue.
#[cfg(feature = "loom")]
pub(crate) fn recommended_spin_limit() -> usize {
    0
}

/// Busy-wait backoff: a CPU spin hint with a periodic yield.
#[cfg(not(feature = "loom"))]
pub(crate) fn backoff(step: usize) {
    if step % YIELD_INTERVAL == 0 {
        std::thread::yield_now();
    } else {
        std::hint::spin_loop();
    }
}

/// Every backoff step yields so that the model checker can switch threads.
#[cfg(feature = "loom")]
pub(crate) fn backoff(_step: usize) {
    loom::thread::yield_now();
}
