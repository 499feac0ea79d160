//! The intrusive waiter queue shared by all contended acquisitions.
//!
//! Waiters link stack-allocated [`WaitBlock`]s into a circular doubly-linked
//! list rooted at a lazily allocated sentinel. The list, together with the
//! first-shared cursor, is guarded by a dedicated spinlock (the latch) that
//! is never held while parking or unparking.

#[cfg(feature = "loom")]
use loom::sync::atomic::{AtomicBool, AtomicPtr, AtomicU32};
use std::pin::Pin;
use std::ptr::{addr_of, null_mut, NonNull};
use std::sync::atomic::Ordering::{AcqRel, Acquire, Relaxed, Release};
#[cfg(not(feature = "loom"))]
use std::sync::atomic::{AtomicBool, AtomicPtr, AtomicU32};

use crate::config;

/// A queue node owned by exactly one waiting thread.
///
/// The block lives on the waiting thread's stack for the duration of the
/// wait: the frame is pinned until the thread has observed its own handoff,
/// which is exactly the lifetime every other reference to the block needs.
#[repr(align(128))]
pub(crate) struct WaitBlock {
    flink: AtomicPtr<WaitBlock>,
    blink: AtomicPtr<WaitBlock>,
    flags: AtomicU32,
}

impl WaitBlock {
    /// The owning thread waits for exclusive ownership.
    pub(crate) const EXCLUSIVE: u32 = 1;
    /// The owning thread has not yet been handed its wakeup.
    pub(crate) const SPINNING: u32 = 1 << 1;

    pub(crate) fn new(exclusive: bool) -> Self {
        let flags = if exclusive {
            Self::EXCLUSIVE | Self::SPINNING
        } else {
            Self::SPINNING
        };
        Self {
            flink: AtomicPtr::new(null_mut()),
            blink: AtomicPtr::new(null_mut()),
            flags: AtomicU32::new(flags),
        }
    }

    /// A list head; never waited on, never woken.
    fn sentinel() -> Self {
        Self {
            flink: AtomicPtr::new(null_mut()),
            blink: AtomicPtr::new(null_mut()),
            flags: AtomicU32::new(0),
        }
    }

    pub(crate) fn is_exclusive(&self) -> bool {
        self.flags.load(Relaxed) & Self::EXCLUSIVE != 0
    }

    pub(crate) fn is_spinning(&self) -> bool {
        self.flags.load(Acquire) & Self::SPINNING != 0
    }

    /// Clears the spinning flag, returning the previous flags.
    ///
    /// Both the waiter and its waker race through here exactly once per
    /// wait; whichever observes the flag already cleared knows the other
    /// side committed first.
    pub(crate) fn finish_spinning(&self) -> u32 {
        self.flags.fetch_and(!Self::SPINNING, AcqRel)
    }

    /// The parking key: the block's address pairs one sleeper with one
    /// wakeup.
    pub(crate) fn park_key(&self) -> usize {
        let block_ptr: *const Self = addr_of!(*self);
        block_ptr as usize
    }
}

/// Insertion positions within the queue.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Placement {
    /// Ahead of every waiter; reserved for shared-to-exclusive conversion.
    Front,
    /// At the tail of the exclusive run, just before the first shared
    /// waiter.
    ExclusiveTail,
    /// At the tail of the queue.
    Tail,
}

/// The waiter queue: a latch, a lazily allocated sentinel, and the
/// first-shared cursor.
///
/// Ordering invariant: exclusive waiters precede shared waiters, and
/// insertion order is preserved within each class.
pub(crate) struct WaitQueue {
    latch: AtomicBool,
    sentinel: AtomicPtr<WaitBlock>,
    /// The first shared waiter, or the sentinel when there is none.
    first_shared: AtomicPtr<WaitBlock>,
}

impl WaitQueue {
    #[cfg(not(feature = "loom"))]
    pub(crate) const fn new() -> Self {
        Self {
            latch: AtomicBool::new(false),
            sentinel: AtomicPtr::new(null_mut()),
            first_shared: AtomicPtr::new(null_mut()),
        }
    }

    #[cfg(feature = "loom")]
    pub(crate) fn new() -> Self {
        Self {
            latch: AtomicBool::new(false),
            sentinel: AtomicPtr::new(null_mut()),
            first_shared: AtomicPtr::new(null_mut()),
        }
    }

    /// Spin-acquires the latch.
    pub(crate) fn lock(&self) -> QueueGuard<'_> {
        let mut step: usize = 0;
        while self
            .latch
            .compare_exchange_weak(false, true, Acquire, Relaxed)
            .is_err()
        {
            step = step.wrapping_add(1);
            config::backoff(step);
        }
        QueueGuard { queue: self }
    }
}

impl Drop for WaitQueue {
    fn drop(&mut self) {
        let sentinel = self.sentinel.load(Acquire);
        if !sentinel.is_null() {
            debug_assert_eq!(
                unsafe { (*sentinel).flink.load(Relaxed) },
                sentinel,
                "queue dropped with enqueued waiters"
            );
            unsafe { drop(Box::from_raw(sentinel)) };
        }
    }
}

/// Proof of latch ownership; every link mutation goes through this guard.
pub(crate) struct QueueGuard<'q> {
    queue: &'q WaitQueue,
}

impl Drop for QueueGuard<'_> {
    fn drop(&mut self) {
        self.queue.latch.store(false, Release);
    }
}

impl QueueGuard<'_> {
    /// Returns the sentinel, allocating and self-linking it on first use.
    fn ensure_sentinel(&self) -> *mut WaitBlock {
        let installed = self.queue.sentinel.load(Relaxed);
        if !installed.is_null() {
            return installed;
        }
        let sentinel = Box::into_raw(Box::new(WaitBlock::sentinel()));
        unsafe {
            (*sentinel).flink.store(sentinel, Relaxed);
            (*sentinel).blink.store(sentinel, Relaxed);
        }
        self.queue.sentinel.store(sentinel, Release);
        self.queue.first_shared.store(sentinel, Relaxed);
        sentinel
    }

    pub(crate) fn is_empty(&self) -> bool {
        let sentinel = self.queue.sentinel.load(Relaxed);
        sentinel.is_null() || unsafe { (*sentinel).flink.load(Relaxed) } == sentinel
    }

    /// The waiter at the head of the queue, if any.
    pub(crate) fn head(&self) -> Option<NonNull<WaitBlock>> {
        let sentinel = self.queue.sentinel.load(Relaxed);
        if sentinel.is_null() {
            return None;
        }
        let head = unsafe { (*sentinel).flink.load(Relaxed) };
        if head == sentinel {
            None
        } else {
            NonNull::new(head)
        }
    }

    /// The first shared waiter, if any.
    pub(crate) fn first_shared(&self) -> Option<NonNull<WaitBlock>> {
        let sentinel = self.queue.sentinel.load(Relaxed);
        if sentinel.is_null() {
            return None;
        }
        let cursor = self.queue.first_shared.load(Relaxed);
        if cursor == sentinel {
            None
        } else {
            NonNull::new(cursor)
        }
    }

    /// Links a pinned wait block into the queue.
    ///
    /// The pin is the caller's promise that the block stays put until its
    /// owning thread observes the handoff.
    pub(crate) fn insert(&self, block: Pin<&WaitBlock>, placement: Placement) {
        debug_assert_eq!(
            block.is_exclusive(),
            placement != Placement::Tail,
            "shared waiters go to the tail, exclusive waiters do not"
        );

        let sentinel = self.ensure_sentinel();
        let block_ptr: *mut WaitBlock = addr_of!(*block.get_ref()).cast_mut();
        unsafe {
            let anchor = match placement {
                Placement::Front => (*sentinel).flink.load(Relaxed),
                Placement::ExclusiveTail => self.queue.first_shared.load(Relaxed),
                Placement::Tail => sentinel,
            };
            let before = (*anchor).blink.load(Relaxed);
            (*block_ptr).flink.store(anchor, Relaxed);
            (*block_ptr).blink.store(before, Relaxed);
            (*before).flink.store(block_ptr, Relaxed);
            (*anchor).blink.store(block_ptr, Relaxed);
        }

        if placement == Placement::Tail && self.queue.first_shared.load(Relaxed) == sentinel {
            // The new block is the first shared waiter.
            self.queue.first_shared.store(block_ptr, Relaxed);
        }
    }

    /// Unlinks and returns the head of the queue.
    ///
    /// The caller has verified that the head exists and is exclusive, so the
    /// first-shared cursor is unaffected.
    pub(crate) fn remove_head(&self) -> NonNull<WaitBlock> {
        let sentinel = self.queue.sentinel.load(Relaxed);
        unsafe {
            let head = (*sentinel).flink.load(Relaxed);
            debug_assert_ne!(head, sentinel, "remove_head on an empty queue");
            debug_assert_ne!(self.queue.first_shared.load(Relaxed), head);
            let next = (*head).flink.load(Relaxed);
            (*sentinel).flink.store(next, Relaxed);
            (*next).blink.store(sentinel, Relaxed);
            NonNull::new_unchecked(head)
        }
    }

    /// Unlinks the contiguous run of shared blocks starting at `start`,
    /// stopping at the first exclusive block or the sentinel, and resets the
    /// first-shared cursor.
    ///
    /// The detached blocks are chained through their forward links and
    /// belong to the returned wake list alone.
    pub(crate) fn detach_shared_run(&self, start: NonNull<WaitBlock>) -> WakeList {
        let sentinel = self.queue.sentinel.load(Relaxed);
        debug_assert!(!sentinel.is_null());

        let start_ptr = start.as_ptr();
        let mut last = start_ptr;
        let mut stop = start_ptr;
        unsafe {
            while stop != sentinel && !(*stop).is_exclusive() {
                last = stop;
                stop = (*stop).flink.load(Relaxed);
            }
            if stop == start_ptr {
                return WakeList::empty();
            }
            let before = (*start_ptr).blink.load(Relaxed);
            (*before).flink.store(stop, Relaxed);
            (*stop).blink.store(before, Relaxed);
            (*last).flink.store(null_mut(), Relaxed);
        }

        // Every shared waiter left the queue.
        self.queue.first_shared.store(sentinel, Relaxed);
        WakeList { head: start_ptr }
    }
}

/// A private chain of dequeued wait blocks awaiting their wakeups.
pub(crate) struct WakeList {
    head: *mut WaitBlock,
}

impl WakeList {
    pub(crate) const fn empty() -> Self {
        Self { head: null_mut() }
    }
}

impl Iterator for WakeList {
    type Item = NonNull<WaitBlock>;

    fn next(&mut self) -> Option<NonNull<WaitBlock>> {
        let block = NonNull::new(self.head)?;
        // The forward link must be read before the block is unblocked; the
        // owning thread reclaims the frame as soon as it observes the
        // handoff.
        self.head = unsafe { block.as_ref().flink.load(Relaxed) };
        Some(block)
    }
}
