//! [`Lock`] is a fair reader-writer lock built on a packed state word, an
//! intrusive waiter queue, and keyed-event parking.

use std::fmt;
use std::pin::{Pin, pin};
use std::ptr::{null_mut, NonNull};
use std::sync::atomic::Ordering::{self, AcqRel, Acquire, Relaxed, Release};

#[cfg(feature = "loom")]
use loom::sync::atomic::{AtomicPtr, AtomicUsize};
#[cfg(not(feature = "loom"))]
use std::sync::atomic::{AtomicPtr, AtomicUsize};

use crate::config;
use crate::keyed_event::KeyedEvent;
use crate::opcode::Opcode;
use crate::wait_queue::{WaitBlock, WaitQueue, WakeList};

/// The lock is held, exclusively or by at least one shared owner.
const OWNED: usize = 1;
/// At least one wait block is enqueued.
const WAITERS: usize = 1 << 1;
/// The remaining bits count shared owners.
const SHARED_SHIFT: u32 = 2;
const SHARED_UNIT: usize = 1 << SHARED_SHIFT;

/// Spin budget resolved from the host topology on first contention.
const SPIN_LIMIT_UNRESOLVED: usize = usize::MAX;

const fn shared_count(state: usize) -> usize {
    state >> SHARED_SHIFT
}

/// [`Lock`] is a fair reader-writer lock.
///
/// The uncontended path is a single compare-and-swap on one machine word
/// packing the owned bit, the waiters bit, and the shared-owner count.
/// Contended threads spin for a bounded budget, then queue a stack-allocated
/// wait block and park until a releaser hands them their turn.
///
/// Fairness is FIFO within each acquisition class, with exclusive waiters
/// served ahead of shared waiters; a release wakes either the exclusive
/// waiter at the head of the queue or the entire contiguous run of shared
/// waiters. A shared acquirer never joins an existing shared hold while
/// anyone is queued.
///
/// [`Lock`] only provides low-level locking and unlocking methods, forcing
/// the user to manage the scope of acquired locks; see the [`RwLock`] and
/// [`Mutex`] aliases for an RAII surface.
///
/// [`RwLock`]: crate::RwLock
/// [`Mutex`]: crate::Mutex
pub struct Lock {
    /// Packed ownership state; every transition is a compare-and-swap.
    state: AtomicUsize,
    /// Parked and spinning waiters, in service order.
    queue: WaitQueue,
    /// Lazily installed parking facility.
    event: AtomicPtr<KeyedEvent>,
    /// Spin budget, [`SPIN_LIMIT_UNRESOLVED`] until first read.
    spin_limit: AtomicUsize,
}

impl Lock {
    /// Maximum number of shared owners.
    pub const MAX_SHARED_OWNERS: usize = usize::MAX >> SHARED_SHIFT;

    /// Creates a new [`Lock`] with the spin budget recommended for the host.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastlock::Lock;
    ///
    /// static LOCK: Lock = Lock::new();
    ///
    /// assert!(LOCK.try_lock_exclusive());
    /// assert!(LOCK.unlock_exclusive());
    /// ```
    #[cfg(not(feature = "loom"))]
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AtomicUsize::new(0),
            queue: WaitQueue::new(),
            event: AtomicPtr::new(null_mut()),
            spin_limit: AtomicUsize::new(SPIN_LIMIT_UNRESOLVED),
        }
    }

    /// Creates a new [`Lock`].
    #[cfg(feature = "loom")]
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AtomicUsize::new(0),
            queue: WaitQueue::new(),
            event: AtomicPtr::new(null_mut()),
            spin_limit: AtomicUsize::new(SPIN_LIMIT_UNRESOLVED),
        }
    }

    /// Creates a new [`Lock`] with an explicit spin budget.
    ///
    /// The budget bounds how long a contender busy-waits before enqueueing
    /// and how long a queued waiter busy-waits before parking. Zero sends
    /// every contender straight to the queue.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastlock::Lock;
    ///
    /// let lock = Lock::with_spin_limit(64);
    ///
    /// lock.lock_exclusive();
    /// assert!(lock.unlock_exclusive());
    /// ```
    #[inline]
    #[must_use]
    pub fn with_spin_limit(spin_limit: usize) -> Self {
        Self {
            state: AtomicUsize::new(0),
            queue: WaitQueue::new(),
            event: AtomicPtr::new(null_mut()),
            spin_limit: AtomicUsize::new(spin_limit),
        }
    }

    /// Returns `true` if the lock is currently free.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastlock::Lock;
    /// use std::sync::atomic::Ordering::Relaxed;
    ///
    /// let lock = Lock::default();
    /// assert!(lock.is_free(Relaxed));
    ///
    /// lock.lock_shared();
    /// assert!(!lock.is_free(Relaxed));
    /// lock.unlock_shared();
    /// ```
    #[inline]
    #[must_use]
    pub fn is_free(&self, mo: Ordering) -> bool {
        self.state.load(mo) & OWNED == 0
    }

    /// Returns `true` if an exclusive lock is currently held.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastlock::Lock;
    /// use std::sync::atomic::Ordering::Relaxed;
    ///
    /// let lock = Lock::default();
    ///
    /// lock.lock_exclusive();
    /// assert!(lock.is_locked(Relaxed));
    /// assert!(!lock.is_shared(Relaxed));
    /// lock.unlock_exclusive();
    /// ```
    #[inline]
    #[must_use]
    pub fn is_locked(&self, mo: Ordering) -> bool {
        let state = self.state.load(mo);
        state & OWNED != 0 && shared_count(state) == 0
    }

    /// Returns `true` if a shared lock is currently held.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastlock::Lock;
    /// use std::sync::atomic::Ordering::Relaxed;
    ///
    /// let lock = Lock::default();
    ///
    /// lock.lock_shared();
    /// assert!(lock.is_shared(Relaxed));
    /// assert!(!lock.is_locked(Relaxed));
    /// lock.unlock_shared();
    /// ```
    #[inline]
    #[must_use]
    pub fn is_shared(&self, mo: Ordering) -> bool {
        shared_count(self.state.load(mo)) != 0
    }

    /// Returns the number of shared owners.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastlock::Lock;
    /// use std::sync::atomic::Ordering::Relaxed;
    ///
    /// let lock = Lock::default();
    ///
    /// lock.lock_shared();
    /// lock.lock_shared();
    /// assert_eq!(lock.shared_owners(Relaxed), 2);
    /// lock.unlock_shared();
    /// lock.unlock_shared();
    /// ```
    #[inline]
    #[must_use]
    pub fn shared_owners(&self, mo: Ordering) -> usize {
        shared_count(self.state.load(mo))
    }

    /// Acquires an exclusive lock, parking the thread if it must wait.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastlock::Lock;
    ///
    /// let lock = Lock::default();
    ///
    /// lock.lock_exclusive();
    ///
    /// assert!(!lock.try_lock_shared());
    /// assert!(lock.unlock_exclusive());
    /// ```
    #[inline]
    pub fn lock_exclusive(&self) {
        if self.try_lock_exclusive_internal().0 {
            return;
        }
        self.acquire_slow(Opcode::Exclusive, true);
    }

    /// Tries to acquire an exclusive lock.
    ///
    /// Returns `false` if the lock was not free.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastlock::Lock;
    ///
    /// let lock = Lock::default();
    ///
    /// assert!(lock.try_lock_exclusive());
    /// assert!(!lock.try_lock_shared());
    /// assert!(!lock.try_lock_exclusive());
    /// lock.unlock_exclusive();
    /// ```
    #[inline]
    pub fn try_lock_exclusive(&self) -> bool {
        self.try_lock_exclusive_internal().0
    }

    /// Acquires an exclusive lock without ever parking.
    ///
    /// The thread still takes its place in the waiter queue, so fairness is
    /// preserved, but it busy-waits for its turn and may consume unbounded
    /// CPU.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastlock::Lock;
    /// use std::sync::atomic::Ordering::Relaxed;
    ///
    /// let lock = Lock::default();
    ///
    /// lock.spin_lock_exclusive();
    /// assert!(lock.is_locked(Relaxed));
    /// assert!(lock.unlock_exclusive());
    /// ```
    #[inline]
    pub fn spin_lock_exclusive(&self) {
        if self.try_lock_exclusive_internal().0 {
            return;
        }
        self.acquire_slow(Opcode::Exclusive, false);
    }

    /// Releases an exclusive lock.
    ///
    /// Returns `true` if an exclusive lock was previously held and
    /// successfully released.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastlock::Lock;
    ///
    /// let lock = Lock::default();
    ///
    /// lock.lock_exclusive();
    ///
    /// assert!(lock.unlock_exclusive());
    /// assert!(!lock.unlock_exclusive());
    /// ```
    #[inline]
    pub fn unlock_exclusive(&self) -> bool {
        let Err(mut state) = self.state.compare_exchange(OWNED, 0, Release, Relaxed) else {
            return true;
        };
        loop {
            if state & OWNED == 0 || shared_count(state) != 0 {
                return false;
            }
            match self
                .state
                .compare_exchange(state, state - OWNED, Release, Relaxed)
            {
                Ok(_) => {
                    if state & WAITERS != 0 {
                        self.wake();
                    }
                    return true;
                }
                Err(new_state) => state = new_state,
            }
        }
    }

    /// Acquires a shared lock, parking the thread if it must wait.
    ///
    /// Waiting includes the case where the lock is already shared but other
    /// threads are queued: the acquirer takes its place behind them instead
    /// of starving them.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastlock::Lock;
    ///
    /// let lock = Lock::default();
    ///
    /// lock.lock_shared();
    /// lock.lock_shared();
    ///
    /// assert!(!lock.try_lock_exclusive());
    /// assert!(lock.unlock_shared());
    /// assert!(lock.unlock_shared());
    /// ```
    #[inline]
    pub fn lock_shared(&self) {
        if self.try_lock_shared_internal().0 {
            return;
        }
        self.acquire_slow(Opcode::Shared, true);
    }

    /// Tries to acquire a shared lock.
    ///
    /// Returns `false` if the lock is exclusively held, if any thread is
    /// queued, or if the number of shared owners has reached
    /// [`Self::MAX_SHARED_OWNERS`].
    ///
    /// # Examples
    ///
    /// ```
    /// use fastlock::Lock;
    ///
    /// let lock = Lock::default();
    ///
    /// assert!(lock.try_lock_shared());
    /// assert!(lock.try_lock_shared());
    /// assert!(!lock.try_lock_exclusive());
    /// lock.unlock_shared();
    /// lock.unlock_shared();
    /// ```
    #[inline]
    pub fn try_lock_shared(&self) -> bool {
        self.try_lock_shared_internal().0
    }

    /// Acquires a shared lock without ever parking.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastlock::Lock;
    /// use std::sync::atomic::Ordering::Relaxed;
    ///
    /// let lock = Lock::default();
    ///
    /// lock.spin_lock_shared();
    /// assert!(lock.is_shared(Relaxed));
    /// assert!(lock.unlock_shared());
    /// ```
    #[inline]
    pub fn spin_lock_shared(&self) {
        if self.try_lock_shared_internal().0 {
            return;
        }
        self.acquire_slow(Opcode::Shared, false);
    }

    /// Releases a shared lock.
    ///
    /// Returns `true` if a shared lock was previously held and successfully
    /// released.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastlock::Lock;
    ///
    /// let lock = Lock::default();
    ///
    /// lock.lock_shared();
    /// lock.lock_shared();
    ///
    /// assert!(lock.unlock_shared());
    /// assert!(!lock.try_lock_exclusive());
    /// assert!(lock.unlock_shared());
    ///
    /// assert!(!lock.unlock_shared());
    /// assert!(lock.try_lock_exclusive());
    /// lock.unlock_exclusive();
    /// ```
    #[inline]
    pub fn unlock_shared(&self) -> bool {
        let Err(mut state) = self
            .state
            .compare_exchange(OWNED | SHARED_UNIT, 0, Release, Relaxed)
        else {
            return true;
        };
        loop {
            let owners = shared_count(state);
            if state & OWNED == 0 || owners == 0 {
                return false;
            }
            let next = if owners > 1 {
                state - SHARED_UNIT
            } else {
                state - OWNED - SHARED_UNIT
            };
            match self.state.compare_exchange(state, next, Release, Relaxed) {
                Ok(_) => {
                    // A waiter can be served even when owners remain: a
                    // thread converting shared ownership to exclusive waits
                    // for exactly this transition.
                    if state & WAITERS != 0 {
                        self.wake();
                    }
                    return true;
                }
                Err(new_state) => state = new_state,
            }
        }
    }

    /// Converts an exclusive lock into a shared lock without releasing it.
    ///
    /// Every queued shared waiter is woken to join the new shared hold;
    /// queued exclusive waiters keep their place at the head of the queue.
    ///
    /// Returns `true` if an exclusive lock was previously held and
    /// successfully converted.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastlock::Lock;
    /// use std::sync::atomic::Ordering::Relaxed;
    ///
    /// let lock = Lock::default();
    ///
    /// lock.lock_exclusive();
    ///
    /// assert!(lock.downgrade());
    /// assert!(lock.is_shared(Relaxed));
    /// assert!(lock.unlock_shared());
    /// ```
    #[inline]
    pub fn downgrade(&self) -> bool {
        let mut state = self.state.load(Relaxed);
        loop {
            if state & OWNED == 0 || shared_count(state) != 0 {
                return false;
            }
            match self
                .state
                .compare_exchange(state, state + SHARED_UNIT, Release, Relaxed)
            {
                Ok(_) => {
                    if state & WAITERS != 0 {
                        self.wake_shared();
                    }
                    return true;
                }
                Err(new_state) => state = new_state,
            }
        }
    }

    /// Converts a shared lock into an exclusive lock, parking the thread
    /// until it is the sole owner.
    ///
    /// The caller overtakes every queued waiter, including exclusive ones;
    /// this is what distinguishes conversion from releasing and reacquiring.
    /// If two shared owners upgrade concurrently, neither can ever become
    /// sole owner and both block forever, so upgrades must be mutually
    /// excluded by the caller.
    ///
    /// Returns `false` if no shared lock was held.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastlock::Lock;
    /// use std::sync::atomic::Ordering::Relaxed;
    ///
    /// let lock = Lock::default();
    ///
    /// lock.lock_shared();
    ///
    /// assert!(lock.upgrade());
    /// assert!(lock.is_locked(Relaxed));
    /// assert!(lock.unlock_exclusive());
    /// ```
    #[inline]
    pub fn upgrade(&self) -> bool {
        let (converted, state) = self.try_upgrade_internal();
        if converted {
            return true;
        }
        if state & OWNED == 0 || shared_count(state) == 0 {
            return false;
        }
        self.acquire_slow(Opcode::Upgrade, true);
        true
    }

    /// Converts a shared lock into an exclusive lock without ever parking.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastlock::Lock;
    /// use std::sync::atomic::Ordering::Relaxed;
    ///
    /// let lock = Lock::default();
    ///
    /// lock.lock_shared();
    ///
    /// assert!(lock.spin_upgrade());
    /// assert!(lock.is_locked(Relaxed));
    /// assert!(lock.unlock_exclusive());
    /// ```
    #[inline]
    pub fn spin_upgrade(&self) -> bool {
        let (converted, state) = self.try_upgrade_internal();
        if converted {
            return true;
        }
        if state & OWNED == 0 || shared_count(state) == 0 {
            return false;
        }
        self.acquire_slow(Opcode::Upgrade, false);
        true
    }

    /// Tries to acquire an exclusive lock.
    fn try_lock_exclusive_internal(&self) -> (bool, usize) {
        let Err(mut state) = self.state.compare_exchange(0, OWNED, Acquire, Relaxed) else {
            return (true, 0);
        };
        loop {
            if state & OWNED != 0 {
                return (false, state);
            }
            match self
                .state
                .compare_exchange(state, state | OWNED, Acquire, Relaxed)
            {
                Ok(_) => return (true, 0),
                Err(new_state) => state = new_state,
            }
        }
    }

    /// Tries to acquire a shared lock.
    fn try_lock_shared_internal(&self) -> (bool, usize) {
        let Err(mut state) = self
            .state
            .compare_exchange(0, OWNED | SHARED_UNIT, Acquire, Relaxed)
        else {
            return (true, 0);
        };
        loop {
            let next = if state & OWNED == 0 {
                // First shared owner. A stale waiters bit is preserved and
                // re-examined by the next release.
                state + OWNED + SHARED_UNIT
            } else if state & WAITERS == 0
                && (1..Self::MAX_SHARED_OWNERS).contains(&shared_count(state))
            {
                // Joining an existing shared hold is refused while anyone is
                // queued, so a stream of readers cannot starve the queue.
                state + SHARED_UNIT
            } else {
                return (false, state);
            };
            match self.state.compare_exchange(state, next, Acquire, Relaxed) {
                Ok(_) => return (true, 0),
                Err(new_state) => state = new_state,
            }
        }
    }

    /// Tries to drop the caller's shared slot while keeping ownership,
    /// leaving the lock exclusively held.
    fn try_upgrade_internal(&self) -> (bool, usize) {
        let mut state = self.state.load(Relaxed);
        loop {
            if state & OWNED == 0 || shared_count(state) != 1 {
                return (false, state);
            }
            match self
                .state
                .compare_exchange(state, state - SHARED_UNIT, Acquire, Relaxed)
            {
                Ok(_) => return (true, 0),
                Err(new_state) => state = new_state,
            }
        }
    }

    fn try_acquire(&self, opcode: Opcode) -> (bool, usize) {
        match opcode {
            Opcode::Exclusive => self.try_lock_exclusive_internal(),
            Opcode::Shared => self.try_lock_shared_internal(),
            Opcode::Upgrade => self.try_upgrade_internal(),
        }
    }

    /// Returns `true` if the fast path for `opcode` could succeed at
    /// `state`.
    fn is_acquirable(state: usize, opcode: Opcode) -> bool {
        match opcode {
            Opcode::Exclusive => state & OWNED == 0,
            Opcode::Shared => {
                state & OWNED == 0
                    || (state & WAITERS == 0
                        && (1..Self::MAX_SHARED_OWNERS).contains(&shared_count(state)))
            }
            Opcode::Upgrade => shared_count(state) == 1,
        }
    }

    /// Contended acquisition: bounded spin, enqueue, block, re-contend.
    ///
    /// The lock is never handed to a woken waiter; it re-contends, and
    /// normally wins because the releaser cleared the owned bit immediately
    /// before waking it.
    fn acquire_slow(&self, opcode: Opcode, sleep: bool) {
        loop {
            let spin_limit = self.spin_limit();
            let mut step = 0;
            loop {
                if self.try_acquire(opcode).0 {
                    return;
                }
                if step >= spin_limit {
                    break;
                }
                step += 1;
                config::backoff(step);
            }

            let block = pin!(WaitBlock::new(opcode.queues_exclusive()));
            let block = block.into_ref();
            if !self.enqueue(block, opcode) {
                // The lock changed hands while the queue latch was being
                // taken; start over with a fresh spin budget.
                continue;
            }
            self.block_on(block.get_ref(), sleep);
        }
    }

    /// Publishes a wait block, or returns `false` if the request became
    /// satisfiable while the queue latch was being taken.
    fn enqueue(&self, block: Pin<&WaitBlock>, opcode: Opcode) -> bool {
        let guard = self.queue.lock();
        let state = self.state.load(Acquire);
        if Self::is_acquirable(state, opcode) {
            return false;
        }
        // Publish the waiters bit against the exact state just observed; any
        // concurrent transition invalidates the decision to wait.
        if self
            .state
            .compare_exchange(state, state | WAITERS, AcqRel, Relaxed)
            .is_err()
        {
            return false;
        }
        guard.insert(block, opcode.placement());
        true
    }

    /// Waits on a wait block that is already published in the queue.
    ///
    /// Returns only after the handoff: the block is unlinked and no other
    /// thread will touch it again, so the caller's frame may unwind.
    fn block_on(&self, block: &WaitBlock, sleep: bool) {
        let spin_limit = self.spin_limit();
        let mut step = 0_usize;
        loop {
            if !block.is_spinning() {
                return;
            }
            if sleep && step >= spin_limit {
                break;
            }
            step = step.wrapping_add(1);
            config::backoff(step);
        }

        // The event must exist before the flag is cleared: a waker that
        // observes the cleared flag immediately issues the matching release.
        let event = self.keyed_event();
        if block.finish_spinning() & WaitBlock::SPINNING != 0 {
            // This thread cleared the flag first, so the waker is committed
            // to a release; park to consume it.
            event.park(block.park_key());
        }
    }

    /// Unblocks one dequeued wait block.
    ///
    /// The block must already be unlinked; after the flag handoff the
    /// owning thread may destroy it at any moment.
    fn unblock(&self, block: NonNull<WaitBlock>) {
        let key = unsafe { block.as_ref() }.park_key();
        if unsafe { block.as_ref() }.finish_spinning() & WaitBlock::SPINNING == 0 {
            // The waiter cleared the flag first and went to sleep.
            self.keyed_event().release(key);
        }
    }

    /// Serves the head of the queue after a release that observed waiters.
    ///
    /// An exclusive head is woken alone; a shared head means the whole queue
    /// is shared, and the entire run is woken together. The waiters bit is
    /// cleared exactly when the queue is left empty.
    fn wake(&self) {
        let guard = self.queue.lock();
        let Some(head) = guard.head() else {
            self.clear_waiters();
            return;
        };
        if unsafe { head.as_ref() }.is_exclusive() {
            let block = guard.remove_head();
            if guard.is_empty() {
                self.clear_waiters();
            }
            drop(guard);
            self.unblock(block);
        } else {
            let wake_list = guard.detach_shared_run(head);
            if guard.is_empty() {
                self.clear_waiters();
            }
            drop(guard);
            self.unblock_all(wake_list);
        }
    }

    /// Wakes every shared waiter after a downgrade; exclusive waiters keep
    /// their place.
    fn wake_shared(&self) {
        let guard = self.queue.lock();
        let wake_list = match guard.first_shared() {
            Some(first_shared) => guard.detach_shared_run(first_shared),
            None => WakeList::empty(),
        };
        if guard.is_empty() {
            self.clear_waiters();
        }
        drop(guard);
        self.unblock_all(wake_list);
    }

    fn unblock_all(&self, wake_list: WakeList) {
        for block in wake_list {
            self.unblock(block);
        }
    }

    /// Clears the waiters bit; the caller holds the queue latch and has
    /// observed an empty queue.
    fn clear_waiters(&self) {
        let mut state = self.state.load(Relaxed);
        while state & WAITERS != 0 {
            match self
                .state
                .compare_exchange(state, state & !WAITERS, Release, Relaxed)
            {
                Ok(_) => return,
                Err(new_state) => state = new_state,
            }
        }
    }

    /// Returns the parking facility, installing it on first use.
    fn keyed_event(&self) -> &KeyedEvent {
        let mut event_ptr = self.event.load(Acquire);
        if event_ptr.is_null() {
            let fresh = Box::into_raw(Box::new(KeyedEvent::new()));
            match self
                .event
                .compare_exchange(null_mut(), fresh, AcqRel, Acquire)
            {
                Ok(_) => event_ptr = fresh,
                Err(installed) => {
                    // Another thread installed first; dispose of the local
                    // event.
                    unsafe { drop(Box::from_raw(fresh)) };
                    event_ptr = installed;
                }
            }
        }
        unsafe { &*event_ptr }
    }

    /// Returns the spin budget, resolving the host recommendation on first
    /// use.
    fn spin_limit(&self) -> usize {
        let spin_limit = self.spin_limit.load(Relaxed);
        if spin_limit != SPIN_LIMIT_UNRESOLVED {
            return spin_limit;
        }
        let resolved = config::recommended_spin_limit();
        self.spin_limit.store(resolved, Relaxed);
        resolved
    }
}

impl Default for Lock {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Lock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.load(Relaxed);
        f.debug_struct("Lock")
            .field("state", &state)
            .field("locked", &(state & OWNED != 0 && shared_count(state) == 0))
            .field("shared_owners", &shared_count(state))
            .field("waiters", &(state & WAITERS != 0))
            .finish()
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        debug_assert_eq!(
            self.state.load(Relaxed),
            0,
            "lock dropped while held or contended"
        );
        let event_ptr = self.event.load(Acquire);
        if !event_ptr.is_null() {
            unsafe { drop(Box::from_raw(event_ptr)) };
        }
    }
}
