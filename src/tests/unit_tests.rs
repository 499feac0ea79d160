use std::sync::atomic::Ordering::Relaxed;
use std::sync::atomic::{AtomicBool, AtomicUsize};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::Lock;

#[test]
fn uncontended_round_trip() {
    let lock = Lock::default();

    lock.lock_exclusive();
    assert!(lock.is_locked(Relaxed));
    assert!(!lock.is_shared(Relaxed));
    assert!(lock.unlock_exclusive());
    assert!(lock.is_free(Relaxed));

    lock.spin_lock_exclusive();
    assert!(!lock.try_lock_exclusive());
    assert!(!lock.try_lock_shared());
    assert!(lock.unlock_exclusive());

    lock.lock_shared();
    lock.spin_lock_shared();
    assert!(lock.try_lock_shared());
    assert_eq!(lock.shared_owners(Relaxed), 3);
    assert!(lock.unlock_shared());
    assert!(lock.unlock_shared());
    assert!(lock.unlock_shared());
    assert!(lock.is_free(Relaxed));
    assert_eq!(lock.shared_owners(Relaxed), 0);
}

#[test]
fn inconsistent_transitions_refused() {
    let lock = Lock::default();

    assert!(!lock.unlock_exclusive());
    assert!(!lock.unlock_shared());
    assert!(!lock.downgrade());
    assert!(!lock.upgrade());
    assert!(!lock.spin_upgrade());

    lock.lock_shared();
    assert!(!lock.unlock_exclusive());
    assert!(!lock.downgrade());
    assert!(lock.unlock_shared());

    lock.lock_exclusive();
    assert!(!lock.unlock_shared());
    assert!(!lock.upgrade());
    assert!(lock.unlock_exclusive());
}

#[test]
fn conversion_round_trip() {
    let lock = Lock::default();

    lock.lock_exclusive();
    assert!(lock.downgrade());
    assert!(lock.is_shared(Relaxed));
    assert_eq!(lock.shared_owners(Relaxed), 1);

    assert!(lock.upgrade());
    assert!(lock.is_locked(Relaxed));
    assert_eq!(lock.shared_owners(Relaxed), 0);

    assert!(lock.downgrade());
    assert!(lock.spin_upgrade());
    assert!(lock.unlock_exclusive());
    assert!(lock.is_free(Relaxed));
}

#[test]
fn shared_owners_coexist() {
    let num_threads = 3;

    let lock = Arc::new(Lock::default());
    let check = Arc::new(AtomicUsize::new(0));

    let mut threads = Vec::new();
    for _ in 0..num_threads {
        let lock = lock.clone();
        let check = check.clone();
        threads.push(thread::spawn(move || {
            lock.lock_shared();
            assert!(check.fetch_add(1, Relaxed) < num_threads);
            thread::sleep(Duration::from_millis(10));
            check.fetch_sub(1, Relaxed);
            assert!(lock.unlock_shared());
        }));
    }

    for thread in threads {
        thread.join().unwrap();
    }
    assert_eq!(check.load(Relaxed), 0);
    assert!(lock.is_free(Relaxed));
    assert_eq!(lock.shared_owners(Relaxed), 0);
}

#[test]
fn writer_served_before_late_reader() {
    let lock = Arc::new(Lock::default());
    let order = Arc::new(Mutex::new(Vec::new()));

    lock.lock_shared();

    let writer = {
        let lock = lock.clone();
        let order = order.clone();
        thread::spawn(move || {
            lock.lock_exclusive();
            order.lock().unwrap().push("writer");
            assert!(lock.unlock_exclusive());
        })
    };
    thread::sleep(Duration::from_millis(100));

    let reader = {
        let lock = lock.clone();
        let order = order.clone();
        thread::spawn(move || {
            lock.lock_shared();
            order.lock().unwrap().push("reader");
            assert!(lock.unlock_shared());
        })
    };
    thread::sleep(Duration::from_millis(100));

    assert!(lock.unlock_shared());

    writer.join().unwrap();
    reader.join().unwrap();
    assert_eq!(*order.lock().unwrap(), ["writer", "reader"]);
}

#[test]
fn exclusive_waiters_fifo() {
    let lock = Arc::new(Lock::default());
    let order = Arc::new(Mutex::new(Vec::new()));

    lock.lock_exclusive();

    let mut threads = Vec::new();
    for i in 0..3 {
        let lock = lock.clone();
        let order = order.clone();
        threads.push(thread::spawn(move || {
            lock.lock_exclusive();
            order.lock().unwrap().push(i);
            assert!(lock.unlock_exclusive());
        }));
        thread::sleep(Duration::from_millis(100));
    }

    assert!(lock.unlock_exclusive());

    for thread in threads {
        thread.join().unwrap();
    }
    assert_eq!(*order.lock().unwrap(), [0, 1, 2]);
}

#[test]
fn exclusive_precedes_queued_readers() {
    let lock = Arc::new(Lock::default());
    let order = Arc::new(Mutex::new(Vec::new()));

    lock.lock_exclusive();

    let mut threads = Vec::new();
    for name in ["writer-a", "reader-b", "reader-c", "writer-d"] {
        let lock = lock.clone();
        let order = order.clone();
        threads.push(thread::spawn(move || {
            if name.starts_with("writer") {
                lock.lock_exclusive();
                order.lock().unwrap().push(name);
                assert!(lock.unlock_exclusive());
            } else {
                lock.lock_shared();
                order.lock().unwrap().push(name);
                assert!(lock.unlock_shared());
            }
        }));
        thread::sleep(Duration::from_millis(100));
    }

    assert!(lock.unlock_exclusive());

    for thread in threads {
        thread.join().unwrap();
    }

    // Writer-d enqueued last but joins the exclusive run ahead of the
    // readers; the readers then wake as one cascade, in either order.
    let order = order.lock().unwrap();
    assert_eq!(order[0], "writer-a");
    assert_eq!(order[1], "writer-d");
    let mut readers = [order[2], order[3]];
    readers.sort_unstable();
    assert_eq!(readers, ["reader-b", "reader-c"]);
}

#[test]
fn downgrade_admits_queued_readers() {
    let num_readers = 2;

    let lock = Arc::new(Lock::default());
    let arrived = Arc::new(AtomicUsize::new(0));
    let verified = Arc::new(AtomicBool::new(false));

    lock.lock_exclusive();

    let mut threads = Vec::new();
    for _ in 0..num_readers {
        let lock = lock.clone();
        let arrived = arrived.clone();
        let verified = verified.clone();
        threads.push(thread::spawn(move || {
            lock.lock_shared();
            arrived.fetch_add(1, Relaxed);
            while !verified.load(Relaxed) {
                thread::yield_now();
            }
            assert!(lock.unlock_shared());
        }));
    }
    thread::sleep(Duration::from_millis(100));

    assert!(lock.downgrade());
    while arrived.load(Relaxed) < num_readers {
        thread::yield_now();
    }

    // All of the queued readers joined the downgraded hold.
    assert_eq!(lock.shared_owners(Relaxed), num_readers + 1);
    verified.store(true, Relaxed);
    assert!(lock.unlock_shared());

    for thread in threads {
        thread.join().unwrap();
    }
    assert!(lock.is_free(Relaxed));
}

#[test]
fn upgrade_overtakes_queued_writer() {
    let lock = Arc::new(Lock::default());
    let order = Arc::new(Mutex::new(Vec::new()));

    lock.lock_shared();

    let second_reader = {
        let lock = lock.clone();
        thread::spawn(move || {
            lock.lock_shared();
            thread::sleep(Duration::from_millis(300));
            assert!(lock.unlock_shared());
        })
    };
    thread::sleep(Duration::from_millis(50));

    let writer = {
        let lock = lock.clone();
        let order = order.clone();
        thread::spawn(move || {
            lock.lock_exclusive();
            order.lock().unwrap().push("writer");
            assert!(lock.unlock_exclusive());
        })
    };
    thread::sleep(Duration::from_millis(50));

    assert!(lock.upgrade());
    order.lock().unwrap().push("upgrader");
    assert!(lock.unlock_exclusive());

    second_reader.join().unwrap();
    writer.join().unwrap();
    assert_eq!(*order.lock().unwrap(), ["upgrader", "writer"]);
}

#[test]
fn try_shared_refused_while_writer_queued() {
    let lock = Arc::new(Lock::default());

    lock.lock_shared();

    let writer = {
        let lock = lock.clone();
        thread::spawn(move || {
            lock.lock_exclusive();
            assert!(lock.unlock_exclusive());
        })
    };
    thread::sleep(Duration::from_millis(100));

    // The lock is shared, but joining would starve the queued writer.
    assert!(!lock.try_lock_shared());
    assert!(lock.unlock_shared());

    writer.join().unwrap();

    lock.lock_shared();
    assert!(lock.unlock_shared());
    assert!(lock.is_free(Relaxed));
}

#[test]
fn spin_waiters_take_their_turn() {
    let lock = Arc::new(Lock::default());

    lock.lock_exclusive();

    let spinner = {
        let lock = lock.clone();
        thread::spawn(move || {
            lock.spin_lock_exclusive();
            assert!(lock.unlock_exclusive());
            lock.spin_lock_shared();
            assert!(lock.unlock_shared());
        })
    };
    thread::sleep(Duration::from_millis(100));

    assert!(lock.unlock_exclusive());
    spinner.join().unwrap();
    assert!(lock.is_free(Relaxed));
}

#[test]
fn lock_chaos() {
    let num_threads = 16;
    let num_iters = 256;

    let lock = Arc::new(Lock::default());
    let check = Arc::new(AtomicUsize::new(0));

    lock.lock_exclusive();
    check.fetch_add(usize::MAX, Relaxed);

    let mut threads = Vec::new();
    for i in 0..num_threads {
        let lock = lock.clone();
        let check = check.clone();
        threads.push(thread::spawn(move || {
            for j in 0..num_iters {
                if i == 0 && j % 5 == 0 {
                    // The sole upgrading thread: concurrent upgrades would
                    // block each other forever.
                    lock.lock_shared();
                    assert!(check.fetch_add(1, Relaxed) < num_threads);
                    assert!(lock.upgrade());
                    assert_eq!(check.fetch_add(usize::MAX, Relaxed), 1);
                    check.fetch_sub(usize::MAX, Relaxed);
                    check.fetch_sub(1, Relaxed);
                    assert!(lock.unlock_exclusive());
                } else if j % 13 == 0 {
                    lock.lock_exclusive();
                    assert_eq!(check.fetch_add(usize::MAX, Relaxed), 0);
                    check.fetch_sub(usize::MAX, Relaxed);
                    assert!(lock.downgrade());
                    assert!(check.fetch_add(1, Relaxed) < num_threads);
                    check.fetch_sub(1, Relaxed);
                    assert!(lock.unlock_shared());
                } else if j % 7 == 0 {
                    lock.lock_exclusive();
                    assert_eq!(check.fetch_add(usize::MAX, Relaxed), 0);
                    thread::sleep(Duration::from_micros(1));
                    check.fetch_sub(usize::MAX, Relaxed);
                    assert!(lock.unlock_exclusive());
                } else if j % 2 == 0 {
                    lock.lock_shared();
                    assert!(check.fetch_add(1, Relaxed) < num_threads);
                    thread::sleep(Duration::from_micros(1));
                    check.fetch_sub(1, Relaxed);
                    assert!(lock.unlock_shared());
                } else {
                    lock.spin_lock_shared();
                    assert!(check.fetch_add(1, Relaxed) < num_threads);
                    check.fetch_sub(1, Relaxed);
                    assert!(lock.unlock_shared());
                }
            }
        }));
    }

    thread::sleep(Duration::from_millis(1));
    check.fetch_sub(usize::MAX, Relaxed);
    assert!(lock.unlock_exclusive());

    for thread in threads {
        thread.join().unwrap();
    }
    assert_eq!(check.load(Relaxed), 0);
    assert!(lock.is_free(Relaxed));
    assert_eq!(lock.shared_owners(Relaxed), 0);
}
