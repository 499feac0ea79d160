use std::sync::Arc;

use loom::thread::spawn;

use crate::Lock;

#[test]
fn exclusive_handoff() {
    loom::model(|| {
        let lock = Arc::new(Lock::new());
        lock.lock_exclusive();

        let lock_clone = lock.clone();
        let thread = spawn(move || {
            lock_clone.lock_shared();
            assert!(lock_clone.unlock_shared());
        });

        assert!(lock.unlock_exclusive());
        assert!(thread.join().is_ok());
    });
}

#[test]
fn shared_handoff() {
    loom::model(|| {
        let lock = Arc::new(Lock::new());
        lock.lock_shared();

        let lock_clone = lock.clone();
        let thread = spawn(move || {
            lock_clone.lock_exclusive();
            assert!(lock_clone.unlock_exclusive());
        });

        assert!(lock.unlock_shared());
        assert!(thread.join().is_ok());
    });
}

#[test]
fn downgrade_handoff() {
    loom::model(|| {
        let lock = Arc::new(Lock::new());
        lock.lock_exclusive();

        let lock_clone = lock.clone();
        let thread = spawn(move || {
            lock_clone.lock_shared();
            assert!(lock_clone.unlock_shared());
        });

        assert!(lock.downgrade());
        assert!(lock.unlock_shared());
        assert!(thread.join().is_ok());
    });
}

#[test]
fn upgrade_handoff() {
    loom::model(|| {
        let lock = Arc::new(Lock::new());
        lock.lock_shared();

        let lock_clone = lock.clone();
        let thread = spawn(move || {
            lock_clone.lock_shared();
            assert!(lock_clone.unlock_shared());
        });

        assert!(lock.upgrade());
        assert!(lock.unlock_exclusive());
        assert!(thread.join().is_ok());
    });
}
