// Integration tests for thread-local keys and storage
// Tests cover: key uniqueness, per-thread isolation, value lifetime

#![cfg(unix)]

use std::collections::HashSet;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use dispatchbuf::{
    DispatchError, MAX_THREAD_KEYS, ThreadLocalKey, ThreadLocalStorage, create_thread_local_key,
};

// ============================================================================
// Key Allocation
// ============================================================================

#[test]
fn test_repeated_calls_give_distinct_keys() {
    let keys: Vec<ThreadLocalKey> = (0..32).map(|_| create_thread_local_key()).collect();
    let unique: HashSet<_> = keys.iter().map(ThreadLocalKey::as_raw).collect();

    assert_eq!(unique.len(), keys.len(), "live keys must never repeat");
}

#[test]
fn test_concurrent_calls_give_distinct_keys() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 8;

    let barrier = Arc::new(Barrier::new(THREADS));
    let keys = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            let keys = Arc::clone(&keys);
            thread::spawn(move || {
                barrier.wait();
                let mine: Vec<_> = (0..PER_THREAD).map(|_| create_thread_local_key()).collect();
                keys.lock().unwrap().extend(mine);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let keys = keys.lock().unwrap();
    let unique: HashSet<_> = keys.iter().map(ThreadLocalKey::as_raw).collect();
    assert_eq!(keys.len(), THREADS * PER_THREAD);
    assert_eq!(unique.len(), keys.len());
}

#[test]
fn test_try_new_succeeds() {
    let key = ThreadLocalKey::try_new().expect("slot table should not be exhausted");
    assert!(key.get().is_null());
}

// ============================================================================
// Slot Table Exhaustion
// ============================================================================

// Set in the child process that fills the slot table.
const EXHAUST_KEYS_ENV: &str = "DISPATCHBUF_EXHAUST_KEYS";

#[test]
fn test_exhaustion_is_fatal() {
    use std::os::unix::process::ExitStatusExt;
    use std::process::Command;

    if std::env::var_os(EXHAUST_KEYS_ENV).is_some() {
        exhaust_keys_then_create();
    }

    let output = Command::new(std::env::current_exe().unwrap())
        .args(["--exact", "test_exhaustion_is_fatal", "--nocapture"])
        .env(EXHAUST_KEYS_ENV, "1")
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(
        output.status.signal(),
        Some(libc::SIGABRT),
        "child did not abort: {:?}\n{}",
        output.status,
        stderr
    );
    assert!(stderr.contains("exhausted slot table"), "{}", stderr);
    assert!(stderr.contains("thread-local key table exhausted, aborting"), "{}", stderr);
}

/// Fills the slot table, checks the recoverable error, then hits the fatal path.
fn exhaust_keys_then_create() -> ! {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let mut held = Vec::new();
    let err = loop {
        match ThreadLocalKey::try_new() {
            Ok(key) => held.push(key),
            Err(err) => break err,
        }
        assert!(held.len() <= MAX_THREAD_KEYS, "slot table never filled");
    };

    match err {
        DispatchError::KeyCreation { code } => assert_eq!(code, libc::EAGAIN),
        other => panic!("unexpected error: {:?}", other),
    }
    eprintln!("exhausted slot table after {} keys", held.len());

    let _key = create_thread_local_key();
    unreachable!("key creation succeeded with {} keys held", held.len());
}

// ============================================================================
// Per-Thread Values
// ============================================================================

#[test]
fn test_two_threads_see_their_own_values() {
    let barrier = Arc::new(Barrier::new(2));

    let spawn = |value: u32| {
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            let key = create_thread_local_key();
            let mut stored = value;
            key.set(std::ptr::from_mut(&mut stored).cast()).unwrap();

            // Both threads have stored before either reads back
            barrier.wait();

            let read = key.get().cast::<u32>();
            // SAFETY: the pointer was stored by this thread and `stored` is live.
            let read = unsafe { *read };
            key.set(std::ptr::null_mut()).unwrap();
            read
        })
    };

    let t1 = spawn(10);
    let t2 = spawn(20);

    assert_eq!(t1.join().unwrap(), 10);
    assert_eq!(t2.join().unwrap(), 20);
}

#[test]
fn test_shared_key_is_isolated_per_thread() {
    let storage = ThreadLocalStorage::new();
    let barrier = Barrier::new(2);

    thread::scope(|s| {
        let a = s.spawn(|| {
            storage.set(10u32).unwrap();
            barrier.wait();
            *storage.get().unwrap()
        });
        let b = s.spawn(|| {
            storage.set(20u32).unwrap();
            barrier.wait();
            *storage.get().unwrap()
        });

        assert_eq!(a.join().unwrap(), 10);
        assert_eq!(b.join().unwrap(), 20);
    });

    assert!(storage.get().is_none(), "the main thread never stored a value");
}

#[test]
fn test_storage_lazily_initialises_per_thread() {
    let storage = ThreadLocalStorage::new();
    let main_value = storage.get_or_init(|| String::from("main"));

    let other = thread::scope(|s| {
        s.spawn(|| storage.get_or_init(|| String::from("worker")).to_string())
            .join()
            .unwrap()
    });

    assert_eq!(other, "worker");
    assert_eq!(*main_value, "main");
    assert!(Arc::ptr_eq(&main_value, &storage.get().unwrap()));
}
