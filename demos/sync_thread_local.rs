//! Thread-local keys and per-thread storage example.
//!
//! Run with:
//!     cargo run --example sync_thread_local

#[cfg(unix)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::thread;

    use dispatchbuf::{MAX_THREAD_KEYS, ThreadLocalStorage, create_thread_local_key};

    let a = create_thread_local_key();
    let b = create_thread_local_key();
    println!(
        "Allocated keys {:?} and {:?} (platform limit {})",
        a, b, MAX_THREAD_KEYS
    );

    // One scratch counter per worker thread
    let counters = ThreadLocalStorage::try_new()?;

    thread::scope(|s| {
        for worker in 0..4u32 {
            let counters = &counters;
            s.spawn(move || {
                let start = counters.get_or_init(|| worker * 100);
                println!("Worker {} sees its own value: {}", worker, start);
            });
        }
    });

    println!("Main thread value: {:?}", counters.get());
    Ok(())
}

#[cfg(not(unix))]
fn main() {
    println!("Thread-local keys are only available on unix targets");
}
