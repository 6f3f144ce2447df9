//! Thread-local keys backed by the platform's native slot table.
//!
//! - [`ThreadLocalKey`] - A raw `pthread_key_t`, released on drop
//! - [`create_thread_local_key`] - Allocate a key, aborting on exhaustion
//! - [`ThreadLocalStorage`] - One `Arc<T>` per thread on top of a key
//!
//! Key allocation is synchronised by the operating system; this module adds
//! no locking of its own.

mod key;
mod storage;

pub use key::{ThreadLocalKey, create_thread_local_key};
pub use storage::ThreadLocalStorage;
