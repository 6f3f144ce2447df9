//! Native thread-local key allocation.

use std::ffi::c_void;
use std::fmt;

use crate::config::MAX_THREAD_KEYS;
use crate::error::DispatchError;

/// Destructor run by the platform for a non-null value when its thread exits.
pub(crate) type Destructor = unsafe extern "C" fn(*mut c_void);

/// A process-unique key into the native thread-local slot table.
///
/// Every thread sees its own value under the same key; a fresh key reads as
/// null on all threads. The slot is released when the key is dropped. Values
/// still stored under it at that point are not destroyed.
///
/// # Example
///
/// ```
/// use dispatchbuf::ThreadLocalKey;
///
/// let key = ThreadLocalKey::try_new()?;
/// assert!(key.get().is_null());
///
/// let mut value = 10u32;
/// key.set(std::ptr::from_mut(&mut value).cast())?;
/// assert_eq!(key.get().cast::<u32>(), std::ptr::from_mut(&mut value));
///
/// key.set(std::ptr::null_mut())?;
/// # Ok::<(), dispatchbuf::DispatchError>(())
/// ```
#[derive(PartialEq, Eq, Hash)]
pub struct ThreadLocalKey {
    key: libc::pthread_key_t,
}

impl ThreadLocalKey {
    /// Allocates a new key.
    ///
    /// Returns [`DispatchError::KeyCreation`] when the platform refuses,
    /// which in practice means all [`MAX_THREAD_KEYS`] slots are taken.
    pub fn try_new() -> Result<Self, DispatchError> {
        Self::with_destructor(None)
    }

    pub(crate) fn with_destructor(destructor: Option<Destructor>) -> Result<Self, DispatchError> {
        let mut key: libc::pthread_key_t = 0;
        // SAFETY: `key` is a valid out-pointer for the duration of the call.
        let code = unsafe { libc::pthread_key_create(&mut key, destructor) };
        if code != 0 {
            return Err(DispatchError::KeyCreation { code });
        }

        tracing::debug!(key = key as u64, "created thread-local key");
        Ok(Self { key })
    }

    /// Returns the calling thread's value, or null if none was set.
    pub fn get(&self) -> *mut c_void {
        // SAFETY: `self.key` was returned by `pthread_key_create` and is
        // deleted only on drop.
        unsafe { libc::pthread_getspecific(self.key) }
    }

    /// Stores `value` as the calling thread's value.
    ///
    /// The pointer is stored as-is; the caller stays responsible for whatever
    /// it points to.
    pub fn set(&self, value: *mut c_void) -> Result<(), DispatchError> {
        // SAFETY: `self.key` is a live key (see `get`).
        let code = unsafe { libc::pthread_setspecific(self.key, value.cast_const()) };
        if code != 0 {
            return Err(DispatchError::KeyAssignment { code });
        }
        Ok(())
    }

    /// Returns the underlying platform key.
    pub fn as_raw(&self) -> libc::pthread_key_t {
        self.key
    }
}

impl Drop for ThreadLocalKey {
    fn drop(&mut self) {
        // SAFETY: the key is live and never used again after this point.
        let code = unsafe { libc::pthread_key_delete(self.key) };
        if code != 0 {
            tracing::warn!(key = self.key as u64, code, "failed to delete thread-local key");
        } else {
            tracing::debug!(key = self.key as u64, "deleted thread-local key");
        }
    }
}

impl fmt::Debug for ThreadLocalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ThreadLocalKey").field(&self.key).finish()
    }
}

/// Allocates a new thread-local key.
///
/// Concurrent callers always receive distinct keys. Running out of slots is
/// not recoverable: the failure is logged and the process aborts. Use
/// [`ThreadLocalKey::try_new`] to handle exhaustion instead.
///
/// # Example
///
/// ```
/// use dispatchbuf::create_thread_local_key;
///
/// let a = create_thread_local_key();
/// let b = create_thread_local_key();
/// assert_ne!(a, b);
/// ```
pub fn create_thread_local_key() -> ThreadLocalKey {
    match ThreadLocalKey::try_new() {
        Ok(key) => key,
        Err(err) => abort_on_exhaustion(err),
    }
}

pub(crate) fn abort_on_exhaustion(err: DispatchError) -> ! {
    tracing::error!(
        error = %err,
        limit = MAX_THREAD_KEYS,
        "thread-local key table exhausted, aborting"
    );
    std::process::abort()
}
