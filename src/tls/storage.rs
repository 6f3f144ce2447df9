//! Typed per-thread storage built on a native key.

use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;
use std::ptr;
use std::sync::Arc;

use super::key::{ThreadLocalKey, abort_on_exhaustion};
use crate::error::DispatchError;

/// Holds one `Arc<T>` per thread under a dedicated [`ThreadLocalKey`].
///
/// Values are created lazily by [`get_or_init`](Self::get_or_init) and dropped
/// when their thread exits. Dropping the storage drops the calling thread's
/// value and releases the key; values still held by other running threads are
/// leaked, since the platform does not run destructors for a deleted key.
///
/// # Example
///
/// ```
/// use dispatchbuf::ThreadLocalStorage;
///
/// let storage = ThreadLocalStorage::new();
///
/// std::thread::scope(|s| {
///     s.spawn(|| assert_eq!(*storage.get_or_init(|| 10), 10));
///     s.spawn(|| assert_eq!(*storage.get_or_init(|| 20), 20));
/// });
///
/// assert!(storage.get().is_none());
/// ```
pub struct ThreadLocalStorage<T: 'static> {
    key: ThreadLocalKey,
    // Values never cross threads through the storage itself.
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: 'static> ThreadLocalStorage<T> {
    /// Creates empty storage, aborting if no key slot is left.
    pub fn new() -> Self {
        Self::try_new().unwrap_or_else(|err| abort_on_exhaustion(err))
    }

    /// Creates empty storage.
    pub fn try_new() -> Result<Self, DispatchError> {
        let key = ThreadLocalKey::with_destructor(Some(release_value::<T>))?;
        Ok(Self {
            key,
            _marker: PhantomData,
        })
    }

    /// Returns the calling thread's value, if any.
    pub fn get(&self) -> Option<Arc<T>> {
        let slot = self.key.get().cast::<Arc<T>>();
        // SAFETY: a non-null slot always holds a live `Box<Arc<T>>` created by
        // `replace` on this thread.
        unsafe { slot.as_ref() }.cloned()
    }

    /// Returns the calling thread's value, creating it with `init` first if
    /// the thread has none.
    ///
    /// If `init` itself stores a value on this thread, that value wins and
    /// the one `init` returned is dropped.
    pub fn get_or_init<F>(&self, init: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        if let Some(value) = self.get() {
            return value;
        }

        let value = Arc::new(init());
        if let Some(existing) = self.get() {
            return existing;
        }

        if let Err(err) = self.replace(Some(Arc::clone(&value))) {
            tracing::warn!(error = %err, "thread-local value not stored, returning it unshared");
        }
        value
    }

    /// Replaces the calling thread's value.
    pub fn set(&self, value: T) -> Result<(), DispatchError> {
        self.replace(Some(Arc::new(value))).map(drop)
    }

    /// Removes and returns the calling thread's value.
    pub fn take(&self) -> Option<Arc<T>> {
        if self.key.get().is_null() {
            return None;
        }
        self.replace(None).ok().flatten()
    }

    fn replace(&self, value: Option<Arc<T>>) -> Result<Option<Arc<T>>, DispatchError> {
        let new = match value {
            Some(value) => Box::into_raw(Box::new(value)).cast::<c_void>(),
            None => ptr::null_mut(),
        };
        let old = self.key.get();

        if let Err(err) = self.key.set(new) {
            // SAFETY: `new` was not stored, so this is its only owner.
            drop(unsafe { unbox::<T>(new) });
            return Err(err);
        }

        // SAFETY: `old` was just unlinked from the slot.
        Ok(unsafe { unbox::<T>(old) })
    }
}

impl<T: 'static> Default for ThreadLocalStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Drop for ThreadLocalStorage<T> {
    fn drop(&mut self) {
        drop(self.take());
    }
}

impl<T: 'static> fmt::Debug for ThreadLocalStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadLocalStorage")
            .field("key", &self.key)
            .finish()
    }
}

/// Reclaims a slot pointer produced by `ThreadLocalStorage::replace`.
///
/// # Safety
///
/// `ptr` must be null or an unlinked pointer from `Box::<Arc<T>>::into_raw`.
unsafe fn unbox<T>(ptr: *mut c_void) -> Option<Arc<T>> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: guaranteed by the caller.
    Some(*unsafe { Box::from_raw(ptr.cast::<Arc<T>>()) })
}

unsafe extern "C" fn release_value<T>(ptr: *mut c_void) {
    // SAFETY: the platform hands back exactly what `replace` stored, after
    // clearing the slot.
    drop(unsafe { unbox::<T>(ptr) });
}
