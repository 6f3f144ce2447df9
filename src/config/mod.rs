//! Configuration for channel reads and platform limits.
//!
//! - [`ChannelConfig`] - Read sizing for [`IoChannel`](crate::IoChannel)
//! - [`MAX_THREAD_KEYS`] - Native thread-local slot limit

use crate::error::DispatchError;

/// Default size of a single read from the underlying source (64 KiB).
pub const DEFAULT_READ_SIZE: usize = 64 * 1024;

/// Largest accepted read size (16 MiB).
pub const MAX_READ_SIZE: usize = 16 * 1024 * 1024;

/// Number of thread-local keys the platform can hand out per process.
///
/// This mirrors `PTHREAD_KEYS_MAX`. Keys held by the standard library and
/// other crates count against the same table, so fewer are available to
/// callers in practice. Exhausting it makes
/// [`create_thread_local_key`](crate::create_thread_local_key) abort.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub const MAX_THREAD_KEYS: usize = 1024;

/// Number of thread-local keys the platform can hand out per process.
///
/// This mirrors `PTHREAD_KEYS_MAX`. Keys held by the standard library and
/// other crates count against the same table, so fewer are available to
/// callers in practice. Exhausting it makes
/// [`create_thread_local_key`](crate::create_thread_local_key) abort.
#[cfg(target_vendor = "apple")]
pub const MAX_THREAD_KEYS: usize = 512;

/// Number of thread-local keys the platform can hand out per process.
///
/// Falls back to `_POSIX_THREAD_KEYS_MAX`, the minimum POSIX guarantees.
#[cfg(not(any(target_os = "linux", target_os = "android", target_vendor = "apple")))]
pub const MAX_THREAD_KEYS: usize = 128;

/// Configuration for reading from an [`IoChannel`](crate::IoChannel).
///
/// `read_size` bounds how many bytes a single read from the source may
/// return; each read becomes one region of the resulting
/// [`DispatchData`](crate::DispatchData). `max_length` caps
/// [`read_until_end`](crate::PipeSource::read_until_end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelConfig {
    read_size: usize,
    max_length: usize,
}

impl ChannelConfig {
    /// Creates a new configuration.
    ///
    /// Returns error if either size is zero or `read_size` exceeds
    /// [`MAX_READ_SIZE`].
    pub fn new(read_size: usize, max_length: usize) -> Result<Self, DispatchError> {
        if read_size == 0 || max_length == 0 {
            return Err(DispatchError::InvalidConfig {
                message: "read sizes must be non-zero",
            });
        }

        if read_size > MAX_READ_SIZE {
            return Err(DispatchError::InvalidConfig {
                message: "read_size cannot exceed 16 MiB",
            });
        }

        Ok(Self {
            read_size,
            max_length,
        })
    }

    /// Sets the size of a single read.
    ///
    /// Note: This does not validate the configuration. Use
    /// [`ChannelConfig::validate`] to check it, or let
    /// [`IoChannel::with_config`](crate::IoChannel::with_config) reject it.
    ///
    /// # Example
    ///
    /// ```
    /// use dispatchbuf::ChannelConfig;
    ///
    /// let config = ChannelConfig::default().with_read_size(4096);
    /// assert_eq!(config.read_size(), 4096);
    /// ```
    pub fn with_read_size(mut self, size: usize) -> Self {
        self.read_size = size;
        self
    }

    /// Sets the maximum number of bytes `read_until_end` collects.
    ///
    /// Note: This does not validate the configuration. Use
    /// [`ChannelConfig::validate`] to check it.
    pub fn with_max_length(mut self, length: usize) -> Self {
        self.max_length = length;
        self
    }

    /// Returns the size of a single read.
    pub fn read_size(&self) -> usize {
        self.read_size
    }

    /// Returns the maximum number of bytes `read_until_end` collects.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Validates the current configuration.
    pub fn validate(&self) -> Result<(), DispatchError> {
        Self::new(self.read_size, self.max_length).map(|_| ())
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            read_size: DEFAULT_READ_SIZE,
            max_length: usize::MAX,
        }
    }
}
