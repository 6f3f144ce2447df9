//! Buffer bridge between [`Bytes`] and [`DispatchData`].
//!
//! - [`create_dispatch_data`] - Wrap an immutable buffer as dispatch data
//! - [`bridge_dispatch_data`] - View dispatch data as `Bytes` again
//!   (requires the `object-bridge` feature)
//! - [`Ownership`] - Whether a conversion shares or copies the bytes
//!
//! Both directions are infallible. A `Bytes` and a single-region
//! `DispatchData` share one representation, so converting between them only
//! adjusts a reference count.

use bytes::Bytes;

use crate::data::DispatchData;

/// How a buffer's bytes end up owned by the resulting [`DispatchData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ownership {
    /// The data aliases the source buffer's storage.
    #[default]
    Shared,
    /// The data holds its own copy of the bytes.
    Copy,
}

impl DispatchData {
    /// Converts `buffer` into dispatch data using the given ownership mode.
    ///
    /// # Example
    ///
    /// ```
    /// use bytes::Bytes;
    /// use dispatchbuf::{DispatchData, Ownership};
    ///
    /// let source = Bytes::from(vec![1u8, 2, 3]);
    /// let copied = DispatchData::with_ownership(source.clone(), Ownership::Copy);
    ///
    /// assert_eq!(copied, source);
    /// assert_ne!(copied.to_contiguous().as_ptr(), source.as_ptr());
    /// ```
    pub fn with_ownership(buffer: Bytes, ownership: Ownership) -> Self {
        match ownership {
            Ownership::Shared => Self::from(buffer),
            Ownership::Copy => Self::copy_from_slice(&buffer),
        }
    }
}

/// Converts an immutable buffer into dispatch data without copying.
///
/// The result holds a shared reference to the same storage. Empty input gives
/// empty data (length 0), never an error. Borrowed or still-mutable memory
/// has no `Into<Bytes>` conversion and goes through
/// [`DispatchData::copy_from_slice`] instead.
///
/// # Example
///
/// ```
/// use dispatchbuf::create_dispatch_data;
///
/// let data = create_dispatch_data(&b"ABC"[..]);
/// assert_eq!(data.len(), 3);
/// assert_eq!(data.to_vec(), vec![0x41, 0x42, 0x43]);
/// ```
pub fn create_dispatch_data(buffer: impl Into<Bytes>) -> DispatchData {
    DispatchData::from(buffer.into())
}

/// Returns the bytes of `data` as a single [`Bytes`].
///
/// For data created by [`create_dispatch_data`] (or any single-region data)
/// the result points at the very same memory; nothing is copied. Data made of
/// several regions, such as the output of concatenation or channel reads, is
/// joined into one buffer first.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use dispatchbuf::{bridge_dispatch_data, create_dispatch_data};
///
/// let source = Bytes::from(vec![7u8; 32]);
/// let data = create_dispatch_data(source.clone());
/// let back = bridge_dispatch_data(&data);
///
/// assert_eq!(back, source);
/// assert_eq!(back.as_ptr(), source.as_ptr());
/// ```
#[cfg(feature = "object-bridge")]
pub fn bridge_dispatch_data(data: &DispatchData) -> Bytes {
    data.to_contiguous()
}

#[cfg(feature = "object-bridge")]
impl From<DispatchData> for Bytes {
    fn from(data: DispatchData) -> Self {
        bridge_dispatch_data(&data)
    }
}
