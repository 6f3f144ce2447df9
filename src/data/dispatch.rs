//! The DispatchData type - an immutable buffer made of shared regions.

use std::fmt;
use std::ops::{Add, AddAssign, Range, RangeBounds};
use std::sync::{Arc, LazyLock};

use bytes::{Bytes, BytesMut};

use super::iter::{Cursor, Iter, Regions};
use crate::util::{clamp_range, coalesce};

/// An immutable, reference-counted buffer of bytes.
///
/// `DispatchData` is an ordered list of [`Bytes`] regions. Cloning it, slicing
/// it and concatenating two of them only touch reference counts; the bytes
/// themselves are never copied or mutated. Regions are never empty, and the
/// total length is cached.
///
/// # Example
///
/// ```
/// use dispatchbuf::DispatchData;
///
/// let mut data = DispatchData::from_static(b"hello ");
/// data += DispatchData::from_static(b"world");
///
/// assert_eq!(data.len(), 11);
/// assert_eq!(data.region_count(), 2);
/// assert_eq!(data.slice(6..), b"world"[..]);
/// ```
// Every empty handle shares this region list.
static EMPTY_REGIONS: LazyLock<Arc<[Bytes]>> = LazyLock::new(|| Arc::from(Vec::new()));

#[derive(Clone)]
pub struct DispatchData {
    regions: Arc<[Bytes]>,
    len: usize,
}

impl DispatchData {
    /// Returns the shared empty `DispatchData`.
    ///
    /// Every empty handle, however it was produced, points at the same
    /// region list, so creating one never allocates.
    pub fn new() -> Self {
        Self {
            regions: Arc::clone(&*EMPTY_REGIONS),
            len: 0,
        }
    }

    /// Wraps static memory without copying.
    pub fn from_static(bytes: &'static [u8]) -> Self {
        Self::from(Bytes::from_static(bytes))
    }

    /// Creates a `DispatchData` holding a copy of `data`.
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self::from(Bytes::copy_from_slice(data))
    }

    /// Wraps memory owned by `owner` without copying.
    ///
    /// The owner is dropped once the last handle aliasing its bytes goes
    /// away, which makes this the hook for custom release behaviour (unmapping
    /// a file, returning a buffer to a pool, ...).
    pub fn from_owner<T>(owner: T) -> Self
    where
        T: AsRef<[u8]> + Send + 'static,
    {
        Self::from(Bytes::from_owner(owner))
    }

    /// Returns the total number of bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if there are no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of non-empty regions backing this data.
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Returns an iterator over the backing regions, in order.
    pub fn regions(&self) -> Regions<'_> {
        Regions::new(&self.regions)
    }

    /// Returns an iterator over every byte.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(&self.regions)
    }

    /// Returns a [`bytes::Buf`] cursor positioned at the first byte.
    ///
    /// Use [`bytes::Buf::reader`] on the cursor for a [`std::io::Read`].
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.clone())
    }

    /// Visits each region together with its absolute byte range.
    ///
    /// Stops at the first region for which `f` returns `Some` and returns that
    /// value; returns `None` if every region was visited.
    ///
    /// ```
    /// use dispatchbuf::DispatchData;
    ///
    /// let data = DispatchData::from_static(b"ab") + DispatchData::from_static(b"cd");
    /// let start = data.apply(|range, region| (region[0] == b'c').then_some(range.start));
    /// assert_eq!(start, Some(2));
    /// ```
    pub fn apply<T, F>(&self, mut f: F) -> Option<T>
    where
        F: FnMut(Range<usize>, &Bytes) -> Option<T>,
    {
        let mut offset = 0;
        for region in self.regions.iter() {
            let end = offset + region.len();
            if let Some(value) = f(offset..end, region) {
                return Some(value);
            }
            offset = end;
        }
        None
    }

    /// Returns the region containing byte `index` and that region's range.
    pub fn region(&self, index: usize) -> Option<(DispatchData, Range<usize>)> {
        self.apply(|range, region| {
            if range.contains(&index) {
                Some((DispatchData::from(region.clone()), range))
            } else {
                None
            }
        })
    }

    /// Returns the byte at `index`.
    pub fn get(&self, index: usize) -> Option<u8> {
        self.apply(|range, region| {
            if range.contains(&index) {
                Some(region[index - range.start])
            } else {
                None
            }
        })
    }

    /// Returns the bytes in `range` without copying.
    ///
    /// The range is clamped to the data: bounds past the end are cut short
    /// and an inverted range yields empty data. This never panics.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> DispatchData {
        let wanted = clamp_range(range, self.len);
        if wanted.is_empty() {
            return DispatchData::new();
        }
        if wanted == (0..self.len) {
            return self.clone();
        }

        let mut regions = Vec::new();
        let mut offset = 0;
        for region in self.regions.iter() {
            let end = offset + region.len();
            if end > wanted.start && offset < wanted.end {
                let from = wanted.start.max(offset) - offset;
                let to = wanted.end.min(end) - offset;
                regions.push(region.slice(from..to));
            }
            if end >= wanted.end {
                break;
            }
            offset = end;
        }
        Self::from_regions(regions)
    }

    /// Runs `f` over a contiguous view of the bytes in `range`.
    ///
    /// Returns `None` if `range` is not entirely inside the data. A range that
    /// falls within one region is viewed in place; otherwise its bytes are
    /// joined first.
    pub fn map_subrange<R, F>(&self, range: Range<usize>, f: F) -> Option<R>
    where
        F: FnOnce(&[u8]) -> R,
    {
        if range.start > range.end || range.end > self.len {
            return None;
        }
        let contiguous = self.slice(range).to_contiguous();
        Some(f(&contiguous))
    }

    /// Returns all bytes as a single [`Bytes`].
    ///
    /// Data with at most one region is returned without copying.
    pub fn to_contiguous(&self) -> Bytes {
        coalesce(&self.regions, self.len)
    }

    /// Copies all bytes into a new `Vec`.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for region in self.regions.iter() {
            out.extend_from_slice(region);
        }
        out
    }

    /// Returns the concatenation of `self` and `other`.
    pub fn concat(&self, other: &DispatchData) -> DispatchData {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let regions: Vec<Bytes> = self
            .regions
            .iter()
            .chain(other.regions.iter())
            .cloned()
            .collect();
        Self {
            regions: Arc::from(regions),
            len: self.len + other.len,
        }
    }

    /// Appends `other` to the end of `self`.
    pub fn append(&mut self, other: &DispatchData) {
        *self = self.concat(other);
    }

    pub(crate) fn region_slice(&self) -> &[Bytes] {
        &self.regions
    }

    fn from_regions(regions: Vec<Bytes>) -> Self {
        let regions: Vec<Bytes> = regions.into_iter().filter(|r| !r.is_empty()).collect();
        if regions.is_empty() {
            return Self::new();
        }
        let len = regions.iter().map(Bytes::len).sum();
        Self {
            regions: Arc::from(regions),
            len,
        }
    }
}

impl Default for DispatchData {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Bytes> for DispatchData {
    fn from(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            return Self::new();
        }
        let len = bytes.len();
        Self {
            regions: Arc::from(vec![bytes]),
            len,
        }
    }
}

impl From<BytesMut> for DispatchData {
    fn from(bytes: BytesMut) -> Self {
        Self::from(bytes.freeze())
    }
}

impl From<Vec<u8>> for DispatchData {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for DispatchData {
    fn from(bytes: &'static [u8]) -> Self {
        Self::from_static(bytes)
    }
}

impl From<&'static str> for DispatchData {
    fn from(s: &'static str) -> Self {
        Self::from_static(s.as_bytes())
    }
}

impl From<String> for DispatchData {
    fn from(s: String) -> Self {
        Self::from(Bytes::from(s))
    }
}

impl FromIterator<Bytes> for DispatchData {
    fn from_iter<I: IntoIterator<Item = Bytes>>(iter: I) -> Self {
        Self::from_regions(iter.into_iter().collect())
    }
}

impl FromIterator<DispatchData> for DispatchData {
    fn from_iter<I: IntoIterator<Item = DispatchData>>(iter: I) -> Self {
        iter.into_iter()
            .flat_map(|data| data.regions.to_vec())
            .collect()
    }
}

impl Extend<Bytes> for DispatchData {
    fn extend<I: IntoIterator<Item = Bytes>>(&mut self, iter: I) {
        let regions: Vec<Bytes> = self.regions.iter().cloned().chain(iter).collect();
        *self = Self::from_regions(regions);
    }
}

impl<'a> IntoIterator for &'a DispatchData {
    type Item = u8;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for DispatchData {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.regions, &other.regions) {
            return true;
        }
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for DispatchData {}

impl PartialEq<[u8]> for DispatchData {
    fn eq(&self, other: &[u8]) -> bool {
        self.len == other.len() && self.iter().eq(other.iter().copied())
    }
}

impl PartialEq<Vec<u8>> for DispatchData {
    fn eq(&self, other: &Vec<u8>) -> bool {
        *self == other[..]
    }
}

impl PartialEq<Bytes> for DispatchData {
    fn eq(&self, other: &Bytes) -> bool {
        *self == other[..]
    }
}

impl Add for DispatchData {
    type Output = DispatchData;

    fn add(self, rhs: DispatchData) -> DispatchData {
        self.concat(&rhs)
    }
}

impl AddAssign for DispatchData {
    fn add_assign(&mut self, rhs: DispatchData) {
        self.append(&rhs);
    }
}

impl AddAssign<&DispatchData> for DispatchData {
    fn add_assign(&mut self, rhs: &DispatchData) {
        self.append(rhs);
    }
}

impl fmt::Debug for DispatchData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchData")
            .field("len", &self.len)
            .field("regions", &self.regions.len())
            .finish()
    }
}
