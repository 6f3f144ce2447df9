//! Iterators and cursors over dispatch data.

use std::iter::FusedIterator;
use std::slice;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::DispatchData;

/// Iterator over the regions of a [`DispatchData`].
///
/// Created by [`DispatchData::regions`].
#[derive(Debug, Clone)]
pub struct Regions<'a> {
    inner: slice::Iter<'a, Bytes>,
}

impl<'a> Regions<'a> {
    pub(super) fn new(regions: &'a [Bytes]) -> Self {
        Self {
            inner: regions.iter(),
        }
    }
}

impl<'a> Iterator for Regions<'a> {
    type Item = &'a Bytes;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Regions<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl ExactSizeIterator for Regions<'_> {}

impl FusedIterator for Regions<'_> {}

/// Byte iterator across every region of a [`DispatchData`].
///
/// Created by [`DispatchData::iter`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    regions: slice::Iter<'a, Bytes>,
    current: slice::Iter<'a, u8>,
}

impl<'a> Iter<'a> {
    pub(super) fn new(regions: &'a [Bytes]) -> Self {
        Self {
            regions: regions.iter(),
            current: Default::default(),
        }
    }
}

impl Iterator for Iter<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        loop {
            if let Some(&byte) = self.current.next() {
                return Some(byte);
            }
            self.current = self.regions.next()?.iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest: usize = self.regions.as_slice().iter().map(Bytes::len).sum();
        let remaining = self.current.len() + rest;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

/// A [`Buf`] that reads a [`DispatchData`] front to back.
///
/// Each call to [`Buf::chunk`] exposes the rest of the current region, so
/// consumers see the region boundaries without any copying.
///
/// # Example
///
/// ```
/// use bytes::Buf;
/// use dispatchbuf::DispatchData;
///
/// let data = DispatchData::from_static(b"\x00\x2a") + DispatchData::from_static(b"tail");
/// let mut cursor = data.cursor();
///
/// assert_eq!(cursor.get_u16(), 42);
/// assert_eq!(cursor.remaining(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct Cursor {
    data: DispatchData,
    index: usize,
    offset: usize,
    remaining: usize,
}

impl Cursor {
    pub(super) fn new(data: DispatchData) -> Self {
        let remaining = data.len();
        Self {
            data,
            index: 0,
            offset: 0,
            remaining,
        }
    }

    /// Returns the data that has not been consumed yet.
    pub fn rest(&self) -> DispatchData {
        let start = self.data.len() - self.remaining;
        self.data.slice(start..)
    }
}

impl Buf for Cursor {
    fn remaining(&self) -> usize {
        self.remaining
    }

    fn chunk(&self) -> &[u8] {
        match self.data.region_slice().get(self.index) {
            Some(region) => &region[self.offset..],
            None => &[],
        }
    }

    fn advance(&mut self, mut cnt: usize) {
        assert!(
            cnt <= self.remaining,
            "cannot advance past the end of the data: {} > {}",
            cnt,
            self.remaining
        );
        self.remaining -= cnt;

        let regions = self.data.region_slice();
        while cnt > 0 {
            let available = regions[self.index].len() - self.offset;
            if cnt < available {
                self.offset += cnt;
                return;
            }
            cnt -= available;
            self.index += 1;
            self.offset = 0;
        }
    }

    fn copy_to_bytes(&mut self, len: usize) -> Bytes {
        assert!(
            len <= self.remaining,
            "cannot copy past the end of the data: {} > {}",
            len,
            self.remaining
        );

        if let Some(region) = self.data.region_slice().get(self.index) {
            if self.offset + len <= region.len() {
                let out = region.slice(self.offset..self.offset + len);
                self.advance(len);
                return out;
            }
        }

        let mut out = BytesMut::with_capacity(len);
        out.put((&mut *self).take(len));
        out.freeze()
    }
}
