//! Internal utility functions and helpers.
//!
//! This module contains small helper functions used throughout the crate.
//! It is an implementation detail and not part of the public API.

use std::ops::{Bound, Range, RangeBounds};

use bytes::{Bytes, BytesMut};

/// Joins a list of regions into a single contiguous `Bytes`.
///
/// A single region is returned as-is (shared, not copied); two or more are
/// copied once into a buffer of exactly `len` bytes.
pub(crate) fn coalesce(regions: &[Bytes], len: usize) -> Bytes {
    match regions {
        [] => Bytes::new(),
        [only] => only.clone(),
        _ => {
            let mut combined = BytesMut::with_capacity(len);
            for region in regions {
                combined.extend_from_slice(region);
            }
            combined.freeze()
        }
    }
}

/// Resolves `range` against a length of `len`, clamping both ends.
///
/// The result is always a valid (possibly empty) range inside `0..len`.
pub(crate) fn clamp_range(range: impl RangeBounds<usize>, len: usize) -> Range<usize> {
    let start = match range.start_bound() {
        Bound::Included(&n) => n,
        Bound::Excluded(&n) => n.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&n) => n.saturating_add(1),
        Bound::Excluded(&n) => n,
        Bound::Unbounded => len,
    };
    let end = end.min(len);
    start.min(end)..end
}
