//! Dispatch data types.
//!
//! - [`DispatchData`] - Immutable, reference-counted list of byte regions
//! - [`Regions`] - Iterator over the regions of a `DispatchData`
//! - [`Iter`] - Byte iterator across all regions
//! - [`Cursor`] - [`bytes::Buf`] view that walks the regions in order

mod dispatch;
mod iter;

pub use dispatch::DispatchData;
pub use iter::{Cursor, Iter, Regions};
