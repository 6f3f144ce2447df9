//! Internal scratch buffer management for channel reads.
//!
//! This module provides a thread-local buffer pool so repeated reads on the
//! same thread do not reallocate their landing buffer. It is an
//! implementation detail and not part of the public API.

mod pool;

pub(crate) use pool::Buffer;
