//! Thread-local pool of scratch read buffers.

use std::cell::RefCell;

use bytes::{Bytes, BytesMut};

use crate::config::DEFAULT_READ_SIZE;

/// Maximum number of buffers to keep per thread.
pub const MAX_POOL_SIZE: usize = 4;

/// A reusable scratch buffer that channel reads land in.
///
/// Bytes read into the front of the window are split off and frozen into a
/// region that shares this buffer's allocation, so nothing is copied out.
/// The rest of the window stays initialised and is reused by the next read.
pub struct Buffer {
    data: BytesMut,
}

impl Buffer {
    /// Takes a buffer from the thread-local pool or creates a new one.
    pub fn take() -> Self {
        THREAD_BUFFER_POOL.with(|pool| {
            let mut pool = pool.borrow_mut();
            if let Some(data) = pool.pop() {
                Self { data }
            } else {
                Self {
                    data: BytesMut::with_capacity(DEFAULT_READ_SIZE),
                }
            }
        })
    }

    /// Returns a window of exactly `len` initialised bytes to read into.
    ///
    /// Only bytes not already initialised by an earlier window are zeroed.
    pub fn window(&mut self, len: usize) -> &mut [u8] {
        if self.data.len() < len {
            self.data.resize(len, 0);
        }
        &mut self.data[..len]
    }

    /// Splits the first `n` bytes of the window off as an immutable region.
    pub fn freeze_front(&mut self, n: usize) -> Bytes {
        self.data.split_to(n).freeze()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        // Worn-down and oversized buffers are released rather than pooled
        let capacity = self.data.capacity();
        if (DEFAULT_READ_SIZE..=DEFAULT_READ_SIZE * 2).contains(&capacity) {
            THREAD_BUFFER_POOL.with(|pool| {
                let mut pool = pool.borrow_mut();
                if pool.len() < MAX_POOL_SIZE {
                    pool.push(std::mem::take(&mut self.data));
                }
            });
        }
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::take()
    }
}

thread_local! {
    static THREAD_BUFFER_POOL: RefCell<Vec<BytesMut>> = const { RefCell::new(Vec::new()) };
}
