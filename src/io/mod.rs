//! Reading byte sources into [`DispatchData`](crate::DispatchData).
//!
//! - [`PipeSource`] - Anything that can be read into dispatch data and closed
//! - [`IoChannel`] - `PipeSource` over any [`std::io::Read`]
//! - [`ReadChunks`] - Iterator yielding one region per read
//! - [`CancelToken`] - Cancels reads on a channel from another thread
//!
//! Every successful read from the underlying source becomes one region of
//! the resulting data, so a read of 1 MiB with a 64 KiB read size produces
//! a 16-region `DispatchData` without ever joining the pieces.

mod cancel;
mod channel;

pub use cancel::CancelToken;
pub use channel::{IoChannel, ReadChunks};

use crate::data::DispatchData;
use crate::error::DispatchError;

/// A source of bytes that reads into [`DispatchData`].
pub trait PipeSource {
    /// Reads up to `length` bytes, stopping early at end of stream.
    ///
    /// Returns empty data if the stream is already exhausted.
    fn read(&mut self, length: usize) -> Result<DispatchData, DispatchError>;

    /// Reads until end of stream.
    fn read_until_end(&mut self) -> Result<DispatchData, DispatchError> {
        self.read(usize::MAX)
    }

    /// Closes the source. Reads after this fail with
    /// [`DispatchError::Closed`].
    fn close(&mut self);
}
