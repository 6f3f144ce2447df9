//! Channel reading from a synchronous source.

use std::io::{ErrorKind, Read};

use bytes::Bytes;

use super::{CancelToken, PipeSource};
use crate::buffer::Buffer;
use crate::config::ChannelConfig;
use crate::data::DispatchData;
use crate::error::DispatchError;

/// Reads a [`std::io::Read`] source into [`DispatchData`].
///
/// Each successful read lands in a pooled scratch buffer and is frozen in
/// place into one region, at most [`ChannelConfig::read_size`] bytes long.
/// The channel owns the reader and drops it on
/// [`close`](PipeSource::close), which closes file descriptors the reader
/// owns.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use dispatchbuf::{ChannelConfig, IoChannel, PipeSource};
///
/// let config = ChannelConfig::new(4, usize::MAX)?;
/// let mut channel = IoChannel::with_config(Cursor::new(b"hello world".to_vec()), config)?;
///
/// let head = channel.read(5)?;
/// assert_eq!(head, b"hello"[..]);
/// assert_eq!(head.region_count(), 2);
///
/// let rest = channel.read_until_end()?;
/// assert_eq!(rest, b" world"[..]);
/// # Ok::<(), dispatchbuf::DispatchError>(())
/// ```
pub struct IoChannel<R> {
    reader: Option<R>,
    config: ChannelConfig,
    cancel: CancelToken,
    buffer: Buffer,
}

impl<R: Read> IoChannel<R> {
    /// Creates a channel with the default configuration.
    pub fn new(reader: R) -> Self {
        Self::open(reader, ChannelConfig::default())
    }

    /// Creates a channel with the given configuration.
    ///
    /// Returns [`DispatchError::InvalidConfig`] if `config` does not pass
    /// [`ChannelConfig::validate`].
    pub fn with_config(reader: R, config: ChannelConfig) -> Result<Self, DispatchError> {
        config.validate()?;
        Ok(Self::open(reader, config))
    }

    fn open(reader: R, config: ChannelConfig) -> Self {
        Self {
            reader: Some(reader),
            config,
            cancel: CancelToken::new(),
            buffer: Buffer::take(),
        }
    }

    /// Returns the configuration used by this channel.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Returns a token that cancels reads on this channel.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Returns true once the channel has been closed or cancelled.
    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }

    /// Reads exactly `length` bytes.
    ///
    /// Fails with [`DispatchError::PartialData`] if the source ends first;
    /// the bytes read so far are discarded.
    pub fn read_exact(&mut self, length: usize) -> Result<DispatchData, DispatchError> {
        let data = self.read(length)?;
        if data.len() < length {
            return Err(DispatchError::PartialData {
                expected: length,
                actual: data.len(),
            });
        }
        Ok(data)
    }

    /// Returns an iterator that yields each read of up to `length` total bytes
    /// as its own single-region [`DispatchData`].
    ///
    /// The iterator ends at end of stream, after `length` bytes, or after the
    /// first error.
    pub fn read_chunks(&mut self, length: usize) -> ReadChunks<'_, R> {
        ReadChunks {
            channel: self,
            remaining: length,
            done: false,
        }
    }

    /// Fails if the channel is closed, closing it first if it was cancelled.
    fn ensure_open(&mut self) -> Result<(), DispatchError> {
        if self.reader.is_none() {
            return Err(DispatchError::Closed);
        }
        if self.cancel.is_cancelled() {
            self.close();
            return Err(DispatchError::UserCancelled);
        }
        Ok(())
    }

    /// Performs one read of at most `limit` bytes. `None` means end of stream.
    fn read_region(&mut self, limit: usize) -> Result<Option<Bytes>, DispatchError> {
        self.ensure_open()?;

        let reader = self.reader.as_mut().ok_or(DispatchError::Closed)?;
        let len = limit.min(self.config.read_size());

        loop {
            match reader.read(self.buffer.window(len)) {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    tracing::trace!(bytes = n, "channel read");
                    return Ok(Some(self.buffer.freeze_front(n)));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(DispatchError::Io(e)),
            }
        }
    }
}

#[cfg(unix)]
impl IoChannel<std::fs::File> {
    /// Creates a channel that reads from `fd` and closes it when the channel
    /// is closed or dropped.
    pub fn from_fd(fd: std::os::fd::OwnedFd) -> Self {
        Self::new(std::fs::File::from(fd))
    }
}

impl<R: Read> PipeSource for IoChannel<R> {
    fn read(&mut self, length: usize) -> Result<DispatchData, DispatchError> {
        self.ensure_open()?;

        let mut regions = Vec::new();
        let mut total = 0;

        while total < length {
            match self.read_region(length - total)? {
                Some(region) => {
                    total += region.len();
                    regions.push(region);
                }
                None => break,
            }
        }

        Ok(regions.into_iter().collect())
    }

    fn read_until_end(&mut self) -> Result<DispatchData, DispatchError> {
        self.read(self.config.max_length())
    }

    fn close(&mut self) {
        if self.reader.take().is_some() {
            tracing::debug!("channel closed");
        }
    }
}

impl<R> std::fmt::Debug for IoChannel<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoChannel")
            .field("config", &self.config)
            .field("closed", &self.reader.is_none())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Iterator over the reads of an [`IoChannel`].
///
/// Created by [`IoChannel::read_chunks`].
pub struct ReadChunks<'a, R> {
    channel: &'a mut IoChannel<R>,
    remaining: usize,
    done: bool,
}

impl<R: Read> Iterator for ReadChunks<'_, R> {
    type Item = Result<DispatchData, DispatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Err(e) = self.channel.ensure_open() {
            self.done = true;
            return Some(Err(e));
        }
        if self.remaining == 0 {
            return None;
        }

        match self.channel.read_region(self.remaining) {
            Ok(Some(region)) => {
                self.remaining -= region.len();
                Some(Ok(DispatchData::from(region)))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};
    use tracing_test::traced_test;

    /// Reader that fails with `Interrupted` on every other call.
    struct Flaky {
        inner: Cursor<Vec<u8>>,
        interrupt: bool,
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::BrokenPipe, "gone"))
        }
    }

    fn small_config(read_size: usize) -> ChannelConfig {
        ChannelConfig::new(read_size, usize::MAX).unwrap()
    }

    fn small_channel(input: &[u8], read_size: usize) -> IoChannel<Cursor<Vec<u8>>> {
        IoChannel::with_config(Cursor::new(input.to_vec()), small_config(read_size)).unwrap()
    }

    #[test]
    fn test_read_splits_into_regions() {
        let mut channel = small_channel(&[7u8; 10], 4);
        let data = channel.read(10).unwrap();
        assert_eq!(data.len(), 10);
        assert_eq!(data.region_count(), 3);
    }

    #[test]
    fn test_read_stops_at_length() {
        let mut channel = small_channel(b"abcdefgh", 3);
        assert_eq!(channel.read(5).unwrap(), b"abcde"[..]);
        assert_eq!(channel.read(5).unwrap(), b"fgh"[..]);
        assert!(channel.read(5).unwrap().is_empty());
    }

    #[test]
    fn test_read_exact_partial() {
        let mut channel = IoChannel::new(Cursor::new(b"abc".to_vec()));
        match channel.read_exact(8) {
            Err(DispatchError::PartialData { expected, actual }) => {
                assert_eq!(expected, 8);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_read_exact_full() {
        let mut channel = IoChannel::new(Cursor::new(b"abcdef".to_vec()));
        assert_eq!(channel.read_exact(4).unwrap(), b"abcd"[..]);
    }

    #[test]
    fn test_interrupted_is_retried() {
        let reader = Flaky {
            inner: Cursor::new(b"retry".to_vec()),
            interrupt: false,
        };
        let mut channel = IoChannel::new(reader);
        assert_eq!(channel.read_until_end().unwrap(), b"retry"[..]);
    }

    #[test]
    fn test_io_error_surfaces() {
        let mut channel = IoChannel::new(Broken);
        assert!(matches!(channel.read(1), Err(DispatchError::Io(_))));
    }

    #[test]
    fn test_read_after_close() {
        let mut channel = IoChannel::new(Cursor::new(b"abc".to_vec()));
        channel.close();
        assert!(channel.is_closed());
        assert!(matches!(channel.read(1), Err(DispatchError::Closed)));
    }

    #[test]
    fn test_cancel_closes_channel() {
        let mut channel = IoChannel::new(Cursor::new(b"abc".to_vec()));
        channel.cancel_token().cancel();
        assert!(matches!(channel.read(1), Err(DispatchError::UserCancelled)));
        assert!(channel.is_closed());
    }

    #[test]
    fn test_read_chunks() {
        let mut channel = small_channel(b"abcdefg", 3);
        let chunks: Vec<DispatchData> = channel
            .read_chunks(usize::MAX)
            .collect::<Result<_, _>>()
            .unwrap();
        let lens: Vec<usize> = chunks.iter().map(DispatchData::len).collect();
        assert_eq!(lens, vec![3, 3, 1]);
    }

    #[test]
    fn test_read_chunks_stops_after_error() {
        let mut channel = IoChannel::new(Broken);
        let mut chunks = channel.read_chunks(10);
        assert!(matches!(chunks.next(), Some(Err(DispatchError::Io(_)))));
        assert!(chunks.next().is_none());
    }

    #[test]
    fn test_max_length_caps_read_until_end() {
        let config = ChannelConfig::new(4, 6).unwrap();
        let mut channel = IoChannel::with_config(Cursor::new(vec![1u8; 20]), config).unwrap();
        assert_eq!(channel.read_until_end().unwrap().len(), 6);
    }

    #[test]
    fn test_zero_read_size_rejected() {
        let config = ChannelConfig::default().with_read_size(0);
        let result = IoChannel::with_config(Cursor::new(b"123456789".to_vec()), config);
        assert!(matches!(result, Err(DispatchError::InvalidConfig { .. })));
    }

    #[test]
    fn test_oversized_read_size_rejected() {
        let config = ChannelConfig::default().with_read_size(usize::MAX);
        let result = IoChannel::with_config(Cursor::new(b"123456789".to_vec()), config);
        assert!(matches!(result, Err(DispatchError::InvalidConfig { .. })));
    }

    #[test]
    fn test_zero_max_length_rejected() {
        let config = ChannelConfig::default().with_max_length(0);
        assert!(IoChannel::with_config(Cursor::new(Vec::new()), config).is_err());
    }

    #[test]
    fn test_empty_read_after_close_fails() {
        let mut channel = IoChannel::new(Cursor::new(b"abc".to_vec()));
        channel.close();
        assert!(matches!(channel.read(0), Err(DispatchError::Closed)));
        assert!(matches!(channel.read_exact(0), Err(DispatchError::Closed)));
    }

    #[test]
    fn test_empty_read_after_cancel_closes() {
        let mut channel = IoChannel::new(Cursor::new(b"abc".to_vec()));
        channel.cancel_token().cancel();
        assert!(matches!(channel.read(0), Err(DispatchError::UserCancelled)));
        assert!(channel.is_closed());
        assert!(matches!(channel.read(0), Err(DispatchError::Closed)));
    }

    #[test]
    fn test_read_chunks_on_closed_channel() {
        let mut channel = IoChannel::new(Cursor::new(b"abc".to_vec()));
        channel.close();
        let mut chunks = channel.read_chunks(0);
        assert!(matches!(chunks.next(), Some(Err(DispatchError::Closed))));
        assert!(chunks.next().is_none());
    }

    #[test]
    fn test_regions_share_one_read_buffer() {
        let mut channel = small_channel(b"abcdef", 3);
        let data = channel.read(6).unwrap();
        let regions: Vec<&Bytes> = data.regions().collect();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[1].as_ptr(), regions[0].as_ptr().wrapping_add(3));
    }

    #[test]
    #[traced_test]
    fn test_close_logs() {
        let mut channel = IoChannel::new(Cursor::new(Vec::new()));
        channel.close();
        assert!(logs_contain("channel closed"));
    }
}
