//! Async stream adapter for channel reads.
//!
//! This module provides asynchronous reading using the `futures-io::AsyncRead`
//! trait, making it runtime-agnostic and compatible with tokio, async-std,
//! smol, and other async runtimes.

use std::io::ErrorKind;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::BytesMut;
use futures_core::Stream;
use futures_io::AsyncRead;
use pin_project_lite::pin_project;

use crate::config::{ChannelConfig, DEFAULT_READ_SIZE};
use crate::data::DispatchData;
use crate::error::DispatchError;
use crate::io::CancelToken;

pin_project! {
    /// A stream that yields one [`DispatchData`] region per read from an
    /// async reader.
    ///
    /// The stream ends at end of input, once `max_length` bytes have been
    /// produced, or after the first error.
    pub struct DataStream<R> {
        #[pin]
        reader: R,
        buffer: BytesMut,
        read_size: usize,
        remaining: usize,
        cancel: CancelToken,
        finished: bool,
    }
}

impl<R> DataStream<R> {
    /// Creates a new stream from an async reader.
    ///
    /// Returns [`DispatchError::InvalidConfig`] if `config` does not pass
    /// [`ChannelConfig::validate`].
    pub fn new(reader: R, config: ChannelConfig) -> Result<Self, DispatchError> {
        config.validate()?;
        Ok(Self {
            reader,
            buffer: BytesMut::new(),
            read_size: config.read_size(),
            remaining: config.max_length(),
            cancel: CancelToken::new(),
            finished: false,
        })
    }

    /// Returns a token that cancels this stream.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}

impl<R: AsyncRead> Stream for DataStream<R> {
    type Item = Result<DispatchData, DispatchError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.finished || *this.remaining == 0 {
            return Poll::Ready(None);
        }

        if this.cancel.is_cancelled() {
            *this.finished = true;
            return Poll::Ready(Some(Err(DispatchError::UserCancelled)));
        }

        let len = (*this.read_size).min(*this.remaining);
        if this.buffer.len() < len {
            // Later reads land behind this one in the same block
            if this.buffer.capacity() < len {
                this.buffer.reserve(len.max(DEFAULT_READ_SIZE));
            }
            this.buffer.resize(len, 0);
        }
        loop {
            match this.reader.as_mut().poll_read(cx, &mut this.buffer[..len]) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Err(e)) if e.kind() == ErrorKind::Interrupted => continue,
                Poll::Ready(Err(e)) => {
                    *this.finished = true;
                    return Poll::Ready(Some(Err(DispatchError::Io(e))));
                }
                Poll::Ready(Ok(0)) => {
                    *this.finished = true;
                    return Poll::Ready(None);
                }
                Poll::Ready(Ok(n)) => {
                    tracing::trace!(bytes = n, "async channel read");
                    *this.remaining -= n;
                    let region = this.buffer.split_to(n).freeze();
                    return Poll::Ready(Some(Ok(DispatchData::from(region))));
                }
            }
        }
    }
}

/// Creates a stream of dispatch data from an async reader.
///
/// Uses `futures_io::AsyncRead` for runtime-agnostic async I/O.
/// For tokio readers, wrap them with `tokio_util::compat`:
///
/// ```ignore
/// use tokio_util::compat::TokioAsyncReadCompatExt;
/// use dispatchbuf::{read_async, ChannelConfig};
///
/// let file = tokio::fs::File::open("file").await?;
/// let stream = read_async(file.compat(), ChannelConfig::default())?;
/// ```
///
/// Collecting the stream into one [`DispatchData`] keeps every read as its
/// own region:
///
/// ```ignore
/// use futures_util::TryStreamExt;
///
/// let parts: Vec<DispatchData> = read_async(reader, config)?.try_collect().await?;
/// let data: DispatchData = parts.into_iter().collect();
/// ```
pub fn read_async<R: AsyncRead>(
    reader: R,
    config: ChannelConfig,
) -> Result<DataStream<R>, DispatchError> {
    DataStream::new(reader, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{StreamExt, TryStreamExt};

    #[tokio::test]
    async fn test_stream_empty() {
        let reader: &[u8] = &[];
        let stream = read_async(reader, ChannelConfig::default()).unwrap();
        let items: Vec<_> = stream.collect().await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_stream_regions() {
        let data: Vec<u8> = (0..100).map(|i| i as u8).collect();
        let reader: &[u8] = &data;
        let config = ChannelConfig::new(32, usize::MAX).unwrap();

        let stream = read_async(reader, config).unwrap();
        let parts: Vec<DispatchData> = stream.try_collect().await.unwrap();
        let lens: Vec<usize> = parts.iter().map(DispatchData::len).collect();
        assert_eq!(lens, vec![32, 32, 32, 4]);

        let joined: DispatchData = parts.into_iter().collect();
        assert_eq!(joined, data);
    }

    #[tokio::test]
    async fn test_stream_max_length() {
        let data = vec![0xAAu8; 100];
        let reader: &[u8] = &data;
        let config = ChannelConfig::new(16, 40).unwrap();

        let stream = read_async(reader, config).unwrap();
        let parts: Vec<DispatchData> = stream.try_collect().await.unwrap();
        let total: usize = parts.iter().map(DispatchData::len).sum();
        assert_eq!(total, 40);
    }

    #[tokio::test]
    async fn test_stream_cancelled() {
        let reader: &[u8] = b"never read";
        let mut stream = read_async(reader, ChannelConfig::default()).unwrap();
        stream.cancel_token().cancel();

        assert!(matches!(
            stream.next().await,
            Some(Err(DispatchError::UserCancelled))
        ));
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let reader: &[u8] = b"data";
        for config in [
            ChannelConfig::default().with_read_size(0),
            ChannelConfig::default().with_read_size(usize::MAX),
        ] {
            assert!(matches!(
                read_async(reader, config),
                Err(DispatchError::InvalidConfig { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_stream_regions_share_buffer() {
        let reader: &[u8] = b"abcdef";
        let config = ChannelConfig::new(3, usize::MAX).unwrap();

        let stream = read_async(reader, config).unwrap();
        let parts: Vec<DispatchData> = stream.try_collect().await.unwrap();
        let first = parts[0].regions().next().unwrap().as_ptr();
        let second = parts[1].regions().next().unwrap().as_ptr();
        assert_eq!(second, first.wrapping_add(3));
    }
}
