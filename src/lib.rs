//! dispatchbuf
//!
//! Immutable, reference-counted byte buffers for handing data between tasks.
//!
//! `dispatchbuf` is a small set of leaf utilities:
//!
//! - a **buffer bridge** that turns an immutable [`bytes::Bytes`] into a
//!   [`DispatchData`] handle without copying, and (with the `object-bridge`
//!   feature) back again
//! - a region-based [`DispatchData`] type that slices and concatenates by
//!   reference counting alone
//! - channel reading that fills `DispatchData` from any [`std::io::Read`]
//!   (or `futures_io::AsyncRead` with the `async-io` feature)
//! - native **thread-local keys** and typed per-thread storage on top of them
//!
//! The crate intentionally:
//! - does NOT mutate bytes once they are wrapped
//! - does NOT schedule or spawn work
//! - does NOT implement its own thread-local mechanism
//!
//! # Buffer bridge
//!
//! ```
//! use bytes::Bytes;
//! use dispatchbuf::create_dispatch_data;
//!
//! let source = Bytes::from_static(b"ABC");
//! let data = create_dispatch_data(source.clone());
//!
//! assert_eq!(data.len(), 3);
//! assert_eq!(data, source);
//! # #[cfg(feature = "object-bridge")]
//! assert_eq!(dispatchbuf::bridge_dispatch_data(&data).as_ptr(), source.as_ptr());
//! ```
//!
//! # Thread-local keys
//!
//! ```
//! use dispatchbuf::ThreadLocalStorage;
//!
//! let counter = ThreadLocalStorage::new();
//! assert_eq!(*counter.get_or_init(|| 10u32), 10);
//!
//! std::thread::scope(|s| {
//!     s.spawn(|| assert_eq!(*counter.get_or_init(|| 20u32), 20));
//! });
//! assert_eq!(*counter.get_or_init(|| 0u32), 10);
//! ```
//!
//! # Channel reading
//!
//! ```no_run
//! use std::fs::File;
//! use dispatchbuf::{DispatchError, IoChannel, PipeSource};
//!
//! fn main() -> Result<(), DispatchError> {
//!     let mut channel = IoChannel::new(File::open("data.bin")?);
//!     let data = channel.read_until_end()?;
//!     println!("{} bytes in {} regions", data.len(), data.region_count());
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bridge;
mod config;
mod data;
mod error;
mod io;

mod buffer; // internal (thread-local scratch reuse)
mod util;

#[cfg(unix)]
#[allow(unsafe_code)]
mod tls;

#[cfg(feature = "async-io")]
mod async_stream;

//
// Public surface
//

#[cfg(feature = "object-bridge")]
pub use bridge::bridge_dispatch_data;
pub use bridge::{Ownership, create_dispatch_data};
pub use config::{ChannelConfig, DEFAULT_READ_SIZE, MAX_READ_SIZE, MAX_THREAD_KEYS};
pub use data::{Cursor, DispatchData, Iter, Regions};
pub use error::DispatchError;
pub use io::{CancelToken, IoChannel, PipeSource, ReadChunks};

#[cfg(unix)]
pub use tls::{ThreadLocalKey, ThreadLocalStorage, create_thread_local_key};

#[cfg(feature = "async-io")]
pub use async_stream::{DataStream, read_async};
