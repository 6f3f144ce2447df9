//! Async streaming support for channel reads.
//!
//! - [`read_async`] - Creates a stream of dispatch data from an async reader
//! - [`DataStream`] - The stream itself
//!
//! This module requires the `async-io` feature to be enabled.

mod stream;

pub use stream::{DataStream, read_async};
