//! Error types for dispatchbuf.

use std::fmt;

/// Errors that can occur while reading into dispatch data or managing
/// thread-local keys.
///
/// The buffer bridge itself never fails; every variant here comes from a
/// channel read, a configuration check, or the native key table.
#[derive(Debug)]
pub enum DispatchError {
    /// An I/O error occurred while reading from the underlying source.
    Io(std::io::Error),

    /// A read was attempted on a channel that has already been closed.
    Closed,

    /// The read was cancelled through a [`CancelToken`](crate::CancelToken).
    UserCancelled,

    /// The source ended before the requested number of bytes arrived.
    PartialData {
        /// The number of bytes requested.
        expected: usize,
        /// The number of bytes actually read.
        actual: usize,
    },

    /// The native thread-local key could not be allocated.
    KeyCreation {
        /// The platform error code (`EAGAIN` when the slot table is full).
        code: i32,
    },

    /// A value could not be associated with a thread-local key.
    KeyAssignment {
        /// The platform error code.
        code: i32,
    },

    /// Invalid configuration parameter.
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Io(e) => write!(f, "io error: {}", e),
            DispatchError::Closed => write!(f, "channel is closed"),
            DispatchError::UserCancelled => write!(f, "read cancelled"),
            DispatchError::PartialData { expected, actual } => {
                write!(f, "partial data: read {} of {} bytes", actual, expected)
            }
            DispatchError::KeyCreation { code } => {
                write!(f, "cannot create thread-local key (error {})", code)
            }
            DispatchError::KeyAssignment { code } => {
                write!(f, "cannot set thread-local value (error {})", code)
            }
            DispatchError::InvalidConfig { message } => {
                write!(f, "invalid config: {}", message)
            }
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DispatchError {
    fn from(e: std::io::Error) -> Self {
        DispatchError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: DispatchError = io_err.into();
        assert!(matches!(err, DispatchError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_display() {
        let err = DispatchError::PartialData {
            expected: 100,
            actual: 50,
        };
        assert_eq!(err.to_string(), "partial data: read 50 of 100 bytes");

        let err = DispatchError::KeyCreation { code: 11 };
        assert!(err.to_string().contains("thread-local key"));
    }

    #[test]
    fn test_no_source_for_non_io() {
        assert!(std::error::Error::source(&DispatchError::Closed).is_none());
    }
}
