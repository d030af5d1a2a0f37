/*!
    Error types for the rawmill media engine.
*/

use std::fmt;

/**
    Error type for the rawmill media engine.

    Open failures are only ever returned at construction — a decoder or
    encoder that fails to open never exists as a partial object. Invalid
    usage (wrong buffer size, operating on a closed handle, writing to a
    disabled stream) is detected before any FFmpeg call is made.
*/
#[derive(Debug)]
pub enum Error {
    /// I/O error (file not found, unreadable path, etc.)
    Io(std::io::Error),
    /// Failed to open a media file for decoding or encoding
    Open { message: String },
    /// Codec or container error during a decode/encode operation
    Codec { message: String },
    /// API misuse (closed handle, mismatched buffer size, disabled stream)
    InvalidUsage { message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Open { message } => write!(f, "open failed: {message}"),
            Self::Codec { message } => write!(f, "codec error: {message}"),
            Self::InvalidUsage { message } => write!(f, "invalid usage: {message}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl Error {
    /**
        Create an open error with the given message.
    */
    pub fn open(message: impl Into<String>) -> Self {
        Self::Open {
            message: message.into(),
        }
    }

    /**
        Create a codec error with the given message.
    */
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /**
        Create an invalid usage error with the given message.
    */
    pub fn invalid_usage(message: impl Into<String>) -> Self {
        Self::InvalidUsage {
            message: message.into(),
        }
    }

    /**
        Returns true if this is an invalid usage error.
    */
    pub fn is_invalid_usage(&self) -> bool {
        matches!(self, Self::InvalidUsage { .. })
    }
}

/**
    Result type alias for the rawmill media engine.
*/
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn error_display() {
        let e = Error::open("no usable streams");
        assert_eq!(format!("{e}"), "open failed: no usable streams");

        let e = Error::codec("decode failed");
        assert_eq!(format!("{e}"), "codec error: decode failed");

        let e = Error::invalid_usage("decoder is closed");
        assert_eq!(format!("{e}"), "invalid usage: decoder is closed");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(format!("{e}").contains("file not found"));
    }

    #[test]
    fn error_is_invalid_usage() {
        assert!(Error::invalid_usage("nope").is_invalid_usage());
        assert!(!Error::codec("nope").is_invalid_usage());
    }

    #[test]
    fn error_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let e = Error::Io(io_err);
        assert!(StdError::source(&e).is_some());

        let e = Error::open("test");
        assert!(StdError::source(&e).is_none());
    }
}
