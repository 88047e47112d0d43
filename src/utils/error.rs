use crate::zp::ZpError;
use std::io;
use thiserror::Error;

/// Main error type for the IW44 codec.
#[derive(Error, Debug)]
pub enum Iw44Error {
    /// The byte stream violates the chunk format (bad serial, foreign or newer version).
    #[error("Format error: {0}")]
    Format(String),
    /// Coefficient storage could not grow.
    #[error("Allocation error: {0}")]
    Allocation(String),
    /// The call cannot proceed as requested (e.g. no stopping criterion).
    #[error("Logic error: {0}")]
    Logic(String),
    /// An invalid argument was provided
    #[error("Invalid argument: {0}")]
    InvalidArg(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("ZP coder error: {0}")]
    Zp(#[from] ZpError),
}

/// A specialized `Result` type for IW44 operations.
pub type Result<T> = std::result::Result<T, Iw44Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            Iw44Error::Format("wrong serial".to_string()).to_string(),
            "Format error: wrong serial"
        );
        assert_eq!(
            Iw44Error::Logic("test".to_string()).to_string(),
            "Logic error: test"
        );
        assert_eq!(
            Iw44Error::InvalidArg("test".to_string()).to_string(),
            "Invalid argument: test"
        );
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        assert_eq!(Iw44Error::from(io_error).to_string(), "I/O error: file not found");
    }

    #[test]
    fn zp_errors_convert() {
        let err: Iw44Error = ZpError::Finished.into();
        assert!(matches!(err, Iw44Error::Zp(ZpError::Finished)));
    }
}
