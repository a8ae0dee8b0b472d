//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from the
//! errors of the crates htmlgrid builds on to the unified Error type.

use super::types::Error;

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipError(err.to_string())
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Error::XmlError(format!("XML write error: {}", err))
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io(err.error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Error::Other(format!("Failed to build worker pool: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_failures_are_classified() {
        let io: Error = std::io::Error::other("disk full").into();
        assert!(io.is_sink_failure());
        assert!(Error::Sink("closed".to_string()).is_sink_failure());
        assert!(!Error::NoTablesFound.is_sink_failure());
        assert!(!Error::InvalidConfig("chunk_size".to_string()).is_sink_failure());
    }

    #[test]
    fn test_json_error_becomes_config_error() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        assert!(matches!(Error::from(err), Error::InvalidConfig(_)));
    }
}
