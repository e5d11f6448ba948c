use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a single database value could not become a Rust value.
///
/// Produced by [`FromValue`](crate::FromValue) implementations. The binder
/// wraps it into [`Error::TypeConversion`] together with the column name and
/// the target type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("expected {expected}, got {actual}")]
    Mismatch { expected: &'static str, actual: String },

    #[error("unexpected null value for non-nullable target")]
    UnexpectedNull,

    #[error("value {value} is out of range for {target}")]
    OutOfRange { target: &'static str, value: String },

    #[error("{value:?} is not a variant of {target}")]
    UnknownVariant { target: &'static str, value: String },

    #[error("could not parse {value:?} as {target}")]
    Parse { target: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Connection error: {0}")]
    Connection(#[source] turso::Error),

    #[error("Command error: {0}")]
    Command(#[source] turso::Error),

    #[error("Type conversion error: column {column:?} into {target}: {source}")]
    TypeConversion { column: String, target: &'static str, source: ConversionError },

    #[error("Mapping mismatch for {target}: {reason}")]
    MappingMismatch { target: &'static str, reason: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    #[error("Runtime error: {0}")]
    Runtime(#[source] std::io::Error),

    #[cfg(feature = "with-json")]
    #[error("JSON error in column {column:?}: {source}")]
    JsonColumn { column: String, source: serde_json::Error },

    #[cfg(feature = "with-json")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn mismatch(target: &'static str, reason: impl Into<String>) -> Self {
        Error::MappingMismatch { target, reason: reason.into() }
    }

    /// True for errors raised by the driver rather than by the mapping layer.
    pub fn is_driver_error(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Command(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_type_conversion() {
        let err = Error::TypeConversion {
            column: "release_year".to_string(),
            target: "Rating",
            source: ConversionError::OutOfRange { target: "Rating", value: "2020".to_string() },
        };
        let display = err.to_string();
        assert!(display.contains("Type conversion error"));
        assert!(display.contains("release_year"));
        assert!(display.contains("Rating"));
        assert!(display.contains("2020"));
    }

    #[test]
    fn test_error_display_mapping_mismatch() {
        let err = Error::mismatch("(i64, String, bool)", "expected 3 columns, found 2");
        let display = err.to_string();
        assert!(display.contains("Mapping mismatch"));
        assert!(display.contains("expected 3 columns"));
    }

    #[test]
    fn test_error_display_cancelled() {
        assert_eq!(Error::Cancelled.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_error_display_timeout() {
        let display = Error::Timeout(Duration::from_secs(5)).to_string();
        assert!(display.contains("timed out"));
        assert!(display.contains("5s"));
    }

    #[test]
    fn test_conversion_error_display() {
        let err = ConversionError::Mismatch { expected: "Integer", actual: "Text(\"x\")".to_string() };
        assert_eq!(err.to_string(), "expected Integer, got Text(\"x\")");

        let err = ConversionError::UnknownVariant { target: "Genre", value: "Opera".to_string() };
        assert!(err.to_string().contains("\"Opera\""));
    }

    #[test]
    fn test_mapping_errors_are_not_driver_errors() {
        assert!(!Error::Cancelled.is_driver_error());
        assert!(!Error::mismatch("i64", "no columns").is_driver_error());
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(Error::Cancelled)
        }

        assert_eq!(returns_ok().unwrap(), 42);
        assert!(returns_err().is_err());
    }
}
