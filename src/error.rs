//! Error Types Module
//!
//! Structured error type for the whole crate, built with `thiserror` so that
//! loader and serialization failures convert automatically via `?`.
//!
//! Only two kinds of failure abort a parse: the workbook cannot be loaded at
//! all, or the mandatory reference header row cannot be located
//! ([`ParseError::HeaderNotFound`]). Every other anomaly the parser meets is
//! recoverable and is folded into the audit log instead of raised.

use thiserror::Error;

/// Error type used across the pedsheet crate.
///
/// # Example
///
/// ```rust,no_run
/// use pedsheet::{ParseError, ParserBuilder};
///
/// fn parse_file(path: &str) -> Result<(), ParseError> {
///     let parser = ParserBuilder::new().build()?;
///     let output = parser.parse_path(path)?; // Io/Load errors convert automatically
///     println!("{} orders", output.orders.len());
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum ParseError {
    /// The reference header row could not be located.
    ///
    /// This is the only fatal error in normal operation: it means the
    /// document does not follow the banner + repeating-block convention at
    /// all. No partial output is produced.
    #[error(
        "reference header not found: expected a row containing {tokens:?} \
         within {window} rows after the banner"
    )]
    HeaderNotFound {
        /// Tokens the locator was searching for.
        tokens: Vec<String>,
        /// Number of rows searched after the banner.
        window: usize,
    },

    /// The workbook could not be read by calamine (corrupt file,
    /// unsupported format, broken archive).
    #[error("failed to load spreadsheet: {0}")]
    Load(#[from] calamine::Error),

    /// The workbook contains no sheets at all.
    #[error("workbook contains no sheets")]
    NoSheets,

    /// I/O error while reading the input file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid builder configuration detected at `build()` time.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization of a parse result failed.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_header_not_found_display() {
        let err = ParseError::HeaderNotFound {
            tokens: vec!["Tipo".to_string(), "Id".to_string()],
            window: 30,
        };
        let msg = err.to_string();
        assert!(msg.contains("reference header not found"));
        assert!(msg.contains("Tipo"));
        assert!(msg.contains("30"));
    }

    #[test]
    fn test_io_error_conversion() {
        fn io_operation() -> Result<(), ParseError> {
            let _file = std::fs::File::open("does_not_exist.ods")?;
            Ok(())
        }

        match io_operation() {
            Err(ParseError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            _ => panic!("Expected Io error from ? operator"),
        }
    }

    #[test]
    fn test_load_error_conversion() {
        let cal_err = calamine::Error::Msg("broken archive");
        let err: ParseError = cal_err.into();
        assert!(err.to_string().starts_with("failed to load spreadsheet"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ParseError::Config("at least two header tokens required".to_string());
        assert!(err.to_string().starts_with("configuration error"));
        assert!(err.to_string().contains("two header tokens"));
    }

    #[test]
    fn test_no_sheets_display() {
        assert_eq!(
            ParseError::NoSheets.to_string(),
            "workbook contains no sheets"
        );
    }
}
