//! Parser Builder Module
//!
//! Fluent configuration surface and the `Parser` facade. Mirrors the usual
//! two-step shape: a `ParserBuilder` collects options and validates them,
//! `build()` hands back an immutable `Parser` that can be reused across
//! files and threads.
//!
//! # Example
//!
//! ```
//! use pedsheet::{ParserBuilder, HeaderVariant, NumberFormat};
//!
//! let parser = ParserBuilder::new()
//!     .with_header_variant(HeaderVariant::WithCustomer)
//!     .with_number_format(NumberFormat::CommaDecimal)
//!     .verbose(true)
//!     .build()
//!     .unwrap();
//! # let _ = parser;
//! ```

use std::io::{Read, Seek};
use std::path::Path;

use chrono::Utc;
use rayon::prelude::*;

use crate::aggregate;
use crate::api::{HeaderVariant, NumberFormat};
use crate::audit::AuditLog;
use crate::error::ParseError;
use crate::grid::RawGrid;
use crate::header::{self, HeaderMap};
use crate::loader;
use crate::segmenter::Segmenter;
use crate::types::ParseOutput;

/// Resolved configuration shared by all parsing stages.
#[derive(Debug, Clone)]
pub(crate) struct ParserConfig {
    /// Rows skipped before header discovery begins.
    pub(crate) banner_rows: usize,
    /// How many rows past the banner are searched for the reference header.
    pub(crate) header_window: usize,
    /// Cell texts that identify the reference header row.
    pub(crate) required_tokens: Vec<String>,
    /// First-cell tokens that mark an order data row.
    pub(crate) order_type_tokens: Vec<String>,
    /// Lowercase prefix of embedded summary rows inside item ranges.
    pub(crate) totals_marker: String,
    pub(crate) number_format: NumberFormat,
    pub(crate) verbose: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            banner_rows: 3,
            header_window: 30,
            required_tokens: HeaderVariant::Standard.tokens(),
            order_type_tokens: vec!["PED".to_string(), "ACU".to_string(), "DEV".to_string()],
            totals_marker: "totais de".to_string(),
            number_format: NumberFormat::Auto,
            verbose: false,
        }
    }
}

/// Builder for [`Parser`].
#[derive(Debug, Clone, Default)]
pub struct ParserBuilder {
    config: ParserConfig,
}

impl ParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose which reference-header layout to look for.
    pub fn with_header_variant(mut self, variant: HeaderVariant) -> Self {
        self.config.required_tokens = variant.tokens();
        self
    }

    /// Replace the order-type tokens (`PED`, `ACU`, `DEV` by default).
    /// Matching is case insensitive against the trimmed first cell.
    pub fn with_order_type_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.order_type_tokens = tokens
            .into_iter()
            .map(|t| t.into().trim().to_uppercase())
            .collect();
        self
    }

    /// Number of leading banner rows to skip (default 3).
    pub fn with_banner_rows(mut self, rows: usize) -> Self {
        self.config.banner_rows = rows;
        self
    }

    /// How far past the banner to search for the reference header
    /// (default 30 rows).
    pub fn with_header_window(mut self, window: usize) -> Self {
        self.config.header_window = window;
        self
    }

    pub fn with_number_format(mut self, format: NumberFormat) -> Self {
        self.config.number_format = format;
        self
    }

    /// When enabled, per-cell coercion fallbacks are recorded in the audit
    /// log instead of being silently absorbed.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Validate the configuration and produce a [`Parser`].
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Config`] when fewer than two header tokens are
    /// configured or the order-type token list is empty.
    pub fn build(self) -> Result<Parser, ParseError> {
        if self.config.required_tokens.len() < 2 {
            return Err(ParseError::Config(
                "at least two header tokens are required".to_string(),
            ));
        }
        if self.config.order_type_tokens.is_empty() {
            return Err(ParseError::Config(
                "order-type token list must not be empty".to_string(),
            ));
        }
        Ok(Parser {
            config: self.config,
        })
    }
}

/// Reusable, thread-safe parser for order-sheet exports.
#[derive(Debug, Clone)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Parse an already-materialized grid.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::HeaderNotFound`] when no reference header row
    /// exists inside the configured search window. All other irregularities
    /// degrade into audit-log events.
    pub fn parse(&self, grid: &RawGrid) -> Result<ParseOutput, ParseError> {
        let mut log = AuditLog::new(self.config.verbose);
        log.info(format!("parsing grid with {} rows", grid.len()));

        let header_row = header::find_reference_header(grid, &self.config)?;
        log.info_at("reference header located", header_row);
        let reference = HeaderMap::from_row(grid.row(header_row));

        let segmenter = Segmenter::new(grid, &reference, &self.config, &mut log);
        let (orders, store) = segmenter.run();
        let (orders, items, totals) = aggregate::finalize(orders, store);

        log.info(format!(
            "extracted {} orders, {} items, {} totals",
            orders.len(),
            items.len(),
            totals.len()
        ));
        tracing::info!(
            orders = orders.len(),
            items = items.len(),
            totals = totals.len(),
            "extraction finished"
        );

        Ok(ParseOutput {
            orders,
            items,
            totals,
            log,
            extracted_at: Utc::now(),
        })
    }

    /// Load a workbook from any `Read + Seek` source and parse it.
    pub fn parse_reader<R: Read + Seek + Clone>(
        &self,
        reader: R,
        filename: &str,
    ) -> Result<ParseOutput, ParseError> {
        let grid = loader::load_grid(reader, filename)?;
        self.parse(&grid)
    }

    /// Parse an in-memory workbook. `filename` is only used to pick the
    /// decoder by extension.
    pub fn parse_bytes(&self, bytes: &[u8], filename: &str) -> Result<ParseOutput, ParseError> {
        self.parse_reader(std::io::Cursor::new(bytes), filename)
    }

    /// Open and parse a workbook file from disk.
    pub fn parse_path(&self, path: impl AsRef<Path>) -> Result<ParseOutput, ParseError> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = std::fs::read(path)?;
        self.parse_bytes(&bytes, &filename)
    }

    /// Parse many grids in parallel. Results keep input order; each grid
    /// succeeds or fails independently.
    pub fn parse_many(&self, grids: &[RawGrid]) -> Vec<Result<ParseOutput, ParseError>> {
        grids.par_iter().map(|grid| self.parse(grid)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HeaderVariant;

    #[test]
    fn test_default_build_succeeds() {
        let parser = ParserBuilder::new().build().unwrap();
        assert_eq!(parser.config.banner_rows, 3);
        assert_eq!(parser.config.header_window, 30);
        assert_eq!(parser.config.required_tokens, vec!["Tipo", "Id", "Vendedor"]);
    }

    #[test]
    fn test_custom_variant_too_short_rejected() {
        let err = ParserBuilder::new()
            .with_header_variant(HeaderVariant::Custom(vec!["Id".to_string()]))
            .build()
            .unwrap_err();
        assert!(matches!(err, ParseError::Config(_)));
    }

    #[test]
    fn test_empty_order_type_tokens_rejected() {
        let err = ParserBuilder::new()
            .with_order_type_tokens(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, ParseError::Config(_)));
    }

    #[test]
    fn test_order_type_tokens_normalized() {
        let parser = ParserBuilder::new()
            .with_order_type_tokens(["ped", " orc "])
            .build()
            .unwrap();
        assert_eq!(parser.config.order_type_tokens, vec!["PED", "ORC"]);
    }

    #[test]
    fn test_header_not_found_outside_window() {
        let mut rows = vec![vec!["".to_string()]; 10];
        rows.push(vec![
            "Tipo".to_string(),
            "Id".to_string(),
            "Vendedor".to_string(),
        ]);
        let grid = RawGrid::new(rows);

        let parser = ParserBuilder::new().with_header_window(5).build().unwrap();
        let err = parser.parse(&grid).unwrap_err();
        assert!(matches!(err, ParseError::HeaderNotFound { window: 5, .. }));
    }

    #[test]
    fn test_parse_many_mixed_results() {
        let good = RawGrid::from_rows(vec![
            vec![""],
            vec![""],
            vec![""],
            vec!["Tipo", "Id", "Vendedor"],
            vec!["PED", "1", "Ana"],
        ]);
        let bad = RawGrid::from_rows(vec![vec!["no header here"]]);

        let parser = ParserBuilder::new().build().unwrap();
        let results = parser.parse_many(&[good, bad]);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
