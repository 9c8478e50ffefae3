//! pedsheet - Block-oriented parser for semi-structured order-sheet exports
//!
//! This crate turns ERP order spreadsheet exports, where each order occupies
//! a repeating block of rows (order data, a blank separator, an item table),
//! into three normalized datasets: orders, items, and per-order totals,
//! together with an audit log of every irregularity tolerated along the way.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pedsheet::ParserBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a parser with default settings
//!     let parser = ParserBuilder::new().build()?;
//!
//!     // Parse a workbook file from disk
//!     let output = parser.parse_path("orders.xlsx")?;
//!
//!     println!(
//!         "{} orders, {} items, {} totals",
//!         output.orders.len(),
//!         output.items.len(),
//!         output.totals.len()
//!     );
//!     for line in output.log.lines() {
//!         eprintln!("{}", line);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! For in-memory workbooks, use [`Parser::parse_bytes`]:
//!
//! ```rust,no_run
//! use pedsheet::ParserBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let parser = ParserBuilder::new().build()?;
//! let workbook: Vec<u8> = vec![]; // Your workbook bytes
//! let output = parser.parse_bytes(&workbook, "orders.xlsx")?;
//! let json = output.to_json()?;
//! # let _ = json;
//! # Ok(())
//! # }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use pedsheet::{ParserBuilder, HeaderVariant, NumberFormat};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let parser = ParserBuilder::new()
//!         .with_header_variant(HeaderVariant::WithCustomer)
//!         .with_number_format(NumberFormat::CommaDecimal)
//!         .with_banner_rows(3)
//!         .verbose(true)
//!         .build()?;
//!
//!     let output = parser.parse_path("orders.xlsx")?;
//!     # let _ = output;
//!     Ok(())
//! }
//! ```
//!
//! # Caching Repeated Inputs
//!
//! ```rust,no_run
//! use pedsheet::{ParseCache, ParserBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let parser = ParserBuilder::new().build()?;
//!     let mut cache = ParseCache::new();
//!
//!     let bytes = std::fs::read("orders.xlsx")?;
//!     let first = cache.get_or_parse(&parser, &bytes, "orders.xlsx")?;
//!     let second = cache.get_or_parse(&parser, &bytes, "orders.xlsx")?;
//!     assert!(std::sync::Arc::ptr_eq(&first, &second));
//!
//!     Ok(())
//! }
//! ```

mod aggregate;
mod api;
mod audit;
mod builder;
mod cache;
mod coerce;
mod error;
mod grid;
mod header;
mod loader;
mod segmenter;
mod types;

pub use api::{HeaderVariant, NumberFormat};
pub use audit::{AuditEvent, AuditLog, Severity};
pub use builder::{Parser, ParserBuilder};
pub use cache::{cache_key, ParseCache};
pub use error::ParseError;
pub use grid::RawGrid;
pub use loader::load_grid;
pub use types::{Item, Order, ParseOutput, Total};
