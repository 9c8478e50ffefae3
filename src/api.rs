//! Public API Types
//!
//! Configuration enums exposed through [`crate::ParserBuilder`].

/// Reference-header token set.
///
/// The ERP produces the order report in a handful of near-identical layouts
/// that differ in which column labels mark the reference header row. The
/// variant controls which tokens the header locator requires; the first two
/// tokens double as the repeated-header block-start signal.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HeaderVariant {
    /// `Tipo` / `Id` / `Vendedor`, the production layout (default).
    Standard,

    /// `Tipo` / `Id` / `Vendedor` / `Cliente`, the stricter layout used by
    /// exports that always carry the customer column.
    WithCustomer,

    /// Caller-supplied token list. Must contain at least two tokens; tokens
    /// are compared against trimmed raw cell values.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pedsheet::{HeaderVariant, ParserBuilder};
    ///
    /// # fn main() -> Result<(), pedsheet::ParseError> {
    /// let parser = ParserBuilder::new()
    ///     .with_header_variant(HeaderVariant::Custom(vec![
    ///         "Tipo".to_string(),
    ///         "Id".to_string(),
    ///     ]))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    Custom(Vec<String>),
}

impl HeaderVariant {
    /// Resolve the variant into its concrete token list.
    pub(crate) fn tokens(&self) -> Vec<String> {
        match self {
            HeaderVariant::Standard => {
                vec!["Tipo".to_string(), "Id".to_string(), "Vendedor".to_string()]
            }
            HeaderVariant::WithCustomer => vec![
                "Tipo".to_string(),
                "Id".to_string(),
                "Vendedor".to_string(),
                "Cliente".to_string(),
            ],
            HeaderVariant::Custom(tokens) => tokens.clone(),
        }
    }
}

impl Default for HeaderVariant {
    fn default() -> Self {
        HeaderVariant::Standard
    }
}

/// Decimal/thousands disambiguation for numeric cells.
///
/// The report mixes `1.234,56` and `1,234.56` renderings without declaring a
/// locale, so coercion is heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum NumberFormat {
    /// When both `,` and `.` appear, the separator that occurs **last** is
    /// the decimal point and the other is a thousands separator; a lone `,`
    /// is decimal (default).
    #[default]
    Auto,

    /// Always treat `.` as thousands and `,` as decimal, matching exports
    /// that are known to be pt-BR formatted throughout.
    CommaDecimal,
}
