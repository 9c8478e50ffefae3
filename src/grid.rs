//! Grid Module
//!
//! [`RawGrid`] is the untyped rectangular view of a spreadsheet: rows of
//! string cells exactly as the loader rendered them, with no header applied
//! and no coercion done. Row indices are absolute from the top of the sheet,
//! so audit events and synthetic ids line up with what a user sees when they
//! open the file.

/// Untyped spreadsheet grid. Immutable once loaded; each parse owns its own.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGrid {
    rows: Vec<Vec<String>>,
}

impl RawGrid {
    /// Wrap already-stringified rows. Rows may be ragged; absent trailing
    /// cells are treated as blank.
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Convenience constructor for tests and fixtures.
    ///
    /// ```rust
    /// use pedsheet::RawGrid;
    ///
    /// let grid = RawGrid::from_rows(vec![
    ///     vec!["Tipo", "Id"],
    ///     vec!["PED", "100"],
    /// ]);
    /// assert_eq!(grid.len(), 2);
    /// ```
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the grid has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells of the given row; empty slice when the index is out of range.
    pub fn row(&self, idx: usize) -> &[String] {
        self.rows.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cell content at `(row, col)`; `""` when out of range.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// A row is blank iff every cell is empty or whitespace-only.
    /// Out-of-range rows count as blank.
    pub fn is_blank_row(&self, idx: usize) -> bool {
        self.row(idx).iter().all(|cell| cell.trim().is_empty())
    }
}
