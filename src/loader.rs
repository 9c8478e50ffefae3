//! Grid Loader Module
//!
//! Turns a spreadsheet file (ODS, XLS, XLSX) into a [`RawGrid`] of string
//! cells using calamine: headerless, untyped, no coercion. Two fidelity
//! rules matter downstream:
//!
//! 1. A numeric cell holding an integral float (`123.0` used as an
//!    identifier) renders without a trailing `.0`, so ids are compared as
//!    strings and a spurious `.0` would break all block/item matching.
//! 2. Row indices are absolute: when calamine reports a non-zero start
//!    offset for the used range, the grid is padded with blank rows/columns
//!    so that audit events line up with the visible sheet.

use std::io::{Read, Seek};

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::error::ParseError;
use crate::grid::RawGrid;

/// Load the first sheet of a workbook as a headerless string grid.
///
/// The format is sniffed from the content (the filename is used for
/// diagnostics only).
///
/// # Errors
///
/// * [`ParseError::Load`] when calamine cannot read the workbook.
/// * [`ParseError::NoSheets`] when the workbook has no sheets at all.
pub fn load_grid<R: Read + Seek + Clone>(reader: R, filename: &str) -> Result<RawGrid, ParseError> {
    let mut workbook = open_workbook_auto_from_rs(reader)?;

    let sheet_names = workbook.sheet_names().to_vec();
    let first = sheet_names.first().cloned().ok_or(ParseError::NoSheets)?;
    let range = workbook.worksheet_range(&first)?;

    let (start_row, start_col) = range.start().unwrap_or((0, 0));

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(start_row as usize + range.height());
    rows.resize_with(start_row as usize, Vec::new);

    for sheet_row in range.rows() {
        let mut cells = vec![String::new(); start_col as usize];
        cells.extend(sheet_row.iter().map(cell_to_string));
        rows.push(cells);
    }

    tracing::debug!(
        file = filename,
        sheet = first.as_str(),
        rows = rows.len(),
        "grid loaded"
    );

    Ok(RawGrid::new(rows))
}

/// Render one calamine cell as the string the parser will see.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_to_string(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| float_to_string(dt.as_f64())),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{:?}", e),
    }
}

/// Integral floats render as bare integers (the `.0` fidelity rule).
fn float_to_string(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}
