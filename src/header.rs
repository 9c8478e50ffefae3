//! Header Module
//!
//! Locates the canonical reference header row near the top of the grid and
//! turns header rows into [`HeaderMap`]s: stable normalized column keys
//! mapped to column indices, resolved once per header and then accessed
//! through typed readers that never fail on a missing column.

use std::collections::HashMap;

use crate::api::NumberFormat;
use crate::coerce;
use crate::builder::ParserConfig;
use crate::error::ParseError;
use crate::grid::RawGrid;

/// Normalized key of the mandatory item-code column.
pub(crate) const ITEM_CODE_KEY: &str = "codigo";

/// Fold the Latin diacritics these reports actually contain (pt-BR header
/// labels such as "Código", "Preço", "Evolução") and drop stray combining
/// marks from decomposed input.
fn fold_diacritics(c: char) -> Option<char> {
    let folded = match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        // Combining Diacritical Marks block (NFD leftovers)
        '\u{0300}'..='\u{036f}' => return None,
        _ => c,
    };
    Some(folded)
}

/// Normalize a raw header label into a stable lookup key.
///
/// Steps: fold diacritics, lowercase, trim, map tabs/newlines to spaces,
/// collapse space runs, strip `.` and `/`, then spaces to underscores.
/// `"Juros/Desc."` becomes `"jurosdesc"`, `"Preço Venda"` becomes
/// `"preco_venda"`.
pub(crate) fn normalize_key(raw: &str) -> String {
    let lowered: String = raw
        .to_lowercase()
        .chars()
        .filter_map(fold_diacritics)
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            other => other,
        })
        .collect();

    let mut key = String::with_capacity(lowered.len());
    let mut pending_space = false;
    for c in lowered.trim().chars() {
        match c {
            ' ' => pending_space = true,
            '.' | '/' => {}
            other => {
                if pending_space && !key.is_empty() {
                    key.push('_');
                }
                pending_space = false;
                key.push(other);
            }
        }
    }
    key
}

/// Mapping from normalized column key to column index, built once per header
/// row. Duplicate normalized keys within one row are disambiguated with
/// `_1`, `_2`, … in encounter order, because the source legitimately repeats
/// labels (two "sale price" columns with different meaning).
#[derive(Debug, Clone)]
pub(crate) struct HeaderMap {
    index: HashMap<String, usize>,
}

impl HeaderMap {
    pub(crate) fn from_row(cells: &[String]) -> Self {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut index = HashMap::with_capacity(cells.len());

        for (col, raw) in cells.iter().enumerate() {
            let base = normalize_key(raw);
            let key = match seen.get_mut(&base) {
                Some(count) => {
                    *count += 1;
                    format!("{}_{}", base, count)
                }
                None => {
                    seen.insert(base.clone(), 0);
                    base
                }
            };
            index.insert(key, col);
        }

        Self { index }
    }

    pub(crate) fn column(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }
}

/// Typed access into one data row through a [`HeaderMap`]. Absent columns
/// and blank cells read as empty/zero, preserving the "never fails on a
/// missing column" semantics of the source reports.
pub(crate) struct FieldReader<'a> {
    row: &'a [String],
    map: &'a HeaderMap,
    format: NumberFormat,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(row: &'a [String], map: &'a HeaderMap, format: NumberFormat) -> Self {
        Self { row, map, format }
    }

    /// Raw cell for a key, untrimmed; `None` when the column is absent.
    pub(crate) fn raw(&self, key: &str) -> Option<&str> {
        self.map
            .column(key)
            .and_then(|col| self.row.get(col))
            .map(String::as_str)
    }

    /// Trimmed string field; `""` when the key is absent or the cell blank.
    pub(crate) fn str_field(&self, key: &str) -> String {
        self.raw(key).unwrap_or("").trim().to_string()
    }

    /// Numeric field with default-on-failure semantics.
    pub(crate) fn float_field(&self, key: &str) -> f64 {
        coerce::to_float(self.raw(key).unwrap_or(""), self.format)
    }

    /// Percentage field with default-on-failure semantics.
    pub(crate) fn percent_field(&self, key: &str) -> f64 {
        coerce::to_percent(self.raw(key).unwrap_or(""), self.format)
    }

    /// True when the cell for `key` is non-blank but not a parseable number.
    /// Used for verbose-mode audit events.
    pub(crate) fn is_garbled_number(&self, key: &str) -> bool {
        match self.raw(key) {
            Some(raw) if !raw.trim().is_empty() => {
                coerce::parse_float(raw, self.format).is_none()
            }
            _ => false,
        }
    }
}

/// Does this row carry the block-start header signal? The repeated header
/// copies only reliably contain the first two reference tokens, so that is
/// all the segmenter checks.
pub(crate) fn is_block_header(row: &[String], tokens: &[String]) -> bool {
    tokens
        .iter()
        .take(2)
        .all(|token| row.iter().any(|cell| cell.trim() == token.as_str()))
}

/// Locate the canonical reference header row.
///
/// Scans `banner_rows .. banner_rows + header_window`, selecting the first
/// row whose trimmed cell set contains every required token. Failing to find
/// one is the only fatal error in normal operation.
pub(crate) fn find_reference_header(
    grid: &RawGrid,
    config: &ParserConfig,
) -> Result<usize, ParseError> {
    let end = grid
        .len()
        .min(config.banner_rows.saturating_add(config.header_window));

    for idx in config.banner_rows..end {
        let row = grid.row(idx);
        let found = config
            .required_tokens
            .iter()
            .all(|token| row.iter().any(|cell| cell.trim() == token.as_str()));
        if found {
            return Ok(idx);
        }
    }

    Err(ParseError::HeaderNotFound {
        tokens: config.required_tokens.clone(),
        window: config.header_window,
    })
}

/// Normalize a candidate item-header row. Returns `None` when the mandatory
/// item-code column is absent, signaling the segmenter to abandon item
/// extraction for the current block only.
pub(crate) fn find_item_header(row: &[String]) -> Option<HeaderMap> {
    let map = HeaderMap::from_row(row);
    if map.contains(ITEM_CODE_KEY) {
        Some(map)
    } else {
        None
    }
}
