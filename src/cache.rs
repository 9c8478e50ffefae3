//! Parse Cache Module
//!
//! Content-addressed memoization for repeated parses of the same workbook
//! bytes. Keys are SHA-256 digests of the raw input, so renamed or re-sent
//! copies of a file hit the cache while any byte-level edit misses it.

use std::collections::HashMap;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::builder::Parser;
use crate::error::ParseError;
use crate::types::ParseOutput;

/// SHA-256 digest of a workbook's bytes.
pub fn cache_key(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Digest-keyed store of parse results.
///
/// Outputs are held behind [`Arc`] so cache hits are cheap clones of a
/// pointer, not of the datasets. Failed parses are never cached; a
/// transient failure retries on the next call.
#[derive(Debug, Default)]
pub struct ParseCache {
    entries: HashMap<[u8; 32], Arc<ParseOutput>>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached output for `bytes`, parsing on a miss.
    pub fn get_or_parse(
        &mut self,
        parser: &Parser,
        bytes: &[u8],
        filename: &str,
    ) -> Result<Arc<ParseOutput>, ParseError> {
        let key = cache_key(bytes);
        if let Some(output) = self.entries.get(&key) {
            tracing::debug!(filename, "cache hit");
            return Ok(Arc::clone(output));
        }

        let output = Arc::new(parser.parse_bytes(bytes, filename)?);
        self.entries.insert(key, Arc::clone(&output));
        Ok(output)
    }

    /// Drop one entry. Returns `true` when the key was present.
    pub fn invalidate(&mut self, key: &[u8; 32]) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
