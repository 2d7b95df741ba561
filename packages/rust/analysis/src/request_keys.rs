//! Request-key harvesting.
//!
//! A control reads precomputed query results through a dataset accessor,
//! `requests_results["key"]`. Every quoted subscript of that accessor is a
//! request key the control depends on.

use std::collections::BTreeSet;

use regex::Regex;

use controlkb_shared::{ControlKbError, Result};

/// Default accessor identifier.
pub const DEFAULT_ACCESSOR: &str = "requests_results";

/// Finds `ACCESSOR["key"]` / `ACCESSOR['key']` subscripts.
#[derive(Debug, Clone)]
pub struct RequestKeyExtractor {
    pattern: Regex,
}

impl RequestKeyExtractor {
    pub fn new(accessor: &str) -> Result<Self> {
        let pattern = format!(
            r#"\b{}\[\s*(?:"([^"\n]+)"|'([^'\n]+)')\s*\]"#,
            regex::escape(accessor)
        );
        let pattern = Regex::new(&pattern).map_err(|e| {
            ControlKbError::config(format!("invalid request accessor '{accessor}': {e}"))
        })?;
        Ok(Self { pattern })
    }

    /// Keys referenced in `source`.
    pub fn extract(&self, source: &str) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        self.extract_into(source, &mut keys);
        keys
    }

    /// Add keys referenced in `source` to `keys`.
    pub fn extract_into(&self, source: &str, keys: &mut BTreeSet<String>) {
        for caps in self.pattern.captures_iter(source) {
            if let Some(key) = caps.get(1).or_else(|| caps.get(2)) {
                keys.insert(key.as_str().to_string());
            }
        }
    }
}

impl Default for RequestKeyExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_ACCESSOR).expect("default accessor is a valid pattern")
    }
}
