//! Keyed request-result collection (`requests_results.json`).

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, instrument};

use controlkb_shared::{ControlKbError, FallbackResult, RequestRecord, RequestResult, Result};

use crate::normalizer::normalize;

/// In-memory view of the keyed-result collection.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    entries: BTreeMap<String, RequestResult>,
}

impl ResultStore {
    /// Load the collection from a JSON object file.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ControlKbError::io(path, e))?;
        let value: Value = serde_json::from_str(&content).map_err(|e| {
            ControlKbError::validation(format!("invalid {}: {e}", path.display()))
        })?;
        let store = Self::from_value(value)?;
        info!(entries = store.len(), "request results loaded");
        Ok(store)
    }

    /// Build the store from the top-level JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(ControlKbError::validation(
                "request results must be a JSON object keyed by request key",
            ));
        };
        let entries = map
            .into_iter()
            .map(|(key, value)| {
                let entry = parse_entry(&key, value);
                (key, entry)
            })
            .collect();
        Ok(Self { entries })
    }

    /// The record stored under `key`, with its result normalized.
    pub fn lookup(&self, key: &str) -> Result<RequestResult> {
        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| ControlKbError::not_found("request result", key))?;
        Ok(entry.clone().map_result(|result| normalize(&result)))
    }

    /// The record as stored, without normalization.
    pub fn get_raw(&self, key: &str) -> Option<&RequestResult> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read one entry as a full record, falling back to `{request_key, result}`.
fn parse_entry(key: &str, value: Value) -> RequestResult {
    if let Value::Object(map) = &value {
        let mut candidate = map.clone();
        candidate.insert("request_key".into(), Value::String(key.to_string()));
        match serde_json::from_value::<RequestRecord>(Value::Object(candidate)) {
            Ok(record) if record.result.is_array() => return RequestResult::Record(record),
            Ok(_) => debug!(key, "result is not an array, storing as fallback"),
            Err(e) => debug!(key, error = %e, "not a full record, storing as fallback"),
        }
    }
    RequestResult::Fallback(FallbackResult {
        request_key: key.to_string(),
        result: value,
    })
}
