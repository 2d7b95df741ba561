//! Core domain types for the control knowledge base.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ControlKbError, Result};

// ---------------------------------------------------------------------------
// ControlCategory
// ---------------------------------------------------------------------------

/// The four families a control can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ControlCategory {
    Kerberos,
    Passwords,
    Misc,
    Permissions,
}

impl ControlCategory {
    /// All categories, in display order.
    pub const ALL: [ControlCategory; 4] = [
        ControlCategory::Kerberos,
        ControlCategory::Passwords,
        ControlCategory::Misc,
        ControlCategory::Permissions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kerberos => "Kerberos",
            Self::Passwords => "Passwords",
            Self::Misc => "Misc",
            Self::Permissions => "Permissions",
        }
    }
}

impl std::fmt::Display for ControlCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ControlCategory {
    type Err = ControlKbError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ControlKbError::validation(format!("unknown control category '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// CategoryTable
// ---------------------------------------------------------------------------

/// Immutable title → category table consulted while building.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTable(HashMap<String, ControlCategory>);

impl CategoryTable {
    /// Load the table from a JSON object file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ControlKbError::io(path, e))?;
        let table: Self = serde_json::from_str(&content).map_err(|e| {
            ControlKbError::config(format!(
                "invalid category table {}: {e}",
                path.display()
            ))
        })?;
        tracing::debug!(path = %path.display(), entries = table.len(), "loaded category table");
        Ok(table)
    }

    pub fn category(&self, title: &str) -> Option<ControlCategory> {
        self.0.get(title).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ControlCategory)> for CategoryTable {
    fn from_iter<I: IntoIterator<Item = (String, ControlCategory)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Control
// ---------------------------------------------------------------------------

/// Source imported from one resolved file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Symbol names imported from the file, first-seen order, no duplicates.
    pub imported_elements: Vec<String>,
    /// Extracted source per symbol that was found at top level.
    pub code_map: BTreeMap<String, String>,
}

/// One entry of the knowledge base (`all_controls_info.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    /// Declared title, unique across the knowledge base.
    pub title: String,
    /// Control module file name (no directory).
    pub file_name: String,
    pub control_category: ControlCategory,
    /// Full control source.
    pub code: String,
    /// Resolved file path → imported source.
    pub dependencies: BTreeMap<String, Dependency>,
    /// Request keys referenced by the control or its imported code.
    pub requests_keys: BTreeSet<String>,
}

/// `{category, title}` view used when listing controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSummary {
    pub control_category: ControlCategory,
    pub title: String,
}

impl From<&Control> for ControlSummary {
    fn from(control: &Control) -> Self {
        Self {
            control_category: control.control_category,
            title: control.title.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Request results
// ---------------------------------------------------------------------------

/// A fully described query result (`requests_results.json` entry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub name: String,
    /// Query text.
    pub request: String,
    pub request_key: String,
    /// Result rows; an array when stored, possibly reshaped on lookup.
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_a_write_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_a_gds_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_gds_graph: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gds_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_gds_graph: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_path: Option<bool>,
}

/// Entry whose stored value does not match [`RequestRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackResult {
    pub request_key: String,
    pub result: Value,
}

/// One keyed entry of the request-result collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestResult {
    Record(RequestRecord),
    Fallback(FallbackResult),
}

impl RequestResult {
    pub fn request_key(&self) -> &str {
        match self {
            Self::Record(r) => &r.request_key,
            Self::Fallback(f) => &f.request_key,
        }
    }

    pub fn result(&self) -> &Value {
        match self {
            Self::Record(r) => &r.result,
            Self::Fallback(f) => &f.result,
        }
    }

    /// Replace the result payload, keeping every other field.
    pub fn map_result(self, f: impl FnOnce(Value) -> Value) -> Self {
        match self {
            Self::Record(mut r) => {
                r.result = f(r.result);
                Self::Record(r)
            }
            Self::Fallback(mut fb) => {
                fb.result = f(fb.result);
                Self::Fallback(fb)
            }
        }
    }
}
