//! Read-only access to a built knowledge base.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, instrument};

use controlkb_shared::{Control, ControlCategory, ControlKbError, ControlSummary, Result};

/// Controls loaded from `all_controls_info.json`.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    controls: Vec<Control>,
}

impl KnowledgeBase {
    /// Load and validate the knowledge base file.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ControlKbError::io(path, e))?;
        let controls: Vec<Control> = serde_json::from_str(&content).map_err(|e| {
            ControlKbError::validation(format!("invalid knowledge base {}: {e}", path.display()))
        })?;
        debug!(controls = controls.len(), "knowledge base loaded");
        Ok(Self { controls })
    }

    pub fn from_controls(controls: Vec<Control>) -> Self {
        Self { controls }
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// `{category, title}` for every control, in file order.
    pub fn summaries(&self) -> Vec<ControlSummary> {
        self.controls.iter().map(ControlSummary::from).collect()
    }

    /// Summaries grouped by category, titles sorted case-insensitively.
    pub fn by_category(&self) -> BTreeMap<ControlCategory, Vec<ControlSummary>> {
        let mut grouped: BTreeMap<ControlCategory, Vec<ControlSummary>> = BTreeMap::new();
        for summary in self.summaries() {
            grouped.entry(summary.control_category).or_default().push(summary);
        }
        for summaries in grouped.values_mut() {
            summaries.sort_by_cached_key(|s| s.title.to_lowercase());
        }
        grouped
    }

    /// The control with exactly this title.
    pub fn control(&self, title: &str) -> Result<&Control> {
        self.controls
            .iter()
            .find(|c| c.title == title)
            .ok_or_else(|| ControlKbError::not_found("control", title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn control(title: &str, category: ControlCategory) -> Control {
        Control {
            title: title.into(),
            file_name: format!("{}.py", title.to_lowercase().replace(' ', "_")),
            control_category: category,
            code: String::new(),
            dependencies: BTreeMap::new(),
            requests_keys: BTreeSet::new(),
        }
    }

    fn sample() -> KnowledgeBase {
        KnowledgeBase::from_controls(vec![
            control("zerologon", ControlCategory::Misc),
            control("Kerberoasting", ControlCategory::Kerberos),
            control("AS-REP roasting", ControlCategory::Kerberos),
            control("Admin count", ControlCategory::Misc),
        ])
    }

    #[test]
    fn groups_and_sorts_case_insensitively() {
        let grouped = sample().by_category();
        assert_eq!(grouped.len(), 2);

        let kerberos: Vec<_> = grouped[&ControlCategory::Kerberos]
            .iter()
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(kerberos, vec!["AS-REP roasting", "Kerberoasting"]);

        let misc: Vec<_> = grouped[&ControlCategory::Misc]
            .iter()
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(misc, vec!["Admin count", "zerologon"]);

        let order: Vec<_> = grouped.keys().copied().collect();
        assert_eq!(order, vec![ControlCategory::Kerberos, ControlCategory::Misc]);
    }

    #[test]
    fn summaries_keep_file_order() {
        let titles: Vec<_> = sample().summaries().into_iter().map(|s| s.title).collect();
        assert_eq!(titles[0], "zerologon");
        assert_eq!(titles.len(), 4);
    }

    #[test]
    fn control_lookup_by_exact_title() {
        let kb = sample();
        assert_eq!(kb.control("Kerberoasting").unwrap().control_category, ControlCategory::Kerberos);
        assert!(kb.control("kerberoasting").unwrap_err().is_not_found());
    }

    #[test]
    fn load_rejects_malformed_file() {
        let path = std::env::temp_dir().join(format!("ckb-kb-{}.json", uuid::Uuid::now_v7()));
        std::fs::write(&path, r#"[{"title": "x"}]"#).unwrap();

        let err = KnowledgeBase::load(&path).unwrap_err();
        assert!(matches!(err, ControlKbError::Validation { .. }));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_roundtrips_saved_controls() {
        let path = std::env::temp_dir().join(format!("ckb-kb-{}.json", uuid::Uuid::now_v7()));
        let controls = sample().controls().to_vec();
        std::fs::write(&path, serde_json::to_string(&controls).unwrap()).unwrap();

        let kb = KnowledgeBase::load(&path).unwrap();
        assert_eq!(kb.len(), 4);
        assert_eq!(kb.controls(), controls.as_slice());

        let _ = std::fs::remove_file(&path);
    }
}
