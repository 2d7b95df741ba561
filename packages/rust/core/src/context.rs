//! Control context bundles: one control plus the results it reads.

use serde::Serialize;
use tracing::debug;

use controlkb_results::ResultStore;
use controlkb_shared::{Control, RequestResult, Result};

use crate::knowledge_base::KnowledgeBase;

/// Everything a downstream prompt needs about one control.
#[derive(Debug, Clone, Serialize)]
pub struct ControlContext {
    pub control: Control,
    /// Normalized results, in request-key order.
    pub requests_results: Vec<RequestResult>,
    /// Request keys with no stored result.
    pub missing_keys: Vec<String>,
}

/// Bundle the control titled `title` with its request results.
///
/// Fails only when the control does not exist; unresolved request keys are
/// listed in [`ControlContext::missing_keys`].
pub fn build_context(kb: &KnowledgeBase, store: &ResultStore, title: &str) -> Result<ControlContext> {
    let control = kb.control(title)?.clone();

    let mut requests_results = Vec::new();
    let mut missing_keys = Vec::new();
    for key in &control.requests_keys {
        match store.lookup(key) {
            Ok(result) => requests_results.push(result),
            Err(e) if e.is_not_found() => {
                debug!(title, key = %key, "request key has no stored result");
                missing_keys.push(key.clone());
            }
            Err(e) => return Err(e),
        }
    }

    Ok(ControlContext {
        control,
        requests_results,
        missing_keys,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    use controlkb_shared::ControlCategory;
    use serde_json::json;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::from_controls(vec![Control {
            title: "Kerberoasting".into(),
            file_name: "kerberoastables.py".into(),
            control_category: ControlCategory::Kerberos,
            code: String::new(),
            dependencies: BTreeMap::new(),
            requests_keys: BTreeSet::from(["spn_accounts".to_string(), "not_computed".to_string()]),
        }])
    }

    fn store() -> ResultStore {
        let node = json!({"id": 1, "labels": ["Group"], "name": "DOMAIN ADMINS",
                          "domain": "D", "tenant_id": null, "relation_type": "MemberOf"});
        ResultStore::from_value(json!({
            "spn_accounts": {
                "name": "SPN accounts",
                "request": "MATCH p=() RETURN p",
                "result": [
                    {"type": "Path", "nodes": [node.clone()]},
                    {"type": "Path", "nodes": [node]}
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn bundles_found_results_and_reports_missing() {
        let context = build_context(&kb(), &store(), "Kerberoasting").unwrap();

        assert_eq!(context.control.title, "Kerberoasting");
        assert_eq!(context.missing_keys, vec!["not_computed"]);
        assert_eq!(context.requests_results.len(), 1);

        let result = context.requests_results[0].result();
        assert_eq!(result["nodes"].as_array().unwrap().len(), 1);
        assert_eq!(result["edges"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn unknown_control_is_not_found() {
        let err = build_context(&kb(), &store(), "Nope").unwrap_err();
        assert!(err.is_not_found());
    }
}
