//! Graph-path normalization.
//!
//! Query results are arbitrary JSON. An array whose elements are all path
//! records (`{"type": "Path", "nodes": [...]}`) is replaced by a
//! [`CanonicalView`]; everything else keeps its shape while its children are
//! normalized in turn.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};

/// Field carrying the record tag.
pub const PATH_TAG_FIELD: &str = "type";
/// Tag value marking a path record.
pub const PATH_TAG: &str = "Path";
/// Field holding a path's ordered node list.
pub const PATH_NODES_FIELD: &str = "nodes";
/// Node fields kept in the canonical node list.
pub const NODE_FIELDS: [&str; 5] = ["id", "labels", "name", "domain", "tenant_id"];
/// Node fields describing the edge that reached the node.
pub const EDGE_FIELDS: [&str; 2] = ["id", "relation_type"];

/// A result element classified by shape.
#[derive(Debug, Clone, Copy)]
pub enum ResultItem<'a> {
    Path(PathRecord<'a>),
    Raw(&'a Value),
}

/// A well-formed path record: tagged, with a list of object nodes.
#[derive(Debug, Clone, Copy)]
pub struct PathRecord<'a> {
    nodes: &'a [Value],
}

impl<'a> ResultItem<'a> {
    pub fn classify(value: &'a Value) -> Self {
        let Value::Object(map) = value else {
            return Self::Raw(value);
        };
        if map.get(PATH_TAG_FIELD).and_then(Value::as_str) != Some(PATH_TAG) {
            return Self::Raw(value);
        }
        match map.get(PATH_NODES_FIELD) {
            Some(Value::Array(nodes)) if nodes.iter().all(Value::is_object) => {
                Self::Path(PathRecord { nodes })
            }
            _ => Self::Raw(value),
        }
    }

    pub fn into_path(self) -> Option<PathRecord<'a>> {
        match self {
            Self::Path(path) => Some(path),
            Self::Raw(_) => None,
        }
    }
}

impl<'a> PathRecord<'a> {
    pub fn nodes(self) -> impl Iterator<Item = &'a Map<String, Value>> {
        self.nodes.iter().filter_map(Value::as_object)
    }
}

/// Deduplicated node list plus one edge list per path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalView {
    pub nodes: Vec<Value>,
    pub edges: Vec<Vec<Value>>,
}

impl CanonicalView {
    /// Project `paths`. Nodes are deduplicated on their full projection,
    /// keeping first-seen order.
    pub fn from_paths(paths: &[PathRecord<'_>]) -> Self {
        let mut view = Self::default();
        let mut seen: HashSet<String> = HashSet::new();

        for path in paths {
            let mut edges = Vec::new();
            for node in path.nodes() {
                let projected = project(node, &NODE_FIELDS);
                // Map keys are ordered, so the serialized form is canonical.
                if seen.insert(projected.to_string()) {
                    view.nodes.push(projected);
                }
                edges.push(project(node, &EDGE_FIELDS));
            }
            view.edges.push(edges);
        }

        view
    }

    pub fn into_value(self) -> Value {
        let mut map = Map::new();
        map.insert("nodes".into(), Value::Array(self.nodes));
        map.insert(
            "edges".into(),
            Value::Array(self.edges.into_iter().map(Value::Array).collect()),
        );
        Value::Object(map)
    }
}

fn project(node: &Map<String, Value>, fields: &[&str]) -> Value {
    Value::Object(
        fields
            .iter()
            .filter_map(|field| node.get(*field).map(|v| ((*field).to_string(), v.clone())))
            .collect(),
    )
}

/// Normalize a result value. Pure; the input is never modified.
///
/// Empty arrays stay empty arrays: an empty result is not an empty path list.
pub fn normalize(value: &Value) -> Value {
    match value {
        Value::Array(items) => normalize_array(items),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, v)| (key.clone(), normalize(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn normalize_array(items: &[Value]) -> Value {
    let paths: Option<Vec<PathRecord<'_>>> = items
        .iter()
        .map(|item| ResultItem::classify(item).into_path())
        .collect();

    match paths {
        Some(paths) if !paths.is_empty() => CanonicalView::from_paths(&paths).into_value(),
        _ => Value::Array(items.iter().map(normalize).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(id: u64, name: &str, relation: &str) -> Value {
        json!({
            "id": id,
            "labels": ["User"],
            "name": name,
            "domain": "ESSOS.LOCAL",
            "tenant_id": null,
            "relation_type": relation,
            "path_candidate_id": 99,
        })
    }

    fn path(nodes: Vec<Value>) -> Value {
        json!({"type": "Path", "nodes": nodes, "start_node": 0})
    }

    #[test]
    fn empty_array_is_not_a_path_list() {
        assert_eq!(normalize(&json!([])), json!([]));
    }

    #[test]
    fn scalars_pass_through() {
        for value in [json!(null), json!(1), json!("Path"), json!(true)] {
            assert_eq!(normalize(&value), value);
        }
    }

    #[test]
    fn shared_node_is_deduplicated() {
        let shared = node(1, "DOMAIN ADMINS@ESSOS.LOCAL", "MemberOf");
        let input = json!([
            path(vec![node(2, "JORAH@ESSOS.LOCAL", "MemberOf"), shared.clone()]),
            path(vec![node(3, "KHAL@ESSOS.LOCAL", "GenericAll"), shared]),
        ]);

        let output = normalize(&input);
        let nodes = output["nodes"].as_array().unwrap();
        let edges = output["edges"].as_array().unwrap();

        assert_eq!(nodes.len(), 3);
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].as_array().unwrap().len(), 2);
        assert_eq!(nodes[0]["name"], "JORAH@ESSOS.LOCAL");
        assert_eq!(nodes[1]["name"], "DOMAIN ADMINS@ESSOS.LOCAL");
        assert_eq!(nodes[2]["name"], "KHAL@ESSOS.LOCAL");
    }

    #[test]
    fn distinct_nodes_are_all_kept() {
        let input = json!([
            path(vec![node(1, "A", "MemberOf"), node(2, "B", "MemberOf")]),
            path(vec![node(3, "C", "Owns")]),
        ]);
        let output = normalize(&input);
        assert_eq!(output["nodes"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn projections_keep_only_identity_fields() {
        let input = json!([path(vec![node(7, "A", "DCSync")])]);
        let output = normalize(&input);

        assert_eq!(
            output["nodes"][0],
            json!({"id": 7, "labels": ["User"], "name": "A", "domain": "ESSOS.LOCAL", "tenant_id": null})
        );
        assert_eq!(output["edges"][0][0], json!({"id": 7, "relation_type": "DCSync"}));
    }

    #[test]
    fn dedup_uses_full_projection_not_id() {
        let input = json!([
            path(vec![node(1, "A", "MemberOf")]),
            path(vec![node(1, "A-renamed", "MemberOf")]),
            path(vec![node(1, "A", "Owns")]),
        ]);
        let output = normalize(&input);
        // relation_type is not part of the node projection
        assert_eq!(output["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(output["edges"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn mixed_array_recurses_element_wise() {
        let nested = json!([path(vec![node(1, "A", "MemberOf")])]);
        let input = json!([path(vec![node(1, "A", "MemberOf")]), {"count": 3}, nested]);
        let output = normalize(&input);

        let items = output.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["type"], "Path");
        assert_eq!(items[1], json!({"count": 3}));
        assert!(items[2]["nodes"].is_array());
    }

    #[test]
    fn malformed_path_record_is_raw() {
        let input = json!([{"type": "Path", "nodes": "oops"}]);
        assert_eq!(normalize(&input), input);

        let input = json!([{"type": "Path", "nodes": [1, 2]}]);
        assert_eq!(normalize(&input), input);
    }

    #[test]
    fn objects_recurse_with_keys_preserved() {
        let input = json!({"paths": [path(vec![node(1, "A", "MemberOf")])], "total": 1});
        let output = normalize(&input);
        assert_eq!(output["total"], 1);
        assert_eq!(output["paths"]["nodes"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn normalizing_twice_is_a_no_op() {
        let input = json!([
            path(vec![node(1, "A", "MemberOf"), node(2, "B", "Owns")]),
            path(vec![node(2, "B", "Owns")]),
        ]);
        let once = normalize(&input);
        let twice = normalize(&once);
        assert_eq!(once, twice);
        assert!(once.is_object());
    }

    #[test]
    fn input_is_left_untouched() {
        let input = json!([path(vec![node(1, "A", "MemberOf")])]);
        let before = input.clone();
        let _ = normalize(&input);
        assert_eq!(input, before);
    }
}
