use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, trace};

use crate::format::{format_value, DEFAULT_PREVIEW_LEN};
use crate::types::{FlatNode, JsonType, Node, Truncation};

/// Hard circuit breaker against pathological fan-out: containers with more
/// entries than this are treated as leaves for recursion. Not configurable.
pub const MAX_EXPANDABLE_CHILDREN: usize = 1000;

/// Per-container overhead in the size heuristic.
const CONTAINER_OVERHEAD: u64 = 24;

/// Configurable guards for tree construction. The depth guard protects the
/// call stack against pathologically deep input; it is distinct from the
/// fixed fan-out breaker.
#[derive(Debug, Clone, Copy)]
pub struct TreeLimits {
    pub max_depth: usize,
}

impl Default for TreeLimits {
    fn default() -> Self {
        Self { max_depth: 128 }
    }
}

/// Tree plus flattened projection plus aggregates, all produced in one pass.
#[derive(Debug, Clone)]
pub struct TreeOutcome {
    pub root: Node,
    pub flat: Vec<FlatNode>,
    pub node_count: usize,
    pub max_depth: usize,
    pub estimated_size: u64,
}

#[derive(Default)]
struct Aggregates {
    node_count: usize,
    max_depth: usize,
}

impl Aggregates {
    fn visit(&mut self, depth: usize) {
        self.node_count += 1;
        self.max_depth = self.max_depth.max(depth);
    }
}

/// Build the node tree for `value`.
///
/// Children are materialized only for containers whose id is in `expanded`
/// and whose entry count stays under the fan-out breaker. Aggregate stats
/// still walk the whole value (bounded by the depth guard only), so
/// `node_count` is a property of the document, not of the current expansion.
pub fn build_tree(value: &Value, expanded: &HashSet<String>, limits: TreeLimits) -> TreeOutcome {
    let mut agg = Aggregates::default();
    let root = build_node("root", value, "root".to_string(), 0, expanded, limits, &mut agg);
    let flat = flatten(&root, expanded);
    debug!(
        node_count = agg.node_count,
        max_depth = agg.max_depth,
        estimated_size = root.size_estimate,
        rows = flat.len(),
        "built tree"
    );
    TreeOutcome {
        estimated_size: root.size_estimate,
        node_count: agg.node_count,
        max_depth: agg.max_depth,
        root,
        flat,
    }
}

fn build_node(
    key: &str,
    value: &Value,
    path: String,
    depth: usize,
    expanded: &HashSet<String>,
    limits: TreeLimits,
    agg: &mut Aggregates,
) -> Node {
    agg.visit(depth);
    let node_type = JsonType::of(value);

    if !node_type.is_container() {
        return Node {
            id: path.clone(),
            key: key.to_string(),
            value: Some(value.clone()),
            node_type,
            depth,
            path,
            children: Vec::new(),
            size_estimate: scalar_size(value),
            child_count: 0,
            truncation: None,
        };
    }

    let child_count = match value {
        Value::Object(map) => map.len(),
        Value::Array(arr) => arr.len(),
        _ => 0,
    };

    let mut truncation = None;
    let mut children = Vec::new();
    let mut size = CONTAINER_OVERHEAD;

    if depth >= limits.max_depth {
        truncation = Some(Truncation::MaxDepth);
        trace!(%path, depth, "depth guard truncated container");
    } else {
        if child_count > MAX_EXPANDABLE_CHILDREN {
            truncation = Some(Truncation::FanOut);
            trace!(%path, child_count, "fan-out breaker engaged");
        }
        let materialize = truncation.is_none() && expanded.contains(&path);
        match value {
            Value::Object(map) => {
                for (k, v) in map {
                    let key_charge = 2 * k.chars().count() as u64;
                    if materialize {
                        let child_path = format!("{path}.{k}");
                        let child = build_node(k, v, child_path, depth + 1, expanded, limits, agg);
                        size += key_charge + child.size_estimate;
                        children.push(child);
                    } else {
                        size += key_charge + measure(v, depth + 1, limits, agg);
                    }
                }
            }
            Value::Array(arr) => {
                for (index, v) in arr.iter().enumerate() {
                    if materialize {
                        let child_path = format!("{path}[{index}]");
                        let child = build_node(
                            &index.to_string(),
                            v,
                            child_path,
                            depth + 1,
                            expanded,
                            limits,
                            agg,
                        );
                        size += child.size_estimate;
                        children.push(child);
                    } else {
                        size += measure(v, depth + 1, limits, agg);
                    }
                }
            }
            _ => unreachable!("containers only"),
        }
    }

    Node {
        id: path.clone(),
        key: key.to_string(),
        value: None,
        node_type,
        depth,
        path,
        children,
        size_estimate: size,
        child_count,
        truncation,
    }
}

/// Stats-only walk for subtrees whose nodes are not materialized
/// (collapsed or fan-out-truncated containers).
fn measure(value: &Value, depth: usize, limits: TreeLimits, agg: &mut Aggregates) -> u64 {
    agg.visit(depth);
    match value {
        Value::Null | Value::Bool(_) => 4,
        Value::Number(_) => 8,
        Value::String(s) => 2 * s.chars().count() as u64,
        Value::Object(map) => {
            let mut size = CONTAINER_OVERHEAD;
            if depth < limits.max_depth {
                for (k, v) in map {
                    size += 2 * k.chars().count() as u64 + measure(v, depth + 1, limits, agg);
                }
            }
            size
        }
        Value::Array(arr) => {
            let mut size = CONTAINER_OVERHEAD;
            if depth < limits.max_depth {
                for v in arr {
                    size += measure(v, depth + 1, limits, agg);
                }
            }
            size
        }
    }
}

fn scalar_size(value: &Value) -> u64 {
    match value {
        Value::Null | Value::Bool(_) => 4,
        Value::Number(_) => 8,
        Value::String(s) => 2 * s.chars().count() as u64,
        Value::Object(_) | Value::Array(_) => 0,
    }
}

/// Pre-order flattening into the exact list of rows to render. A node's
/// children appear only when its id is in the expansion set. Independent of
/// the search filter, which applies afterwards.
pub fn flatten(root: &Node, expanded: &HashSet<String>) -> Vec<FlatNode> {
    let mut out = Vec::new();
    visit(root, expanded, &mut out);
    out
}

fn visit(node: &Node, expanded: &HashSet<String>, out: &mut Vec<FlatNode>) {
    let is_expanded = expanded.contains(&node.id);
    out.push(to_flat(node, is_expanded));
    if is_expanded {
        for child in &node.children {
            visit(child, expanded, out);
        }
    }
}

fn to_flat(node: &Node, expanded: bool) -> FlatNode {
    let preview = match (&node.value, node.node_type) {
        (Some(value), _) => format_value(value, DEFAULT_PREVIEW_LEN),
        (None, JsonType::Object) => format!("{{{} keys}}", node.child_count),
        (None, JsonType::Array) => format!("[{} items]", node.child_count),
        (None, _) => String::new(),
    };
    FlatNode {
        id: node.id.clone(),
        key: node.key.clone(),
        value: node.value.clone(),
        node_type: node.node_type,
        depth: node.depth,
        preview,
        child_count: node.child_count,
        has_children: node.child_count > 0,
        expanded,
        truncation: node.truncation,
    }
}
