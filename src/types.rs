use serde::Serialize;
use serde_json::Value;

/// Inferred type of a JSON value, mirroring the `serde_json::Value` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
}

impl JsonType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => JsonType::Object,
            Value::Array(_) => JsonType::Array,
            Value::String(_) => JsonType::String,
            Value::Number(_) => JsonType::Number,
            Value::Bool(_) => JsonType::Boolean,
            Value::Null => JsonType::Null,
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, JsonType::Object | JsonType::Array)
    }
}

/// Why a container node has no materialized children despite having entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Truncation {
    /// Nesting exceeded the configured depth guard.
    MaxDepth,
    /// Entry count exceeded the fixed per-container expansion limit.
    FanOut,
}

/// One element of the tree representation of a document.
///
/// The identifier doubles as the node's path (`root`, `root.users[0].name`);
/// it is derived deterministically so rebuilding the tree for unchanged data
/// yields identical ids, which is what keeps expand/collapse state stable.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: String,
    pub key: String,
    /// Raw leaf value; present for scalars only, containers omit it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub node_type: JsonType,
    pub depth: usize,
    pub path: String,
    /// Materialized only when this node is expanded and under the fan-out limit.
    pub children: Vec<Node>,
    /// Heuristic size in units, not an exact byte count.
    pub size_estimate: u64,
    pub child_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncation: Option<Truncation>,
}

/// One visible row of the flattened (pre-order) projection.
#[derive(Debug, Clone, Serialize)]
pub struct FlatNode {
    pub id: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub node_type: JsonType,
    pub depth: usize,
    pub preview: String,
    pub child_count: usize,
    pub has_children: bool,
    pub expanded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncation: Option<Truncation>,
}

/// Shape of the document's top-level value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TopLevelShape {
    Object,
    Array,
    Primitive,
    Null,
}

/// Basic statistics for a validated document. `node_count`, `max_depth` and
/// `estimated_size` start at zero and are filled in by the tree builder.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentStats {
    pub node_count: usize,
    pub max_depth: usize,
    /// Serialized byte length of the raw input.
    pub size_bytes: usize,
    /// Heuristic size in units (see the tree builder), used for classification.
    pub estimated_size: u64,
    pub parse_ms: f64,
    pub shape: TopLevelShape,
    /// Top-level key count for objects, element count for arrays, 0 otherwise.
    pub top_level_count: usize,
}

impl DocumentStats {
    pub fn empty() -> Self {
        Self {
            node_count: 0,
            max_depth: 0,
            size_bytes: 0,
            estimated_size: 0,
            parse_ms: 0.0,
            shape: TopLevelShape::Null,
            top_level_count: 0,
        }
    }
}

/// Result of validating raw input. Parse failures are represented here as
/// data rather than as an `Err`, so a renderer can always show something.
#[derive(Debug, Clone, Serialize)]
pub struct Validation {
    pub is_valid: bool,
    pub error: Option<String>,
    pub parsed_data: Option<Value>,
    pub stats: DocumentStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceLevel {
    Excellent,
    Good,
    Warning,
    Critical,
}

/// Derived, non-persistent verdict about document size; recomputed whenever
/// the document changes.
#[derive(Debug, Clone, Serialize)]
pub struct Performance {
    pub level: PerformanceLevel,
    pub is_large: bool,
    pub is_very_large: bool,
    pub should_virtualize: bool,
    pub recommendations: Vec<String>,
}

/// Heuristic description of how the raw text was formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatInfo {
    pub is_minified: bool,
    pub indentation: usize,
    pub line_count: usize,
    pub has_trailing_comma: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Key,
    Value,
    Path,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchMatch {
    pub node: FlatNode,
    pub match_kind: MatchKind,
    pub match_text: String,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchMatch>,
    pub total_count: usize,
    pub has_more: bool,
}
