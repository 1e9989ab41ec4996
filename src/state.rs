use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::effects;
use crate::error::EngineError;
use crate::format::detect_format;
use crate::perf::classify;
use crate::search::{SearchFilter, SearchOptions};
use crate::tree::{build_tree, TreeLimits};
use crate::types::{DocumentStats, FlatNode, FormatInfo, Node, Performance, Validation};
use crate::validate::{validate, RawInput};

/// Constructor-supplied configuration for a [`JsonEngine`]. The initial
/// expansion set defaults to `{"root"}`.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Cap on the number of flattened rows a snapshot returns (the
    /// renderer's row budget). Distinct from the fixed per-container
    /// expansion breaker.
    pub max_nodes: Option<usize>,
    pub enable_performance_monitoring: bool,
    pub enable_validation: bool,
    pub enable_structure_analysis: bool,
    pub expanded_nodes: HashSet<String>,
    pub limits: TreeLimits,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_nodes: None,
            enable_performance_monitoring: true,
            enable_validation: true,
            enable_structure_analysis: true,
            expanded_nodes: std::iter::once("root".to_string()).collect(),
            limits: TreeLimits::default(),
        }
    }
}

/// Everything a rendering layer needs for one frame, derived fresh from the
/// latest (document, expansion, search term) triple. Superseded snapshots
/// are simply dropped; nothing is mutated in place.
#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot {
    pub is_valid: bool,
    pub error: Option<String>,
    /// The validated document value, shared, not serialized with the rest.
    #[serde(skip)]
    pub parsed_data: Option<Arc<Value>>,
    pub flat_nodes: Vec<FlatNode>,
    pub tree: Option<Node>,
    pub stats: Option<DocumentStats>,
    pub performance: Option<Performance>,
    pub format_info: Option<FormatInfo>,
}

impl ViewSnapshot {
    fn empty() -> Self {
        Self {
            is_valid: false,
            error: None,
            parsed_data: None,
            flat_nodes: Vec::new(),
            tree: None,
            stats: None,
            performance: None,
            format_info: None,
        }
    }
}

struct LoadedDocument {
    /// `None` when the last load failed to parse.
    value: Option<Arc<Value>>,
    is_valid: bool,
    error: Option<String>,
    stats: DocumentStats,
    format_info: Option<FormatInfo>,
}

struct EngineInner {
    doc: Option<LoadedDocument>,
    expanded: HashSet<String>,
    term: String,
    search_options: SearchOptions,
}

/// The engine owning the (document, expansion state, search term) triple.
///
/// All derivation is synchronous; a new input or state change simply makes
/// the next [`snapshot`](Self::snapshot) reflect it. The document itself is
/// immutable once loaded — a new one replaces it wholesale.
pub struct JsonEngine {
    options: EngineOptions,
    inner: RwLock<EngineInner>,
}

impl Default for JsonEngine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl JsonEngine {
    pub fn new(options: EngineOptions) -> Self {
        let inner = EngineInner {
            doc: None,
            expanded: options.expanded_nodes.clone(),
            term: String::new(),
            search_options: SearchOptions::default(),
        };
        Self {
            options,
            inner: RwLock::new(inner),
        }
    }

    /// Validate and load raw text, replacing any current document and
    /// resetting the expansion state to its initial set. Returns whether
    /// the input parsed.
    pub fn load_text(&self, text: &str) -> bool {
        let format_info = self
            .options
            .enable_validation
            .then(|| detect_format(text));
        self.install(validate(RawInput::Text(text.to_string())), format_info)
    }

    /// Load a pre-built value (the embed/share path); never rejected.
    pub fn load_value(&self, value: Value) -> bool {
        self.install(validate(RawInput::Value(value)), None)
    }

    fn install(&self, validation: Validation, format_info: Option<FormatInfo>) -> bool {
        let Validation {
            is_valid,
            error,
            parsed_data,
            stats,
        } = validation;
        debug!(is_valid, size_bytes = stats.size_bytes, "document replaced");
        let mut inner = self.inner.write();
        inner.doc = Some(LoadedDocument {
            value: parsed_data.map(Arc::new),
            is_valid,
            error,
            stats,
            format_info,
        });
        inner.expanded = self.options.expanded_nodes.clone();
        is_valid
    }

    /// Flip membership of `id` in the expansion set; returns the new state.
    pub fn toggle_expansion(&self, id: &str) -> bool {
        let mut inner = self.inner.write();
        if inner.expanded.remove(id) {
            false
        } else {
            inner.expanded.insert(id.to_string());
            true
        }
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.inner.read().expanded.contains(id)
    }

    pub fn set_search_term(&self, term: &str) {
        self.inner.write().term = term.to_string();
    }

    pub fn set_search_options(&self, options: SearchOptions) {
        self.inner.write().search_options = options;
    }

    /// Filter over the current term and options, for callers that run their
    /// own matching.
    pub fn create_search_filter(&self) -> SearchFilter {
        let inner = self.inner.read();
        SearchFilter::with_options(&inner.term, inner.search_options.clone())
    }

    /// The validated document value, if any.
    pub fn document(&self) -> Option<Arc<Value>> {
        self.inner.read().doc.as_ref().and_then(|d| d.value.clone())
    }

    /// Resolve a node identifier (`root.users[0].name`) against the current
    /// document. Keys containing `.` or `[` are not addressable through the
    /// dotted form.
    pub fn value_at(&self, id: &str) -> Option<Value> {
        let doc = self.document()?;
        resolve_id(&doc, id).cloned()
    }

    /// Derive a full view projection from the current state.
    pub fn snapshot(&self) -> ViewSnapshot {
        let inner = self.inner.read();
        let Some(doc) = &inner.doc else {
            return ViewSnapshot::empty();
        };

        let mut snapshot = ViewSnapshot {
            is_valid: doc.is_valid,
            error: doc.error.clone(),
            parsed_data: doc.value.clone(),
            format_info: doc.format_info.clone(),
            ..ViewSnapshot::empty()
        };

        let mut stats = doc.stats.clone();
        if let Some(value) = &doc.value {
            if self.options.enable_structure_analysis {
                let outcome = build_tree(value, &inner.expanded, self.options.limits);
                stats.node_count = outcome.node_count;
                stats.max_depth = outcome.max_depth;
                stats.estimated_size = outcome.estimated_size;

                let filter =
                    SearchFilter::with_options(&inner.term, inner.search_options.clone());
                let mut flat = filter.filter(&outcome.flat);
                if let Some(cap) = self.options.max_nodes {
                    flat.truncate(cap);
                }
                snapshot.flat_nodes = flat;
                snapshot.tree = Some(outcome.root);
            }
            if self.options.enable_performance_monitoring {
                snapshot.performance = Some(classify(&stats));
            }
        }
        snapshot.stats = Some(stats);
        snapshot
    }

    /// Copy the current document to the system clipboard.
    pub fn copy_to_clipboard(&self) -> Result<(), EngineError> {
        let doc = self.document();
        effects::copy_to_clipboard(doc.as_deref())
    }

    /// Export the current document into `dir`; `None` picks the default
    /// `json-data-<epoch-ms>.json` name.
    pub fn export_json(
        &self,
        dir: &Path,
        filename: Option<&str>,
    ) -> Result<PathBuf, EngineError> {
        let doc = self.document();
        effects::export_json(doc.as_deref(), dir, filename)
    }
}

fn resolve_id<'a>(root: &'a Value, id: &str) -> Option<&'a Value> {
    let mut rest = id.strip_prefix("root")?;
    let mut current = root;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('.') {
            let end = after
                .find(|c| c == '.' || c == '[')
                .unwrap_or(after.len());
            current = current.get(&after[..end])?;
            rest = &after[end..];
        } else if let Some(after) = rest.strip_prefix('[') {
            let close = after.find(']')?;
            let index: usize = after[..close].parse().ok()?;
            current = current.get(index)?;
            rest = &after[close + 1..];
        } else {
            return None;
        }
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PerformanceLevel;
    use serde_json::json;

    #[test]
    fn fresh_engine_has_an_empty_snapshot() {
        let engine = JsonEngine::default();
        let snap = engine.snapshot();
        assert!(!snap.is_valid);
        assert_eq!(snap.error, None);
        assert!(snap.flat_nodes.is_empty());
        assert!(snap.tree.is_none());
        assert!(snap.stats.is_none());
    }

    #[test]
    fn loading_text_derives_the_full_projection() {
        let engine = JsonEngine::default();
        assert!(engine.load_text(r#"{"a":1,"b":[1,2,3]}"#));

        let snap = engine.snapshot();
        assert!(snap.is_valid);
        let ids: Vec<&str> = snap.flat_nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["root", "root.a", "root.b"]);

        let stats = snap.stats.unwrap();
        assert_eq!(stats.top_level_count, 2);
        assert_eq!(stats.node_count, 6); // root + a + b + 3 elements
        assert_eq!(stats.max_depth, 2);
        assert!(stats.estimated_size > 0);

        assert_eq!(snap.performance.unwrap().level, PerformanceLevel::Excellent);
        assert!(snap.format_info.unwrap().is_minified);
    }

    #[test]
    fn invalid_text_still_renders_an_error_state() {
        let engine = JsonEngine::default();
        assert!(!engine.load_text(r#"{"a":1,}"#));

        let snap = engine.snapshot();
        assert!(!snap.is_valid);
        assert!(snap.error.is_some());
        assert!(snap.flat_nodes.is_empty());
        assert!(snap.tree.is_none());
        assert!(snap.performance.is_none());
        // the validator's own stats survive for the error panel
        assert!(snap.stats.unwrap().size_bytes > 0);
    }

    #[test]
    fn toggling_expansion_changes_the_rows() {
        let engine = JsonEngine::default();
        engine.load_text(r#"{"a":{"x":1}}"#);
        assert_eq!(engine.snapshot().flat_nodes.len(), 2);

        assert!(engine.toggle_expansion("root.a"));
        assert_eq!(engine.snapshot().flat_nodes.len(), 3);

        assert!(!engine.toggle_expansion("root.a"));
        assert_eq!(engine.snapshot().flat_nodes.len(), 2);
    }

    #[test]
    fn replacing_the_document_resets_expansion() {
        let engine = JsonEngine::default();
        engine.load_text(r#"{"a":{"x":1}}"#);
        engine.toggle_expansion("root.a");
        assert!(engine.is_expanded("root.a"));

        engine.load_text(r#"{"a":{"x":2}}"#);
        assert!(engine.is_expanded("root"));
        assert!(!engine.is_expanded("root.a"));
    }

    #[test]
    fn search_term_filters_the_projection() {
        let engine = JsonEngine::default();
        engine.load_text(r#"{"user":{"name":"Alice"},"other":1}"#);
        engine.toggle_expansion("root.user");

        engine.set_search_term("alice");
        let snap = engine.snapshot();
        assert_eq!(snap.flat_nodes.len(), 1);
        assert_eq!(snap.flat_nodes[0].id, "root.user.name");

        engine.set_search_term("");
        assert_eq!(engine.snapshot().flat_nodes.len(), 4);
    }

    #[test]
    fn max_nodes_caps_the_rows() {
        let engine = JsonEngine::new(EngineOptions {
            max_nodes: Some(3),
            ..EngineOptions::default()
        });
        engine.load_value(json!((0..10).collect::<Vec<i64>>()));
        assert_eq!(engine.snapshot().flat_nodes.len(), 3);
    }

    #[test]
    fn disabled_sections_stay_empty() {
        let engine = JsonEngine::new(EngineOptions {
            enable_performance_monitoring: false,
            enable_structure_analysis: false,
            enable_validation: false,
            ..EngineOptions::default()
        });
        engine.load_text(r#"{"a":1}"#);
        let snap = engine.snapshot();
        assert!(snap.is_valid);
        assert!(snap.performance.is_none());
        assert!(snap.format_info.is_none());
        assert!(snap.tree.is_none());
        assert!(snap.flat_nodes.is_empty());
    }

    #[test]
    fn custom_initial_expansion() {
        let engine = JsonEngine::new(EngineOptions {
            expanded_nodes: ["root", "root.a"].iter().map(|s| s.to_string()).collect(),
            ..EngineOptions::default()
        });
        engine.load_text(r#"{"a":{"x":1}}"#);
        assert_eq!(engine.snapshot().flat_nodes.len(), 3);
    }

    #[test]
    fn value_at_resolves_dotted_ids() {
        let engine = JsonEngine::default();
        engine.load_text(r#"{"users":[{"name":"Alice"}]}"#);
        assert_eq!(engine.value_at("root"), engine.document().map(|d| (*d).clone()));
        assert_eq!(engine.value_at("root.users[0].name"), Some(json!("Alice")));
        assert_eq!(engine.value_at("root.users[1]"), None);
        assert_eq!(engine.value_at("bogus"), None);
    }

    #[test]
    fn effects_without_a_document_report_no_data() {
        let engine = JsonEngine::default();
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            engine.export_json(dir.path(), None),
            Err(EngineError::NoData)
        ));
        assert!(matches!(
            engine.copy_to_clipboard(),
            Err(EngineError::NoData)
        ));
    }

    #[test]
    fn export_round_trips_the_document() {
        let engine = JsonEngine::default();
        engine.load_text(r#"{"a":1,"b":[true,null]}"#);
        let dir = tempfile::tempdir().unwrap();
        let path = engine.export_json(dir.path(), Some("doc.json")).unwrap();
        let reparsed: Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(Some(reparsed), engine.value_at("root"));
    }
}
