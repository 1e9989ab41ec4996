//! Structure engine for a JSON viewer.
//!
//! Raw input flows one way: validation ([`validate`]) produces a document,
//! the tree builder ([`build_tree`]) turns it into a stable-identity node
//! graph, and [`JsonEngine`] derives flattened, searched and
//! performance-classified projections for a rendering layer. Expansion and
//! search changes feed back into the derivation but never mutate the
//! validated document.

pub mod effects;
pub mod error;
pub mod format;
pub mod perf;
pub mod search;
pub mod state;
pub mod tree;
pub mod types;
pub mod validate;

pub use effects::{copy_to_clipboard, default_export_name, export_json};
pub use error::EngineError;
pub use format::{detect_format, format_value};
pub use perf::classify;
pub use search::{AncestorPolicy, SearchFilter, SearchOptions};
pub use state::{EngineOptions, JsonEngine, ViewSnapshot};
pub use tree::{build_tree, flatten, TreeLimits, TreeOutcome, MAX_EXPANDABLE_CHILDREN};
pub use types::{
    DocumentStats, FlatNode, FormatInfo, JsonType, MatchKind, Node, Performance,
    PerformanceLevel, SearchMatch, SearchResponse, TopLevelShape, Truncation, Validation,
};
pub use validate::{validate, RawInput};
