use thiserror::Error;

/// Failures from the imperative effects boundary (clipboard, export).
///
/// Everything derived — parsing, tree building, classification — reports
/// problems as data instead; only the two user-triggered one-shot actions
/// go through `Result`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no document loaded")]
    NoData,
    #[error("clipboard: {0}")]
    Clipboard(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}
