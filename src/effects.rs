use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::debug;

use crate::error::EngineError;

/// The two imperative, user-triggered actions of the engine. Unlike the
/// derived projections these can genuinely fail (platform clipboard, disk),
/// so they surface errors through `Result`; failures are reported once and
/// never retried.

/// Copy a pretty-printed rendition of `data` to the system clipboard.
pub fn copy_to_clipboard(data: Option<&Value>) -> Result<(), EngineError> {
    let value = data.ok_or(EngineError::NoData)?;
    let serialized = serde_json::to_string_pretty(value)?;
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| EngineError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(serialized)
        .map_err(|e| EngineError::Clipboard(e.to_string()))?;
    debug!("copied document to clipboard");
    Ok(())
}

/// Default export name: `json-data-<epoch-ms>.json`.
pub fn default_export_name() -> String {
    let epoch_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("json-data-{epoch_ms}.json")
}

/// Write `data` into `dir` as pretty-printed (2-space) JSON and return the
/// full path. Pretty-printing is lossless for the supported value space, so
/// re-parsing the file yields the original value.
pub fn export_json(
    data: Option<&Value>,
    dir: &Path,
    filename: Option<&str>,
) -> Result<PathBuf, EngineError> {
    let value = data.ok_or(EngineError::NoData)?;
    let name = filename.map_or_else(default_export_name, str::to_string);
    let path = dir.join(name);
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(&path, serialized)?;
    debug!(path = %path.display(), "exported document");
    Ok(path)
}
