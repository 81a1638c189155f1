//! JSON output

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::Builder;

use crate::error::SummaryError;

const INDENT: &[u8] = b"    ";

/// Serialize data structure to a pretty-printed JSON string
pub fn to_json<T: Serialize>(data: &T) -> Result<String> {
    let bytes = to_json_bytes(data).context("Failed to serialize to JSON")?;
    String::from_utf8(bytes).context("Serialized JSON is not valid UTF-8")
}

fn to_json_bytes<T: Serialize>(data: &T) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(INDENT));
    data.serialize(&mut serializer)?;
    Ok(out)
}

/// Write data structure to a JSON file.
///
/// The document is written to a temporary file next to `path` and moved
/// into place once complete, so a failed run never leaves a partial file.
/// A replaced file keeps its permissions; a new one gets the usual
/// umask-derived mode.
pub fn write_json_file<T: Serialize, P: AsRef<Path>>(data: &T, path: P) -> Result<(), SummaryError> {
    let path = path.as_ref();
    let wrap = |source: io::Error| SummaryError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    let bytes = to_json_bytes(data).map_err(|e| wrap(io::Error::other(e)))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // The process umask applies on creation.
        builder.permissions(fs::Permissions::from_mode(0o666));
    }

    let mut tmp = builder.tempfile_in(dir).map_err(wrap)?;
    tmp.write_all(&bytes).map_err(wrap)?;
    if let Ok(existing) = fs::metadata(path) {
        tmp.as_file().set_permissions(existing.permissions()).map_err(wrap)?;
    }
    tmp.as_file().sync_all().map_err(wrap)?;
    tmp.persist(path).map_err(|e| wrap(e.error))?;

    Ok(())
}
