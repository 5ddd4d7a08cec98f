//! Whole-file JSON documents.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::{Result, StoreError};

/// Read a document, falling back to `T::default()`.
///
/// A missing file is the normal "no data yet" case. Unreadable or malformed
/// files are logged and also treated as empty.
pub fn load_document<T: DeserializeOwned + Default>(path: &Path) -> T {
    match try_load(path) {
        Ok(Some(doc)) => doc,
        Ok(None) => T::default(),
        Err(e) => {
            warn!("Error loading {}: {}", path.display(), e);
            T::default()
        }
    }
}

fn try_load<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
}

/// Write a document as pretty JSON.
///
/// The content goes to a sibling temp file first and is renamed over the
/// target, so readers never observe a half-written document.
pub fn save_document<T: Serialize>(path: &Path, doc: &T) -> Result<()> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let contents = serde_json::to_string_pretty(doc).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = temp_path(path);
    fs::write(&tmp, contents).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
