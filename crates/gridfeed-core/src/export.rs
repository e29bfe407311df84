// JSON artifact writers.
//
// Every artifact is written to a sibling `.partial` file first and renamed
// into place, so readers see either the previous file or the complete new one.

use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::with_season;
use crate::model::{RosterRecord, SeasonDocument};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to serialize {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Resolve an output template for a season.
pub fn output_path(template: &str, season: u16) -> PathBuf {
    PathBuf::from(with_season(template, season))
}

/// Write the front-end season document.
pub fn write_season_document(path: &Path, document: &SeasonDocument) -> Result<(), ExportError> {
    write_json(path, document)
}

/// Write the identity-focused roster as a flat JSON array.
pub fn write_roster_records(path: &Path, records: &[RosterRecord]) -> Result<(), ExportError> {
    write_json(path, records)
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
/// Parent directories are created as needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ExportError> {
    let display = path.display().to_string();
    let io_err = |source: std::io::Error| ExportError::Io {
        path: display.clone(),
        source,
    };

    let body = serde_json::to_vec_pretty(value).map_err(|e| ExportError::Json {
        path: display.clone(),
        source: e,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let staging = partial_path(path);
    let mut file = std::fs::File::create(&staging).map_err(io_err)?;
    file.write_all(&body).map_err(io_err)?;
    file.write_all(b"\n").map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);

    std::fs::rename(&staging, path).map_err(io_err)?;
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}
