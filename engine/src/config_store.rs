//! Settings snapshots.
//!
//! Each save writes one JSON file to `<source_root>/config_file_mover/`,
//! named `config_<YYYYMMDD_HHMMSS>.json` from the local save time. Snapshots
//! are never rewritten or deleted by the engine. The JSON layout is shared
//! with earlier releases, so `exclude_patterns` stays a single comma-joined
//! string and `transfer_method` a lowercase word.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::enumerate::RESERVED_DIR_NAME;
use crate::error::EngineError;
use crate::model::{TransferMethod, TransferSettings};
use crate::pattern::{join_patterns, parse_patterns};
use crate::planner;

const FILE_PREFIX: &str = "config_";
const FILE_EXTENSION: &str = "json";
const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const CREATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Identifies one snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotId(PathBuf);

impl SnapshotId {
    /// Refer to a snapshot file by path, e.g. one picked by the user.
    pub fn from_path<P: Into<PathBuf>>(path: P) -> Self {
        SnapshotId(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// File stem, e.g. `config_20240101_120000`.
    pub fn name(&self) -> String {
        self.0
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A listed snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    pub id: SnapshotId,

    /// File modification time; listings are ordered by it, newest first
    pub modified: SystemTime,

    /// `created_at` as written in the file, if present
    pub created_at: Option<String>,

    pub settings: TransferSettings,
}

/// On-disk layout. Missing fields take the defaults below.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
struct SnapshotRecord {
    source_path: PathBuf,
    dest_path: PathBuf,
    exclude_patterns: String,
    preserve_structure: bool,
    transfer_method: TransferMethod,
    rename_duplicates: bool,
    created_at: String,
}

impl Default for SnapshotRecord {
    fn default() -> Self {
        SnapshotRecord {
            source_path: PathBuf::new(),
            dest_path: PathBuf::new(),
            exclude_patterns: String::new(),
            preserve_structure: true,
            transfer_method: TransferMethod::Copy,
            rename_duplicates: false,
            created_at: String::new(),
        }
    }
}

impl SnapshotRecord {
    fn from_settings(settings: &TransferSettings, created_at: String) -> Self {
        SnapshotRecord {
            source_path: settings.source_root.clone(),
            dest_path: settings.dest_root.clone(),
            exclude_patterns: join_patterns(&settings.exclude_patterns),
            preserve_structure: settings.preserve_structure,
            transfer_method: settings.transfer_method,
            rename_duplicates: settings.rename_duplicates,
            created_at,
        }
    }

    fn into_settings(self) -> TransferSettings {
        TransferSettings {
            source_root: self.source_path,
            dest_root: self.dest_path,
            exclude_patterns: parse_patterns(&self.exclude_patterns),
            preserve_structure: self.preserve_structure,
            transfer_method: self.transfer_method,
            rename_duplicates: self.rename_duplicates,
        }
    }
}

/// Folder holding the snapshots for `source_root`.
pub fn storage_dir<P: AsRef<Path>>(source_root: P) -> PathBuf {
    source_root.as_ref().join(RESERVED_DIR_NAME)
}

/// Validate `settings` and write them as a new snapshot under `source_root`.
///
/// Two saves within the same second get `_1`, `_2`, ... appended to the name
/// rather than replacing each other.
pub fn save_snapshot<P: AsRef<Path>>(
    settings: &TransferSettings,
    source_root: P,
) -> Result<SnapshotId, EngineError> {
    settings.validate()?;

    let dir = storage_dir(source_root);
    fs::create_dir_all(&dir).map_err(|e| EngineError::SnapshotWrite {
        path: dir.clone(),
        source: e,
    })?;

    let now = Local::now();
    let file_name = format!(
        "{}{}.{}",
        FILE_PREFIX,
        now.format(FILE_TIMESTAMP_FORMAT),
        FILE_EXTENSION
    );
    let path = planner::first_free(dir.join(file_name), |p| p.exists());

    let record = SnapshotRecord::from_settings(settings, now.format(CREATED_AT_FORMAT).to_string());
    let json = serde_json::to_string_pretty(&record).map_err(|e| EngineError::SnapshotWrite {
        path: path.clone(),
        source: io::Error::from(e),
    })?;

    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .and_then(|mut file| file.write_all(json.as_bytes()))
        .map_err(|e| EngineError::SnapshotWrite {
            path: path.clone(),
            source: e,
        })?;

    info!(snapshot = %path.display(), "Configuration saved");
    Ok(SnapshotId(path))
}

/// Read the settings stored in a snapshot.
///
/// # Errors
/// `SnapshotRead` if the file cannot be read, `SnapshotParse` if it is not a
/// valid snapshot. Nothing else is affected either way.
pub fn load_snapshot(id: &SnapshotId) -> Result<TransferSettings, EngineError> {
    let record = read_record(id.path())?;
    info!(snapshot = %id.path().display(), "Configuration loaded");
    Ok(record.into_settings())
}

/// All snapshots for `source_root`, newest first.
///
/// A missing storage folder means no snapshots. Files that cannot be read or
/// parsed are logged and left out.
pub fn list_snapshots<P: AsRef<Path>>(source_root: P) -> Result<Vec<SnapshotInfo>, EngineError> {
    let dir = storage_dir(source_root);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(&dir).map_err(|e| EngineError::SnapshotRead {
        path: dir.clone(),
        source: e,
    })?;

    let mut snapshots = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        let path = entry.path();
        if path.extension().map_or(true, |ext| ext != FILE_EXTENSION) || !path.is_file() {
            continue;
        }

        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                warn!(snapshot = %path.display(), error = %e, "Skipping snapshot without timestamp");
                continue;
            }
        };

        match read_record(&path) {
            Ok(record) => {
                let created_at = Some(record.created_at.clone()).filter(|s| !s.is_empty());
                snapshots.push(SnapshotInfo {
                    id: SnapshotId(path),
                    modified,
                    created_at,
                    settings: record.into_settings(),
                });
            }
            Err(err) => warn!("Skipping snapshot: {}", err.display_chain()),
        }
    }

    snapshots.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| b.id.path().cmp(a.id.path()))
    });
    Ok(snapshots)
}

fn read_record(path: &Path) -> Result<SnapshotRecord, EngineError> {
    let contents = fs::read_to_string(path).map_err(|e| EngineError::SnapshotRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&contents).map_err(|e| EngineError::SnapshotParse {
        path: path.to_path_buf(),
        source: e,
    })
}
