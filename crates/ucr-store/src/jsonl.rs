//! JSONL storage: one line per snapshot.
//!
//! The portable history format. Lines are never edited in place; a save
//! rewrites the file through a temp file + fsync + rename, so readers see
//! either the old history or the new one. Writers serialize on a sibling
//! `.lock` file created with `create_new`, so the read-check-write of a save
//! is exclusive across handles and processes.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use ucr_kernel::LineageId;

use crate::snapshot::{SaveRequest, Snapshot, SnapshotSummary};
use crate::store::{MemorySnapshotStore, SnapshotStore, StoreError, next_version};

/// Errors from JSONL operations.
#[derive(Debug, thiserror::Error)]
pub enum JsonlError {
    #[error("line {0}: I/O error: {1}")]
    Io(usize, String),

    #[error("line {0}: parse error: {1}")]
    Parse(usize, String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("corrupted history: {0}")]
    Corrupt(String),
}

/// Read snapshots from a JSONL reader. Blank lines and `#` comments are skipped.
pub fn read_snapshots(reader: impl BufRead) -> Result<Vec<Snapshot>, JsonlError> {
    let mut snapshots = Vec::new();
    let mut seen = BTreeSet::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| JsonlError::Io(line_no + 1, e.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let snapshot: Snapshot = serde_json::from_str(trimmed)
            .map_err(|e| JsonlError::Parse(line_no + 1, e.to_string()))?;
        if !seen.insert((snapshot.lineage_id, snapshot.version)) {
            return Err(JsonlError::Corrupt(format!(
                "line {}: duplicate version {} for lineage {}",
                line_no + 1,
                snapshot.version,
                snapshot.lineage_id
            )));
        }
        snapshots.push(snapshot);
    }
    Ok(snapshots)
}

/// Write snapshots to a JSONL writer.
pub fn write_snapshots(writer: &mut impl Write, snapshots: &[Snapshot]) -> Result<(), JsonlError> {
    for snapshot in snapshots {
        let line =
            serde_json::to_string(snapshot).map_err(|e| JsonlError::Serialize(e.to_string()))?;
        writeln!(writer, "{line}").map_err(|e| JsonlError::Io(0, e.to_string()))?;
    }
    Ok(())
}

/// Read snapshots from a JSONL file. A missing file is an empty history.
pub fn read_snapshots_from_path(path: impl AsRef<Path>) -> Result<Vec<Snapshot>, JsonlError> {
    let path = path.as_ref();
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(JsonlError::Io(0, format!("{}: {e}", path.display()))),
    };
    validate_history_bytes(path, &bytes)?;
    read_snapshots(BufReader::new(bytes.as_slice()))
}

/// Replace the JSONL file at `path` atomically.
pub fn write_snapshots_to_path(
    path: impl AsRef<Path>,
    snapshots: &[Snapshot],
) -> Result<(), JsonlError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| JsonlError::Io(0, format!("{parent:?}: {e}")))?;
    }

    let tmp_path = tmp_write_path(path);
    let write_result = (|| -> Result<(), JsonlError> {
        let file = File::create(&tmp_path)
            .map_err(|e| JsonlError::Io(0, format!("{}: {e}", tmp_path.display())))?;
        let mut writer = BufWriter::new(file);
        write_snapshots(&mut writer, snapshots)?;
        writer
            .flush()
            .map_err(|e| JsonlError::Io(0, format!("{}: {e}", tmp_path.display())))?;
        let file = writer
            .into_inner()
            .map_err(|e| JsonlError::Io(0, format!("{}: {e}", tmp_path.display())))?;
        file.sync_all()
            .map_err(|e| JsonlError::Io(0, format!("{}: {e}", tmp_path.display())))?;
        Ok(())
    })();

    if let Err(error) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        JsonlError::Io(
            0,
            format!("{} -> {}: {e}", tmp_path.display(), path.display()),
        )
    })?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        let dir = File::open(parent)
            .map_err(|e| JsonlError::Io(0, format!("{}: {e}", parent.display())))?;
        dir.sync_all()
            .map_err(|e| JsonlError::Io(0, format!("{}: {e}", parent.display())))?;
    }

    Ok(())
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}

fn validate_history_bytes(path: &Path, bytes: &[u8]) -> Result<(), JsonlError> {
    if bytes.contains(&0) {
        return Err(JsonlError::Corrupt(format!(
            "{}: contains NUL byte(s)",
            path.display()
        )));
    }
    if std::str::from_utf8(bytes).is_err() {
        return Err(JsonlError::Corrupt(format!(
            "{}: contains non-UTF-8 byte sequence(s)",
            path.display()
        )));
    }
    Ok(())
}

/// Path of the writer lock for a history file: `<path>.lock`.
pub fn history_lock_path(history_path: &Path) -> PathBuf {
    let mut path: OsString = history_path.as_os_str().to_os_string();
    path.push(".lock");
    PathBuf::from(path)
}

/// Exclusive hold on a history file's `.lock`, released on drop.
struct HistoryLockGuard {
    lock_path: PathBuf,
    _file: File,
}

impl HistoryLockGuard {
    fn acquire(history_path: &Path) -> Result<Self, StoreError> {
        let lock_path = history_lock_path(history_path);
        let lock_io = |message: String| StoreError::LockIo {
            lock_path: lock_path.display().to_string(),
            message,
        };
        if let Some(parent) = lock_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| lock_io(e.to_string()))?;
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(mut file) => {
                let _ = writeln!(
                    file,
                    "pid={}\nutc={}",
                    std::process::id(),
                    Utc::now().to_rfc3339()
                );
                Ok(Self {
                    lock_path,
                    _file: file,
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::warn!(lock = %lock_path.display(), "history lock busy");
                Err(StoreError::LockBusy {
                    lock_path: lock_path.display().to_string(),
                })
            }
            Err(err) => Err(lock_io(err.to_string())),
        }
    }
}

impl Drop for HistoryLockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// Snapshot store persisted as a single JSONL file.
///
/// Reads re-load the file on every call. A save holds the `.lock` guard
/// across read, version check, write and rename, so a handle whose view is
/// stale gets `VersionConflict` and a handle that finds the lock taken gets
/// `LockBusy`. Neither is retried here.
#[derive(Debug, Clone)]
pub struct JsonlSnapshotStore {
    path: PathBuf,
}

impl JsonlSnapshotStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<MemorySnapshotStore, StoreError> {
        let snapshots = read_snapshots_from_path(&self.path)?;
        Ok(MemorySnapshotStore::from_snapshots(snapshots))
    }
}

impl SnapshotStore for JsonlSnapshotStore {
    fn get_snapshot(
        &self,
        lineage: &LineageId,
        version: u64,
    ) -> Result<Option<Snapshot>, StoreError> {
        self.load()?.get_snapshot(lineage, version)
    }

    fn latest_version(&self, lineage: &LineageId) -> Result<Option<u64>, StoreError> {
        self.load()?.latest_version(lineage)
    }

    fn versions(&self, lineage: &LineageId) -> Result<Vec<SnapshotSummary>, StoreError> {
        self.load()?.versions(lineage)
    }

    fn save_snapshot(
        &self,
        lineage: &LineageId,
        request: SaveRequest,
    ) -> Result<Snapshot, StoreError> {
        let _guard = HistoryLockGuard::acquire(&self.path)?;

        let mut snapshots = read_snapshots_from_path(&self.path)?;
        let actual = snapshots
            .iter()
            .filter(|s| &s.lineage_id == lineage)
            .map(|s| s.version)
            .max();
        let version = next_version(lineage, request.expected_latest, actual)?;
        let snapshot = Snapshot::from_request(*lineage, version, request)?;

        snapshots.push(snapshot.clone());
        write_snapshots_to_path(&self.path, &snapshots)?;
        Ok(snapshot)
    }
}
