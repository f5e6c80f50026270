use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::Local;

use super::{Database, StoreError};

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const STAMP_LEN: usize = 15;

/// Single owner of a database file. Every write goes through
/// snapshot-then-atomic-replace; the file is never edited in place.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    backup_dir: PathBuf,
}

impl Store {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut path = path.into();
        // A bare file name has an empty parent; anchor it so the temp file
        // for atomic writes lands next to the database.
        if path.parent().is_some_and(|p| p.as_os_str().is_empty()) {
            path = Path::new(".").join(path);
        }
        let backup_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self { path, backup_dir }
    }

    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = dir.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn load(&self) -> Result<Database, StoreError> {
        let text = fs::read_to_string(&self.path).map_err(StoreError::io(&self.path))?;
        let db = Database::from_json_str(&text)?;
        tracing::info!(
            path = %self.path.display(),
            organizations = db.organizations.len(),
            shape = shape_name(&db),
            "database loaded"
        );
        Ok(db)
    }

    /// Snapshots the current file (if any), then atomically replaces it with
    /// `db`. Returns the snapshot path.
    pub fn commit(&self, db: &Database) -> Result<Option<PathBuf>, StoreError> {
        let text = db.to_json_string()?;
        let snapshot = self.snapshot()?;
        self.write_atomic(&text)?;
        tracing::info!(
            path = %self.path.display(),
            organizations = db.organizations.len(),
            "database written"
        );
        Ok(snapshot)
    }

    /// Copies the current database file into the backup directory. Returns
    /// `None` when there is no file yet.
    pub fn snapshot(&self) -> Result<Option<PathBuf>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        fs::create_dir_all(&self.backup_dir).map_err(StoreError::io(&self.backup_dir))?;
        let target = self.next_backup_path();
        fs::copy(&self.path, &target).map_err(StoreError::io(&target))?;
        tracing::info!(backup = %target.display(), "snapshot written");
        Ok(Some(target))
    }

    /// Snapshots of this database, oldest first.
    pub fn backups(&self) -> Result<Vec<PathBuf>, StoreError> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = self.backup_prefix();
        let mut found = Vec::new();
        for entry in fs::read_dir(&self.backup_dir).map_err(StoreError::io(&self.backup_dir))? {
            let entry = entry.map_err(StoreError::io(&self.backup_dir))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let stem = name
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_suffix(".json"));
            if let Some(stem) = stem {
                let (stamp, seq) = backup_order(stem);
                found.push((stamp.to_string(), seq, entry.path()));
            }
        }
        found.sort();
        Ok(found.into_iter().map(|(_, _, path)| path).collect())
    }

    /// Replaces the database with `backup`. The backup must parse as a
    /// database; the current file is snapshotted first.
    pub fn restore(&self, backup: &Path) -> Result<Option<PathBuf>, StoreError> {
        if !backup.is_file() {
            return Err(StoreError::MissingBackup(backup.to_path_buf()));
        }
        let text = fs::read_to_string(backup).map_err(StoreError::io(backup))?;
        let db = Database::from_json_str(&text)?;
        let snapshot = self.snapshot()?;
        self.write_atomic(&text)?;
        tracing::info!(
            from = %backup.display(),
            path = %self.path.display(),
            organizations = db.organizations.len(),
            "database restored"
        );
        Ok(snapshot)
    }

    fn write_atomic(&self, text: &str) -> Result<(), StoreError> {
        AtomicFile::new(&self.path, OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(text.as_bytes()))
            .map_err(|e| match e {
                atomicwrites::Error::Internal(source) | atomicwrites::Error::User(source) => {
                    StoreError::Io {
                        path: self.path.clone(),
                        source,
                    }
                }
            })
    }

    fn backup_prefix(&self) -> String {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "database".to_string());
        format!("{stem}_backup_")
    }

    fn next_backup_path(&self) -> PathBuf {
        let base = format!(
            "{}{}",
            self.backup_prefix(),
            Local::now().format(STAMP_FORMAT)
        );
        let mut candidate = self.backup_dir.join(format!("{base}.json"));
        let mut n = 1usize;
        while candidate.exists() {
            candidate = self.backup_dir.join(format!("{base}_{n}.json"));
            n += 1;
        }
        candidate
    }
}

/// Sort key for a snapshot name stripped of prefix and extension:
/// timestamp, then collision counter (none sorts first).
fn backup_order(stem: &str) -> (&str, u64) {
    match stem.split_at_checked(STAMP_LEN) {
        Some((stamp, "")) => (stamp, 0),
        Some((stamp, rest)) => {
            let seq = rest
                .strip_prefix('_')
                .and_then(|n| n.parse().ok())
                .unwrap_or(u64::MAX);
            (stamp, seq)
        }
        None => (stem, 0),
    }
}

fn shape_name(db: &Database) -> &'static str {
    match db.shape {
        super::DatabaseShape::Bare => "array",
        super::DatabaseShape::Wrapped { .. } => "wrapped",
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/store.rs"]
mod tests;
