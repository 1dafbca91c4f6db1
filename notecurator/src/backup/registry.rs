//! Per-directory JSON index of backup records, newest first.

use crate::config::defaults;
use crate::error::{CuratorError, CuratorResult};
use crate::notes::file_ops;
use notecurator_types::BackupRecord;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub fn registry_path(backup_dir: &Path) -> PathBuf {
    backup_dir.join(defaults::REGISTRY_FILE)
}

/// Loaded registry plus a warning when the file had to be discarded
#[derive(Debug, Default)]
pub struct LoadedRegistry {
    pub records: Vec<BackupRecord>,
    pub warning: Option<String>,
}

/// Read the registry in `backup_dir`. Missing means empty; corrupt means empty plus a warning.
pub fn load(backup_dir: &Path) -> LoadedRegistry {
    let path = registry_path(backup_dir);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return LoadedRegistry::default(),
        Err(e) => {
            let msg = format!("Backup registry {} unreadable ({}), starting fresh", path.display(), e);
            log::warn!("[BACKUP] {}", msg);
            return LoadedRegistry {
                records: Vec::new(),
                warning: Some(msg),
            };
        }
    };

    match serde_json::from_str::<Vec<BackupRecord>>(&content) {
        Ok(mut records) => {
            sort_newest_first(&mut records);
            LoadedRegistry {
                records,
                warning: None,
            }
        }
        Err(e) => {
            let msg = format!("Backup registry {} is corrupt ({}), starting fresh", path.display(), e);
            log::warn!("[BACKUP] {}", msg);
            LoadedRegistry {
                records: Vec::new(),
                warning: Some(msg),
            }
        }
    }
}

/// Write the registry through a temp file + rename.
pub fn save(backup_dir: &Path, records: &[BackupRecord]) -> CuratorResult<()> {
    let path = registry_path(backup_dir);
    let json = serde_json::to_string_pretty(records)
        .map_err(|e| CuratorError::io(&path, io::Error::other(e)))?;
    file_ops::write_note(&path, &json).map_err(|e| CuratorError::io(&path, e))
}

pub fn sort_newest_first(records: &mut [BackupRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    fn record(name: &str, age_hours: i64) -> BackupRecord {
        BackupRecord {
            original_path: PathBuf::from("/notes/a.md"),
            backup_path: PathBuf::from(format!("/b/{}", name)),
            created_at: Utc::now() - Duration::hours(age_hours),
            size: 1,
            checksum: "00".to_string(),
        }
    }

    #[test]
    fn test_save_and_load_sorted() {
        let dir = tempdir().unwrap();
        save(dir.path(), &[record("old", 5), record("new", 1)]).unwrap();
        let loaded = load(dir.path());
        assert!(loaded.warning.is_none());
        assert_eq!(loaded.records[0].backup_path, PathBuf::from("/b/new"));
    }

    #[test]
    fn test_corrupt_registry_starts_fresh() {
        let dir = tempdir().unwrap();
        fs::write(registry_path(dir.path()), "[{broken").unwrap();
        let loaded = load(dir.path());
        assert!(loaded.records.is_empty());
        assert!(loaded.warning.unwrap().contains("corrupt"));
    }

    #[test]
    fn test_missing_registry_is_empty() {
        let dir = tempdir().unwrap();
        let loaded = load(dir.path());
        assert!(loaded.records.is_empty());
        assert!(loaded.warning.is_none());
    }
}
