//! Backups with checksummed restore points.
//!
//! Backups live next to the vault (`<vault>/.notecurator/backups`) or in the
//! global fallback directory for notes outside any vault. Each backup directory
//! carries a `registry.json` listing its records, newest first.

pub mod registry;
pub mod retention;

use crate::config::{self, defaults};
use crate::error::{CuratorError, CuratorResult};
use crate::notes::file_ops;
use chrono::{DateTime, Duration, Utc};
use notecurator_types::BackupRecord;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Upper bound on numeric suffixes tried when a backup name already exists
const MAX_NAME_ATTEMPTS: usize = 1000;

pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[derive(Debug, Clone)]
pub struct BackupManager {
    fallback_dir: PathBuf,
}

impl Default for BackupManager {
    fn default() -> Self {
        Self::new(config::global_backup_dir())
    }
}

impl BackupManager {
    /// `fallback_dir` receives backups of notes outside any vault.
    pub fn new(fallback_dir: PathBuf) -> Self {
        Self { fallback_dir }
    }

    /// Backup directory for a note: the enclosing vault's, else the fallback.
    pub fn backup_dir_for(&self, path: &Path) -> PathBuf {
        path.parent()
            .and_then(|dir| file_ops::find_vault_root(dir, defaults::MAX_ANCESTOR_DEPTH))
            .map(|root| config::vault_backup_dir(&root))
            .unwrap_or_else(|| self.fallback_dir.clone())
    }

    /// Copy the file at `path` into its backup directory and register it.
    pub fn backup(&self, path: &Path) -> CuratorResult<BackupRecord> {
        let original = normalize(path);
        let bytes = fs::read(&original).map_err(|e| CuratorError::io(&original, e))?;

        let dir = self.backup_dir_for(&original);
        fs::create_dir_all(&dir).map_err(|e| CuratorError::io(&dir, e))?;

        let created_at = Utc::now();
        let backup_path = unique_backup_path(&dir, &original, created_at)?;
        fs::write(&backup_path, &bytes).map_err(|e| CuratorError::io(&backup_path, e))?;

        let record = BackupRecord {
            original_path: original,
            backup_path,
            created_at,
            size: bytes.len() as u64,
            checksum: checksum(&bytes),
        };

        let mut loaded = registry::load(&dir);
        loaded.records.insert(0, record.clone());
        registry::sort_newest_first(&mut loaded.records);
        registry::save(&dir, &loaded.records)?;

        log::info!(
            "[BACKUP] Backed up {} -> {}",
            record.original_path.display(),
            record.backup_path.display()
        );
        Ok(record)
    }

    /// Restore a backup over its original path after verifying its checksum.
    ///
    /// An existing file at the target is backed up first, so a restore can itself be undone.
    pub fn restore(&self, record: &BackupRecord) -> CuratorResult<()> {
        if !record.backup_path.is_file() {
            return Err(CuratorError::BackupMissing(record.backup_path.clone()));
        }
        let bytes = fs::read(&record.backup_path)
            .map_err(|e| CuratorError::io(&record.backup_path, e))?;

        let actual = checksum(&bytes);
        if actual != record.checksum {
            return Err(CuratorError::Integrity {
                path: record.backup_path.clone(),
                expected: record.checksum.clone(),
                actual,
            });
        }

        if record.original_path.exists() {
            self.backup(&record.original_path)?;
        }

        file_ops::write_atomic(&record.original_path, &bytes)
            .map_err(|e| CuratorError::io(&record.original_path, e))?;
        log::info!(
            "[BACKUP] Restored {} from {}",
            record.original_path.display(),
            record.backup_path.display()
        );
        Ok(())
    }

    /// Registry entries for `path` whose backup files still exist, newest first.
    pub fn list_backups(&self, path: &Path) -> Vec<BackupRecord> {
        let original = normalize(path);
        let dir = self.backup_dir_for(&original);
        registry::load(&dir)
            .records
            .into_iter()
            .filter(|r| r.original_path == original && r.backup_path.is_file())
            .collect()
    }

    pub fn latest_backup(&self, path: &Path) -> Option<BackupRecord> {
        self.list_backups(path).into_iter().next()
    }

    /// Delete backups in `backup_dir` older than `retention`. Returns the number removed.
    pub fn prune_older_than(&self, backup_dir: &Path, retention: Duration) -> CuratorResult<usize> {
        self.prune_older_than_at(backup_dir, retention, Utc::now())
    }

    pub fn prune_older_than_at(
        &self,
        backup_dir: &Path,
        retention: Duration,
        now: DateTime<Utc>,
    ) -> CuratorResult<usize> {
        let Some(cutoff) = now.checked_sub_signed(retention) else {
            log::debug!("[BACKUP] Retention reaches past the earliest date, nothing to prune");
            return Ok(0);
        };
        let loaded = registry::load(backup_dir);
        let (expired, retained): (Vec<BackupRecord>, Vec<BackupRecord>) = loaded
            .records
            .into_iter()
            .partition(|r| r.created_at < cutoff);

        if expired.is_empty() {
            return Ok(0);
        }

        for record in &expired {
            if let Err(e) = fs::remove_file(&record.backup_path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!(
                        "[BACKUP] Failed to delete {}: {}",
                        record.backup_path.display(),
                        e
                    );
                }
            }
        }

        registry::save(backup_dir, &retained)?;
        log::info!(
            "[BACKUP] Pruned {} backup(s) older than {} from {}",
            expired.len(),
            cutoff.to_rfc3339(),
            backup_dir.display()
        );
        Ok(expired.len())
    }
}

fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// `<name>.<YYYYMMDDTHHMMSS.fffZ>.bak`, with `-N` before `.bak` on collision.
fn unique_backup_path(dir: &Path, original: &Path, at: DateTime<Utc>) -> CuratorResult<PathBuf> {
    let name = original
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "note".to_string());
    let stamp = at.format("%Y%m%dT%H%M%S%.3fZ");

    let first = dir.join(format!("{}.{}.bak", name, stamp));
    if !first.exists() {
        return Ok(first);
    }
    for n in 1..MAX_NAME_ATTEMPTS {
        let candidate = dir.join(format!("{}.{}-{}.bak", name, stamp, n));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(CuratorError::io(
        dir,
        std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("no free backup name for {}", name),
        ),
    ))
}
