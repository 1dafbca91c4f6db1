//! Layered configuration lookup: compiled-in defaults, then global, vault and
//! local tier files merged in that order.

use crate::config::{self, defaults};
use crate::models::{ConfigTier, CurationConfig};
use crate::notes::file_ops;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierKind {
    Global,
    Vault,
    Local,
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierKind::Global => write!(f, "global"),
            TierKind::Vault => write!(f, "vault"),
            TierKind::Local => write!(f, "local"),
        }
    }
}

/// A tier file that contributed to the effective configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub tier: TierKind,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: CurationConfig,
    pub sources: Vec<ConfigSource>,
    pub warnings: Vec<String>,
    /// Nearest ancestor carrying a vault marker, if any
    pub vault_root: Option<PathBuf>,
}

/// Finds and merges tier files for a note path.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    global_path: Option<PathBuf>,
    home: Option<PathBuf>,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self {
            global_path: config::global_config_path(),
            home: config::home_dir(),
        }
    }
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver with explicit global tier file and home fallback anchor.
    pub fn with_locations(global_path: Option<PathBuf>, home: Option<PathBuf>) -> Self {
        Self { global_path, home }
    }

    /// Effective configuration for `path` (a note file or a directory). Never fails.
    pub fn resolve(&self, path: &Path) -> ResolvedConfig {
        let dir = if path.is_dir() {
            path.to_path_buf()
        } else {
            path.parent().map(Path::to_path_buf).unwrap_or_default()
        };

        let vault_root = file_ops::find_vault_root(&dir, defaults::MAX_ANCESTOR_DEPTH);
        let anchor = vault_root.clone().or_else(|| self.home.clone());

        let mut candidates: Vec<(TierKind, PathBuf)> = Vec::with_capacity(3);
        if let Some(global) = &self.global_path {
            candidates.push((TierKind::Global, global.clone()));
        }
        if let Some(anchor) = &anchor {
            candidates.push((TierKind::Vault, config::vault_config_path(anchor)));
        }
        candidates.push((TierKind::Local, config::local_config_path(&dir)));

        let mut resolved = ResolvedConfig {
            config: CurationConfig::default(),
            sources: Vec::new(),
            warnings: Vec::new(),
            vault_root,
        };
        let mut seen: Vec<PathBuf> = Vec::new();

        for (tier, tier_path) in candidates {
            let identity = tier_path.canonicalize().unwrap_or_else(|_| tier_path.clone());
            if seen.contains(&identity) {
                log::debug!(
                    "[CONFIG] {} tier {} already loaded, skipping",
                    tier,
                    tier_path.display()
                );
                continue;
            }
            seen.push(identity);

            match load_tier(&tier_path) {
                Ok(None) => {}
                Ok(Some(parsed)) => {
                    log::debug!("[CONFIG] Merging {} tier from {}", tier, tier_path.display());
                    for warning in resolved.config.apply_tier(parsed) {
                        let msg = format!("{} ({})", warning, tier_path.display());
                        log::warn!("[CONFIG] {}", msg);
                        resolved.warnings.push(msg);
                    }
                    resolved.sources.push(ConfigSource {
                        tier,
                        path: tier_path,
                    });
                }
                Err(e) => {
                    let msg = format!(
                        "Skipping {} config {}: {}",
                        tier,
                        tier_path.display(),
                        e
                    );
                    log::warn!("[CONFIG] {}", msg);
                    resolved.warnings.push(msg);
                }
            }
        }

        log::info!(
            "[CONFIG] Resolved {} categories from {} tier file(s)",
            resolved.config.types.len(),
            resolved.sources.len()
        );
        resolved
    }
}

/// Read and parse one tier file. A missing file is `Ok(None)`.
fn load_tier(path: &Path) -> Result<Option<ConfigTier>, String> {
    match fs::read_to_string(path) {
        Ok(content) => ConfigTier::from_json(&content).map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(format!("unreadable: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_defaults_only() {
        let dir = tempdir().unwrap();
        let note = dir.path().join("note.md");
        fs::write(&note, "# hi\n").unwrap();

        let resolver = ConfigResolver::with_locations(None, None);
        let resolved = resolver.resolve(&note);
        assert!(resolved.sources.is_empty());
        assert!(resolved.warnings.is_empty());
        assert_eq!(resolved.config, CurationConfig::default());
        assert!(resolved.vault_root.is_none());
    }

    #[test]
    fn test_tier_order_later_wins() {
        let root = tempdir().unwrap();
        let global = root.path().join("global/config.json");
        let vault = root.path().join("vault");
        fs::create_dir_all(vault.join(".obsidian")).unwrap();
        let notes_dir = vault.join("notes");
        let note = notes_dir.join("note.md");
        write(&note, "# hi\n");

        write(&global, r#"{"aiProvider": "global", "backupRetention": "7d"}"#);
        write(
            &config::vault_config_path(&vault),
            r#"{"aiProvider": "vault", "types": {"meeting-notes": {"metadata": {"keep": ["room"]}}}}"#,
        );
        write(
            &config::local_config_path(&notes_dir),
            r#"{"aiProvider": "local", "types": {"meeting-notes": {"metadata": {"keep": ["room", "mood"]}}}}"#,
        );

        let resolver = ConfigResolver::with_locations(Some(global.clone()), None);
        let resolved = resolver.resolve(&note);

        assert_eq!(
            resolved.sources.iter().map(|s| s.tier).collect::<Vec<_>>(),
            vec![TierKind::Global, TierKind::Vault, TierKind::Local]
        );
        assert_eq!(resolved.config.ai_provider, "local");
        assert_eq!(resolved.config.backup_retention, "7d");
        assert_eq!(resolved.vault_root.as_deref(), Some(vault.as_path()));

        let keep = &resolved.config.profile("meeting-notes").unwrap().metadata.keep;
        assert_eq!(keep.iter().filter(|k| *k == "room").count(), 1);
        assert!(keep.contains(&"mood".to_string()));
        assert!(keep.contains(&"attendees".to_string()));
    }

    #[test]
    fn test_malformed_tier_is_skipped() {
        let root = tempdir().unwrap();
        let global = root.path().join("global.json");
        write(&global, "{ not json");
        let note = root.path().join("n.md");
        write(&note, "x");
        write(&config::local_config_path(root.path()), r#"{"processing": {"linkTimeoutSecs": 3}}"#);

        let resolved = ConfigResolver::with_locations(Some(global), None).resolve(&note);
        assert_eq!(resolved.warnings.len(), 1);
        assert!(resolved.warnings[0].contains("global"));
        assert_eq!(resolved.sources.len(), 1);
        assert_eq!(resolved.config.processing.link_timeout_secs, 3);
    }

    #[test]
    fn test_home_anchor_used_without_vault() {
        let home = tempdir().unwrap();
        write(
            &config::vault_config_path(home.path()),
            r#"{"types": {"recipe": {"detection": {"keywords": ["flour"]}}}}"#,
        );
        let notes = tempdir().unwrap();
        let note = notes.path().join("bread.md");
        write(&note, "flour");

        let resolved =
            ConfigResolver::with_locations(None, Some(home.path().to_path_buf())).resolve(&note);
        assert_eq!(resolved.sources.len(), 1);
        assert_eq!(resolved.sources[0].tier, TierKind::Vault);
        assert!(resolved.config.profile("recipe").is_some());
    }

    #[test]
    fn test_same_file_loaded_once() {
        let home = tempdir().unwrap();
        let vault_file = config::vault_config_path(home.path());
        write(&vault_file, r#"{"types": {"x": {"metadata": {"keep": ["a"]}}}}"#);
        let note = home.path().join("n.md");
        write(&note, "x");

        // Global tier pointed at the same file the vault tier will find
        let resolved = ConfigResolver::with_locations(Some(vault_file), None).resolve(&note);
        assert_eq!(resolved.sources.len(), 1);
        assert_eq!(resolved.sources[0].tier, TierKind::Global);
    }
}
