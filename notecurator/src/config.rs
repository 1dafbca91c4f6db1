use std::env;
use std::path::{Path, PathBuf};

/// Environment variable names - single source of truth
pub mod env_vars {
    /// Overrides the directory holding the global config tier (default: `<config_dir>/notecurator`).
    pub const CONFIG_DIR: &str = "NOTECURATOR_CONFIG_DIR";
    /// Overrides the fallback backup directory used outside any vault.
    pub const BACKUP_DIR: &str = "NOTECURATOR_BACKUP_DIR";
}

/// Default values
pub mod defaults {
    pub const APP_DIR: &str = "notecurator";
    /// Per-vault directory holding the vault config tier and backups
    pub const VAULT_CONFIG_DIR: &str = ".notecurator";
    pub const CONFIG_FILE: &str = "config.json";
    /// Local tier file, next to the note
    pub const LOCAL_CONFIG_FILE: &str = ".notecurator.json";
    pub const BACKUPS_DIR: &str = "backups";
    pub const REGISTRY_FILE: &str = "registry.json";

    /// Directories that mark the root of a vault
    pub const VAULT_MARKERS: &[&str] = &[".obsidian", VAULT_CONFIG_DIR];
    /// Upper bound on parent directories visited while looking for a vault root
    pub const MAX_ANCESTOR_DEPTH: usize = 32;

    pub const NOTE_EXTENSIONS: &[&str] = &["md", "markdown", "mdown", "mkd"];

    pub const AI_PROVIDER: &str = "none";
    pub const BACKUP_RETENTION: &str = "30d";
    pub const MAX_FILE_SIZE_KB: u64 = 1024;
    pub const LINK_TIMEOUT_SECS: u64 = 10;
    pub const LINK_CACHE_TTL_HOURS: u64 = 24;
    /// Ten years
    pub const MAX_LINK_CACHE_TTL_HOURS: u64 = 87_600;
    pub const LINK_CONCURRENCY: usize = 4;
    pub const SEARCH_DEPTH: usize = 10;
    /// Preview rounds before an undecided approval counts as a rejection
    pub const MAX_PREVIEW_ROUNDS: usize = 10;
}

/// User home directory, if the platform has one.
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Directory holding the global config tier.
pub fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = env::var(env_vars::CONFIG_DIR) {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(defaults::APP_DIR))
}

/// Path of the global config tier file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|d| d.join(defaults::CONFIG_FILE))
}

/// Path of the vault config tier file for a given anchor directory.
pub fn vault_config_path(anchor: &Path) -> PathBuf {
    anchor
        .join(defaults::VAULT_CONFIG_DIR)
        .join(defaults::CONFIG_FILE)
}

/// Path of the local config tier file for a note's directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(defaults::LOCAL_CONFIG_FILE)
}

/// Backup directory for a vault anchor.
pub fn vault_backup_dir(anchor: &Path) -> PathBuf {
    anchor
        .join(defaults::VAULT_CONFIG_DIR)
        .join(defaults::BACKUPS_DIR)
}

/// Fallback backup directory for notes outside any vault.
pub fn global_backup_dir() -> PathBuf {
    if let Ok(dir) = env::var(env_vars::BACKUP_DIR) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(env::temp_dir)
        .join(defaults::APP_DIR)
        .join(defaults::BACKUPS_DIR)
}

/// Whether a path carries one of the recognized note extensions (case-insensitive).
pub fn is_note_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| {
            let ext = e.to_string_lossy().to_lowercase();
            defaults::NOTE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_extensions() {
        assert!(is_note_extension(Path::new("a/b/note.md")));
        assert!(is_note_extension(Path::new("NOTE.MD")));
        assert!(is_note_extension(Path::new("x.markdown")));
        assert!(!is_note_extension(Path::new("x.txt")));
        assert!(!is_note_extension(Path::new("README")));
    }

    #[test]
    fn test_tier_paths() {
        let anchor = Path::new("/vault");
        assert_eq!(vault_config_path(anchor), PathBuf::from("/vault/.notecurator/config.json"));
        assert_eq!(vault_backup_dir(anchor), PathBuf::from("/vault/.notecurator/backups"));
        assert_eq!(local_config_path(anchor), PathBuf::from("/vault/.notecurator.json"));
    }
}
