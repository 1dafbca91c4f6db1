//! File operations for notes
//!
//! Atomic note writes, slugification, vault-root discovery and note listing.

use crate::config::defaults;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory names never descended into while searching a vault
const SYSTEM_DIRS: &[&str] = &["node_modules", "__pycache__", "target"];

/// Slugify a heading or title (e.g. "x402 Payment Protocol" -> "x402-payment-protocol")
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<&str>>()
        .join("-")
}

/// Write a note file atomically: write a sibling temp file, then rename over the target.
pub fn write_note(path: &Path, content: &str) -> io::Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Byte-level variant of `write_note`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_sibling(path);
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

/// Temp file path next to `path` (same directory, so the rename stays on one filesystem)
pub fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "note".to_string());
    path.with_file_name(format!(".{}.tmp-{}", name, std::process::id()))
}

/// Hidden (dot-prefixed) or well-known system directory names
pub fn is_hidden_or_system(name: &str) -> bool {
    name.starts_with('.') || SYSTEM_DIRS.contains(&name)
}

/// Whether `dir` directly contains one of the vault marker directories
pub fn has_vault_marker(dir: &Path) -> bool {
    defaults::VAULT_MARKERS
        .iter()
        .any(|marker| dir.join(marker).is_dir())
}

/// Walk upward from `start` (inclusive) looking for a directory carrying a vault marker.
/// Gives up after `max_depth` levels.
pub fn find_vault_root(start: &Path, max_depth: usize) -> Option<PathBuf> {
    let mut current = Some(start);
    let mut depth = 0;
    while let Some(dir) = current {
        if depth > max_depth {
            break;
        }
        if has_vault_marker(dir) {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
        depth += 1;
    }
    None
}

/// List all note files under `root`, skipping hidden and system directories.
/// Results are sorted by path so callers get a stable order.
pub fn list_notes(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    list_files(root, max_depth)
        .into_iter()
        .filter(|p| crate::config::is_note_extension(p))
        .collect()
}

/// List every regular file under `root` (any extension), same skipping rules as `list_notes`.
pub fn list_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }

    WalkDir::new(root)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !is_hidden_or_system(&entry.file_name().to_string_lossy())
        })
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                log::debug!("[NOTES] Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

/// Get relative path from root for a file
pub fn relative_path(root: &Path, file_path: &Path) -> Option<String> {
    file_path
        .strip_prefix(root)
        .ok()
        .map(|p| p.to_string_lossy().to_string())
}
