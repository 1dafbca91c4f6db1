//! Resolve `[[cross-references]]` and relative markdown links to files in the vault.

use crate::config::defaults;
use crate::notes::file_ops;
use notecurator_types::{InternalCheck, LinkStatus};
use std::path::{Path, PathBuf};

/// Strip brackets, display text and heading/block anchors, then percent-decode.
pub fn clean_reference(reference: &str) -> String {
    let trimmed = reference.trim();
    let inner = trimmed
        .strip_prefix("![[")
        .or_else(|| trimmed.strip_prefix("[["))
        .map(|s| s.strip_suffix("]]").unwrap_or(s))
        .unwrap_or(trimmed);

    let target = inner.split('|').next().unwrap_or_default();
    let target = target.split('#').next().unwrap_or_default();

    let decoded = urlencoding::decode(target)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| target.to_string());
    decoded.trim().to_string()
}

/// Names to try for a reference: as written when it has an extension, plus `.md` appended.
fn candidate_names(reference: &str) -> Vec<String> {
    let mut names = Vec::with_capacity(2);
    if Path::new(reference).extension().is_some() {
        names.push(reference.to_string());
    }
    names.push(format!("{}.md", reference));
    names
}

fn found(path: PathBuf) -> InternalCheck {
    InternalCheck {
        status: LinkStatus::Valid,
        resolved_path: Some(path),
        alternatives: Vec::new(),
    }
}

/// Resolve `reference` as seen from the note at `from`.
pub fn resolve_reference(reference: &str, from: &Path, search_depth: usize) -> InternalCheck {
    let note_dir = from.parent().unwrap_or_else(|| Path::new("."));
    let cleaned = clean_reference(reference);

    // Pure anchors point back into the same note
    if cleaned.is_empty() {
        return found(from.to_path_buf());
    }

    let vault_root = file_ops::find_vault_root(note_dir, defaults::MAX_ANCESTOR_DEPTH)
        .unwrap_or_else(|| note_dir.to_path_buf());
    let relative = cleaned.trim_start_matches('/');
    let names = candidate_names(relative);

    for base in [note_dir, vault_root.as_path()] {
        for name in &names {
            let candidate = base.join(name);
            if candidate.is_file() {
                return found(candidate);
            }
        }
    }

    let wanted: Vec<String> = names
        .iter()
        .filter_map(|n| Path::new(n).file_name())
        .map(|n| n.to_string_lossy().to_lowercase())
        .collect();

    let mut matches: Vec<PathBuf> = file_ops::list_files(&vault_root, search_depth)
        .into_iter()
        .filter(|p| {
            p.file_name()
                .map(|n| wanted.contains(&n.to_string_lossy().to_lowercase()))
                .unwrap_or(false)
        })
        .collect();

    match matches.len() {
        0 => InternalCheck {
            status: LinkStatus::Broken,
            resolved_path: None,
            alternatives: Vec::new(),
        },
        1 => found(matches.remove(0)),
        _ => {
            let first = matches.remove(0);
            log::debug!(
                "[LINKS] '{}' is ambiguous: {} candidates, using {}",
                cleaned,
                matches.len() + 1,
                first.display()
            );
            InternalCheck {
                status: LinkStatus::Ambiguous,
                resolved_path: Some(first),
                alternatives: matches,
            }
        }
    }
}
