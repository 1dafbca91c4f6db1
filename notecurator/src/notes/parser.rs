//! Turns a note file into a `Document`.

use super::frontmatter;
use super::structure;
use crate::config::{self, defaults};
use crate::error::{CuratorError, CuratorResult};
use chrono::{DateTime, Utc};
use notecurator_types::{Document, DocumentMetrics, Metadata};
use std::fs;
use std::path::{Path, PathBuf};

/// A parsed document plus the non-fatal problems found while parsing it
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub document: Document,
    pub warnings: Vec<String>,
}

/// Note parser. The size threshold only produces a warning.
#[derive(Debug, Clone)]
pub struct NoteParser {
    warn_size_bytes: u64,
}

impl Default for NoteParser {
    fn default() -> Self {
        Self::new(defaults::MAX_FILE_SIZE_KB)
    }
}

impl NoteParser {
    pub fn new(max_file_size_kb: u64) -> Self {
        Self {
            warn_size_bytes: max_file_size_kb.saturating_mul(1024),
        }
    }

    /// Parse the note at `path`.
    pub fn parse(&self, path: &Path) -> CuratorResult<ParseOutcome> {
        let path = absolutize(path);

        let meta = fs::metadata(&path).map_err(|e| CuratorError::from_read(&path, e))?;
        if !meta.is_file() || !config::is_note_extension(&path) {
            return Err(CuratorError::UnsupportedExtension(path));
        }

        let path = path.canonicalize().unwrap_or(path);
        let bytes = fs::read(&path).map_err(|e| CuratorError::from_read(&path, e))?;

        let mut warnings = Vec::new();
        if meta.len() > self.warn_size_bytes {
            let msg = format!(
                "{} is {} KB, above the {} KB threshold; processing may be slow",
                path.display(),
                meta.len() / 1024,
                self.warn_size_bytes / 1024
            );
            log::warn!("[NOTES] {}", msg);
            warnings.push(msg);
        }

        let content = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => {
                let msg = format!(
                    "{} is not valid UTF-8; invalid bytes were replaced",
                    path.display()
                );
                log::warn!("[NOTES] {}", msg);
                warnings.push(msg);
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };

        let modified = meta.modified().ok().map(DateTime::<Utc>::from);
        let (document, parse_warnings) = parse_content(path, &content, meta.len(), modified);
        warnings.extend(parse_warnings);

        log::debug!(
            "[NOTES] Parsed {} ({} headers, {} links, {} checklist items)",
            document.path.display(),
            document.headers.len(),
            document.links.len(),
            document.checklist.len()
        );

        Ok(ParseOutcome { document, warnings })
    }
}

/// Build a `Document` from already-loaded text.
pub fn parse_content(
    path: PathBuf,
    content: &str,
    byte_size: u64,
    modified: Option<DateTime<Utc>>,
) -> (Document, Vec<String>) {
    let mut warnings = Vec::new();
    let split = frontmatter::split_frontmatter(content);

    if split.unterminated {
        let msg = format!(
            "Metadata block in {} is never closed; treating the file as having no metadata",
            path.display()
        );
        log::warn!("[NOTES] {}", msg);
        warnings.push(msg);
    }

    let metadata = match split.yaml.as_deref() {
        Some(yaml) => match frontmatter::parse_metadata(yaml) {
            Ok(md) => md,
            Err(e) => {
                let msg = format!("Malformed metadata block in {}: {}", path.display(), e);
                log::warn!("[NOTES] {}", msg);
                warnings.push(msg);
                Metadata::new()
            }
        },
        None => Metadata::new(),
    };

    let index = structure::scan_body(&split.body, split.body_start_line);

    let metrics = DocumentMetrics {
        word_count: split.body.split_whitespace().count(),
        line_count: content.lines().count(),
        byte_size,
        modified,
    };

    let document = Document {
        path,
        metadata,
        has_metadata_block: split.yaml.is_some(),
        body: split.body,
        headers: index.headers,
        links: index.links,
        code_blocks: index.code_blocks,
        checklist: index.checklist,
        metrics,
    };

    (document, warnings)
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notecurator_types::MetadataValue;
    use tempfile::tempdir;

    #[test]
    fn test_parse_full_note() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sync.md");
        fs::write(
            &path,
            "---\ndate: 2026-02-18\nattendees: [alice, bob]\n---\n## Agenda\n- [ ] one\n- [x] two\n",
        )
        .unwrap();

        let outcome = NoteParser::default().parse(&path).unwrap();
        let doc = outcome.document;
        assert!(outcome.warnings.is_empty());
        assert!(doc.path.is_absolute());
        assert!(doc.has_metadata_block);
        assert_eq!(doc.metadata.get("date"), Some(&MetadataValue::text("2026-02-18")));
        assert_eq!(doc.headers[0].text, "Agenda");
        assert_eq!(doc.headers[0].line, 5);
        assert_eq!(doc.checklist.len(), 2);
        assert_eq!(doc.metrics.line_count, 7);
        assert_eq!(doc.metrics.word_count, 9);
        assert!(doc.metrics.modified.is_some());
    }

    #[test]
    fn test_not_found() {
        let dir = tempdir().unwrap();
        let err = NoteParser::default().parse(&dir.path().join("missing.md")).unwrap_err();
        assert!(matches!(err, CuratorError::NotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{}").unwrap();
        let err = NoteParser::default().parse(&path).unwrap_err();
        assert!(matches!(err, CuratorError::UnsupportedExtension(_)));
    }

    #[test]
    fn test_malformed_metadata_is_a_warning() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.md");
        fs::write(&path, "---\ntitle: [oops\n---\nBody text\n").unwrap();

        let outcome = NoteParser::default().parse(&path).unwrap();
        assert!(outcome.document.metadata.is_empty());
        assert_eq!(outcome.document.body, "Body text\n");
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("Malformed"));
    }

    #[test]
    fn test_large_file_warning() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.md");
        fs::write(&path, "word ".repeat(400)).unwrap();

        let outcome = NoteParser::new(1).parse(&path).unwrap();
        assert_eq!(outcome.document.metrics.word_count, 400);
        assert!(outcome.warnings.iter().any(|w| w.contains("threshold")));
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bytes.md");
        fs::write(&path, b"# Title \xff\n").unwrap();

        let outcome = NoteParser::default().parse(&path).unwrap();
        assert_eq!(outcome.document.headers.len(), 1);
        assert!(outcome.warnings.iter().any(|w| w.contains("UTF-8")));
    }
}
