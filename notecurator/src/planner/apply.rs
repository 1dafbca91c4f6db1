//! Turning a plan into new note text, writing it and checking the result.

use crate::notes::{file_ops, frontmatter, parse_content};
use notecurator_types::{
    ChangePlan, Document, LinkChangeKind, Metadata, MetadataChange, MetadataChangeKind,
};
use std::fs;
use std::path::Path;

/// Expected on-disk state after applying a plan
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedNote {
    pub metadata: Metadata,
    pub body: String,
    pub text: String,
    /// Link and content changes that were reported, not applied
    pub follow_ups: Vec<String>,
}

/// Apply metadata changes to a copy of `original`: removals, then additions, then modifications.
pub fn apply_metadata_changes(original: &Metadata, changes: &[MetadataChange]) -> Metadata {
    let mut metadata = original.clone();
    for kind in [MetadataChangeKind::Remove, MetadataChangeKind::Add, MetadataChangeKind::Modify] {
        for change in changes.iter().filter(|c| c.kind == kind) {
            match (kind, &change.new_value) {
                (MetadataChangeKind::Remove, _) => {
                    metadata.remove(&change.field);
                }
                (_, Some(value)) => {
                    metadata.insert(change.field.clone(), value.clone());
                }
                (_, None) => {}
            }
        }
    }
    metadata
}

/// Compute the note text a plan produces. Only metadata edits change the file.
pub fn build(doc: &Document, plan: &ChangePlan) -> Result<AppliedNote, String> {
    let metadata = apply_metadata_changes(&doc.metadata, &plan.metadata_changes);
    let text = frontmatter::render_note(&metadata, &doc.body, doc.has_metadata_block)?;

    let mut follow_ups = Vec::new();
    for change in plan.actionable_link_changes() {
        follow_ups.push(match (change.kind, &change.replacement) {
            (LinkChangeKind::Update, Some(replacement)) => format!(
                "Link {} should be updated to {} ({})",
                change.target, replacement, change.reason
            ),
            (LinkChangeKind::Update, None) => format!(
                "Link {} has moved; look up its new location ({})",
                change.target, change.reason
            ),
            _ => format!("Link {} should be removed ({})", change.target, change.reason),
        });
    }
    for change in &plan.content_changes {
        follow_ups.push(format!(
            "Section '{}' has a suggested summary: {}",
            change.section_id, change.new_text
        ));
    }

    Ok(AppliedNote {
        metadata,
        body: doc.body.clone(),
        text,
        follow_ups,
    })
}

/// Write atomically, then re-parse the file and compare with what was expected.
pub fn write_and_validate(path: &Path, expected: &AppliedNote) -> Result<(), String> {
    file_ops::write_note(path, &expected.text)
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    validate(path, expected)
}

pub fn validate(path: &Path, expected: &AppliedNote) -> Result<(), String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to re-read {}: {}", path.display(), e))?;
    let (reparsed, _) = parse_content(path.to_path_buf(), &content, content.len() as u64, None);

    if reparsed.metadata != expected.metadata {
        return Err("Written metadata does not match the planned metadata".to_string());
    }
    if reparsed.body != expected.body {
        return Err("Written body does not match the original body".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notecurator_types::{Complexity, LinkChange, LinkStatus, MetadataValue, PlanSummary};
    use tempfile::tempdir;

    fn empty_plan() -> ChangePlan {
        ChangePlan {
            category: "x".to_string(),
            metadata_changes: vec![],
            content_changes: vec![],
            link_changes: vec![],
            summary: PlanSummary {
                original_size: 0,
                estimated_size: 0,
                size_delta_percent: 0.0,
                complexity: Complexity::Simple,
                requires_ai: false,
                estimated_seconds: 1,
            },
            warnings: vec![],
        }
    }

    fn change(kind: MetadataChangeKind, field: &str, value: Option<&str>) -> MetadataChange {
        MetadataChange {
            kind,
            field: field.to_string(),
            old_value: None,
            new_value: value.map(MetadataValue::text),
            reason: String::new(),
        }
    }

    #[test]
    fn test_empty_plan_is_identity() {
        let content = "---\ntitle: T\ntags: [a]\n---\n# Body\n\ntext\n";
        let (doc, _) = parse_content("/v/n.md".into(), content, content.len() as u64, None);
        let applied = build(&doc, &empty_plan()).unwrap();
        assert_eq!(applied.metadata, doc.metadata);
        assert_eq!(applied.body, doc.body);
        assert!(applied.follow_ups.is_empty());
    }

    #[test]
    fn test_link_follow_ups() {
        let content = "body\n";
        let (doc, _) = parse_content("/v/n.md".into(), content, content.len() as u64, None);
        let link = |kind, target: &str, replacement: Option<&str>| LinkChange {
            kind,
            target: target.to_string(),
            status: LinkStatus::Redirect,
            replacement: replacement.map(str::to_string),
            reason: "HTTP 301".to_string(),
        };
        let mut plan = empty_plan();
        plan.link_changes = vec![
            link(LinkChangeKind::Update, "http://a", Some("https://a/")),
            link(LinkChangeKind::Update, "http://b", None),
            link(LinkChangeKind::Remove, "http://c", None),
            link(LinkChangeKind::Verify, "http://d", None),
        ];

        let applied = build(&doc, &plan).unwrap();
        assert_eq!(applied.follow_ups.len(), 3);
        assert!(applied.follow_ups[0].contains("updated to https://a/"));
        assert!(applied.follow_ups[1].contains("has moved"));
        assert!(applied.follow_ups[2].contains("should be removed"));
        assert_eq!(applied.text, content);
    }

    #[test]
    fn test_change_order_is_remove_add_modify() {
        let mut md = Metadata::new();
        md.insert("status", MetadataValue::text("draft"));
        md.insert("title", MetadataValue::text("Old"));

        // Listed out of order on purpose
        let changes = vec![
            change(MetadataChangeKind::Modify, "title", Some("New")),
            change(MetadataChangeKind::Add, "status", Some("final")),
            change(MetadataChangeKind::Remove, "status", None),
        ];
        let out = apply_metadata_changes(&md, &changes);
        assert_eq!(out.keys().collect::<Vec<_>>(), vec!["title", "status"]);
        assert_eq!(out.get("status"), Some(&MetadataValue::text("final")));
        assert_eq!(out.get("title"), Some(&MetadataValue::text("New")));
    }

    #[test]
    fn test_write_and_validate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("n.md");
        let content = "Just a body\n";
        fs::write(&path, content).unwrap();
        let (doc, _) = parse_content(path.clone(), content, content.len() as u64, None);

        let mut plan = empty_plan();
        plan.metadata_changes.push(change(MetadataChangeKind::Add, "type", Some("note")));
        let applied = build(&doc, &plan).unwrap();
        write_and_validate(&path, &applied).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "---\ntype: note\n---\nJust a body\n");

        let mut wrong = applied.clone();
        wrong.body = "different".to_string();
        assert!(validate(&path, &wrong).is_err());
    }
}
