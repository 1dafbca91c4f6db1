//! Advisory recommendations attached to a detection result.

use crate::models::CurationConfig;
use notecurator_types::{Document, TypeScore};

/// Fields that usually describe a note's editing state rather than its content
pub const TRANSIENT_FIELDS: &[&str] = &["author", "status", "draft", "wip"];

pub const LOW_CONFIDENCE: f64 = 0.5;
pub const MAX_CHECKLIST_ITEMS: usize = 20;
pub const MAX_EXTERNAL_LINKS: usize = 25;

pub fn recommend(doc: &Document, config: &CurationConfig, scores: &[TypeScore]) -> Vec<String> {
    let mut out = Vec::new();
    let top = scores.first();
    let primary = top.and_then(|s| config.profile(&s.name));

    let top_confidence = top.map(|s| s.confidence).unwrap_or(0.0);
    if top_confidence < LOW_CONFIDENCE {
        out.push(format!(
            "Low classification confidence ({:.2}); add metadata such as title, tags or type to make the category explicit",
            top_confidence
        ));
    }

    for field in TRANSIENT_FIELDS {
        let kept = primary
            .map(|p| p.metadata.keep.iter().any(|k| k == field))
            .unwrap_or(false);
        if doc.metadata.contains_key(field) && !kept {
            out.push(format!("Consider removing the transient field '{}'", field));
        }
    }

    if let Some(profile) = primary {
        let missing: Vec<&str> = profile
            .metadata
            .keep
            .iter()
            .map(String::as_str)
            .filter(|f| !doc.metadata.contains_key(f))
            .collect();
        if !missing.is_empty() {
            out.push(format!(
                "Missing fields typical for {}: {}",
                profile.name,
                missing.join(", ")
            ));
        }
    }

    let external = doc.external_links().count();
    if doc.checklist.len() > MAX_CHECKLIST_ITEMS || external > MAX_EXTERNAL_LINKS {
        out.push(format!(
            "Note is large ({} checklist items, {} external links); consider splitting it into smaller notes",
            doc.checklist.len(),
            external
        ));
    }

    out
}
