//! Multi-factor category detection.
//!
//! Every configured category is scored as
//! `0.4 * metadata + 0.4 * content + 0.2 * path`, each part clamped to [0, 1].

pub mod recommendations;
pub mod scorers;

use crate::models::{CurationConfig, TypeProfile};
use glob::{MatchOptions, Pattern};
use notecurator_types::{DetectionResult, Document, TypeScore};
use scorers::ContentScorers;

pub const METADATA_WEIGHT: f64 = 0.4;
pub const CONTENT_WEIGHT: f64 = 0.4;
pub const PATH_WEIGHT: f64 = 0.2;

/// Path score when any configured glob matches
pub const PATH_MATCH_SCORE: f64 = 0.8;
/// Multiplier when at least `BONUS_MIN_FIELDS` keep fields are present
pub const METADATA_BONUS: f64 = 1.2;
pub const BONUS_MIN_FIELDS: usize = 3;

/// Primary type reported when no category is configured
pub const UNCLASSIFIED: &str = "unclassified";

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

struct PartialScore {
    score: f64,
    reasons: Vec<String>,
    warnings: Vec<String>,
}

fn metadata_score(doc: &Document, profile: &TypeProfile) -> PartialScore {
    let keep = &profile.metadata.keep;
    let present: Vec<&str> = keep
        .iter()
        .map(String::as_str)
        .filter(|f| doc.metadata.contains_key(f))
        .collect();

    let mut score = if keep.is_empty() {
        0.0
    } else {
        present.len() as f64 / keep.len() as f64
    };

    let mut reasons = Vec::new();
    if !present.is_empty() {
        reasons.push(format!(
            "Metadata has {}/{} expected fields ({})",
            present.len(),
            keep.len(),
            present.join(", ")
        ));
    }
    if present.len() >= BONUS_MIN_FIELDS {
        score *= METADATA_BONUS;
        reasons.push(format!("Strong metadata match ({} fields)", present.len()));
    }

    let warnings = profile
        .metadata
        .remove
        .iter()
        .filter(|f| doc.metadata.contains_key(f))
        .map(|f| format!("Field '{}' is slated for removal in {}", f, profile.name))
        .collect();

    PartialScore {
        score: score.clamp(0.0, 1.0),
        reasons,
        warnings,
    }
}

fn path_score(doc: &Document, profile: &TypeProfile) -> PartialScore {
    let full = doc.path.to_string_lossy();
    let trimmed = full.trim_start_matches('/');
    let file_name = doc
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    for raw in &profile.detection.path_patterns {
        let pattern = match Pattern::new(raw) {
            Ok(p) => p,
            Err(e) => {
                log::debug!("[CLASSIFY] Ignoring invalid path pattern '{}': {}", raw, e);
                continue;
            }
        };
        let hit = [&*full, trimmed, file_name.as_str()]
            .iter()
            .any(|candidate| pattern.matches_with(candidate, GLOB_OPTIONS));
        if hit {
            return PartialScore {
                score: PATH_MATCH_SCORE,
                reasons: vec![format!("Path matches '{}'", raw)],
                warnings: Vec::new(),
            };
        }
    }

    PartialScore {
        score: 0.0,
        reasons: Vec::new(),
        warnings: Vec::new(),
    }
}

/// Score one category.
pub fn score_category(
    doc: &Document,
    profile: &TypeProfile,
    scorers: &ContentScorers,
) -> TypeScore {
    let metadata = metadata_score(doc, profile);
    let content = scorers.score(doc, profile);
    let path = path_score(doc, profile);

    let confidence = (METADATA_WEIGHT * metadata.score
        + CONTENT_WEIGHT * content.score.clamp(0.0, 1.0)
        + PATH_WEIGHT * path.score)
        .clamp(0.0, 1.0);

    let mut reasons = metadata.reasons;
    reasons.extend(content.reasons);
    reasons.extend(path.reasons);

    TypeScore {
        name: profile.name.clone(),
        confidence,
        reasons,
        warnings: metadata.warnings,
    }
}

/// Score every configured category and pick the best one.
pub fn classify(doc: &Document, config: &CurationConfig) -> DetectionResult {
    let scorers = ContentScorers::default();
    let mut all_scores: Vec<TypeScore> = config
        .types
        .values()
        .map(|profile| score_category(doc, profile, &scorers))
        .collect();

    // Stable: equal confidences keep configured order
    all_scores.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let primary_type = all_scores
        .first()
        .map(|s| s.name.clone())
        .unwrap_or_else(|| UNCLASSIFIED.to_string());
    let recommendations = recommendations::recommend(doc, config, &all_scores);

    log::info!(
        "[CLASSIFY] {} -> {} ({:.2})",
        doc.path.display(),
        primary_type,
        all_scores.first().map(|s| s.confidence).unwrap_or(0.0)
    );

    DetectionResult {
        primary_type,
        all_scores,
        recommendations,
    }
}
