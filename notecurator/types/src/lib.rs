//! Shared types for the notecurator pipeline and its collaborators.
//!
//! Everything here is plain data: parsed documents, classification results,
//! change plans and backup records. Behavior lives in the `notecurator` crate.

mod ordered_map;

pub use ordered_map::OrderedMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// =====================================================
// Metadata
// =====================================================

/// A single metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<MetadataValue>),
    Map(OrderedMap<MetadataValue>),
}

impl MetadataValue {
    pub fn text(s: impl Into<String>) -> Self {
        MetadataValue::Text(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[MetadataValue]> {
        match self {
            MetadataValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// True for null, empty strings and empty lists.
    pub fn is_blank(&self) -> bool {
        match self {
            MetadataValue::Null => true,
            MetadataValue::Text(s) => s.trim().is_empty(),
            MetadataValue::List(items) => items.is_empty(),
            MetadataValue::Map(entries) => entries.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Null => write!(f, "null"),
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::Integer(i) => write!(f, "{}", i),
            MetadataValue::Float(x) => write!(f, "{}", x),
            MetadataValue::Text(s) => write!(f, "{}", s),
            MetadataValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            MetadataValue::Map(entries) => {
                let parts: Vec<String> =
                    entries.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

/// Insertion-ordered metadata map with unique keys.
///
/// Serializes as a plain map so the order survives a round trip through YAML or JSON.
pub type Metadata = OrderedMap<MetadataValue>;

// =====================================================
// Document
// =====================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub level: u8,
    pub text: String,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    External,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub kind: LinkKind,
    pub target: String,
    pub display: Option<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub content: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    pub completed: bool,
    pub assignee: Option<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetrics {
    pub word_count: usize,
    pub line_count: usize,
    pub byte_size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// A parsed note. Never mutated after parsing; edits produce a new value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub path: PathBuf,
    pub metadata: Metadata,
    /// Whether the source file carried a metadata block (even an empty or malformed one)
    pub has_metadata_block: bool,
    pub body: String,
    pub headers: Vec<Header>,
    pub links: Vec<Link>,
    pub code_blocks: Vec<CodeBlock>,
    pub checklist: Vec<ChecklistItem>,
    pub metrics: DocumentMetrics,
}

impl Document {
    pub fn external_links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(|l| l.kind == LinkKind::External)
    }

    pub fn internal_links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(|l| l.kind == LinkKind::Internal)
    }

    /// File name without extension, used as a fallback title.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

// =====================================================
// Classification
// =====================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeScore {
    pub name: String,
    pub confidence: f64,
    pub reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub primary_type: String,
    /// Sorted by confidence, highest first
    pub all_scores: Vec<TypeScore>,
    pub recommendations: Vec<String>,
}

impl DetectionResult {
    pub fn primary_score(&self) -> Option<&TypeScore> {
        self.all_scores.first()
    }

    pub fn confidence_of(&self, name: &str) -> Option<f64> {
        self.all_scores.iter().find(|s| s.name == name).map(|s| s.confidence)
    }
}

// =====================================================
// Link verification
// =====================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Valid,
    Broken,
    Redirect,
    Timeout,
    Error,
    Ambiguous,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Valid => "valid",
            LinkStatus::Broken => "broken",
            LinkStatus::Redirect => "redirect",
            LinkStatus::Timeout => "timeout",
            LinkStatus::Error => "error",
            LinkStatus::Ambiguous => "ambiguous",
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of checking an external URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalCheck {
    pub status: LinkStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of resolving an internal cross-reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalCheck {
    pub status: LinkStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<PathBuf>,
}

// =====================================================
// Change plan
// =====================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataChangeKind {
    Add,
    Remove,
    Modify,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataChange {
    pub kind: MetadataChangeKind,
    pub field: String,
    pub old_value: Option<MetadataValue>,
    pub new_value: Option<MetadataValue>,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentChangeKind {
    Summarize,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentChange {
    pub kind: ContentChangeKind,
    pub section_id: String,
    pub old_text: String,
    pub new_text: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkChangeKind {
    Verify,
    Update,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkChange {
    pub kind: LinkChangeKind,
    pub target: String,
    pub status: LinkStatus,
    pub replacement: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    /// Coarse tier from the total number of planned changes.
    pub fn from_change_count(count: usize) -> Self {
        match count {
            0..=3 => Complexity::Simple,
            4..=10 => Complexity::Moderate,
            _ => Complexity::Complex,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub original_size: u64,
    pub estimated_size: u64,
    pub size_delta_percent: f64,
    pub complexity: Complexity,
    pub requires_ai: bool,
    pub estimated_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePlan {
    pub category: String,
    pub metadata_changes: Vec<MetadataChange>,
    pub content_changes: Vec<ContentChange>,
    pub link_changes: Vec<LinkChange>,
    pub summary: PlanSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ChangePlan {
    /// No metadata or content edits and nothing beyond plain link verification.
    pub fn is_empty(&self) -> bool {
        self.metadata_changes.is_empty()
            && self.content_changes.is_empty()
            && self
                .link_changes
                .iter()
                .all(|c| c.kind == LinkChangeKind::Verify)
    }

    pub fn actionable_link_changes(&self) -> impl Iterator<Item = &LinkChange> {
        self.link_changes
            .iter()
            .filter(|c| c.kind != LinkChangeKind::Verify)
    }

    pub fn total_changes(&self) -> usize {
        self.metadata_changes.len() + self.content_changes.len() + self.link_changes.len()
    }
}

// =====================================================
// Backups
// =====================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRecord {
    pub original_path: PathBuf,
    pub backup_path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub size: u64,
    /// Hex SHA-256 of the original bytes at backup time
    pub checksum: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_keeps_insertion_order() {
        let mut md = Metadata::new();
        md.insert("title", MetadataValue::text("A"));
        md.insert("date", MetadataValue::text("2026-01-01"));
        md.insert("title", MetadataValue::text("B"));
        assert_eq!(md.keys().collect::<Vec<_>>(), vec!["title", "date"]);
        assert_eq!(md.get("title"), Some(&MetadataValue::text("B")));
        assert_eq!(md.remove("title"), Some(MetadataValue::text("B")));
        assert_eq!(md.len(), 1);
    }

    #[test]
    fn test_metadata_json_order() {
        let json = r#"{"z": 1, "a": ["x", "y"], "m": true}"#;
        let md: Metadata = serde_json::from_str(json).unwrap();
        assert_eq!(md.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
        assert_eq!(md.get("z"), Some(&MetadataValue::Integer(1)));
        let out = serde_json::to_string(&md).unwrap();
        assert_eq!(out, r#"{"z":1,"a":["x","y"],"m":true}"#);
    }

    #[test]
    fn test_nested_map_value() {
        let json = r#"{"extra": {"nested": 1, "other": "x"}}"#;
        let md: Metadata = serde_json::from_str(json).unwrap();
        let Some(MetadataValue::Map(extra)) = md.get("extra") else {
            panic!("expected a nested map");
        };
        assert_eq!(extra.keys().collect::<Vec<_>>(), vec!["nested", "other"]);
        assert_eq!(md.get("extra").unwrap().to_string(), "{nested: 1, other: x}");
        assert_eq!(serde_json::to_string(&md).unwrap(), json.replace(' ', ""));
    }

    #[test]
    fn test_plan_emptiness_ignores_verify() {
        let mut plan = ChangePlan {
            category: "note".to_string(),
            metadata_changes: vec![],
            content_changes: vec![],
            link_changes: vec![LinkChange {
                kind: LinkChangeKind::Verify,
                target: "https://example.com".to_string(),
                status: LinkStatus::Valid,
                replacement: None,
                reason: "reachable".to_string(),
            }],
            summary: PlanSummary {
                original_size: 10,
                estimated_size: 10,
                size_delta_percent: 0.0,
                complexity: Complexity::Simple,
                requires_ai: false,
                estimated_seconds: 1,
            },
            warnings: vec![],
        };
        assert!(plan.is_empty());
        plan.link_changes[0].kind = LinkChangeKind::Remove;
        assert!(!plan.is_empty());
    }

    #[test]
    fn test_complexity_tiers() {
        assert_eq!(Complexity::from_change_count(0), Complexity::Simple);
        assert_eq!(Complexity::from_change_count(3), Complexity::Simple);
        assert_eq!(Complexity::from_change_count(4), Complexity::Moderate);
        assert_eq!(Complexity::from_change_count(11), Complexity::Complex);
    }
}
