//! Curation configuration model backed by JSON tier files.
//!
//! `CurationConfig` is the effective, fully-populated configuration. Tier files
//! deserialize into `ConfigTier`, where every field is optional, and are merged
//! onto the compiled-in defaults by `CurationConfig::apply_tier`.

use super::builtin_types;
use crate::backup::retention;
use crate::config::defaults;
use notecurator_types::OrderedMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a modify rule combines its value with the current field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifyOperation {
    Append,
    Prepend,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifyRule {
    pub operation: ModifyOperation,
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRules {
    #[serde(default)]
    pub keep: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
    /// Field -> literal value or template string with `{{placeholder}}`s
    #[serde(default)]
    pub add: OrderedMap<Value>,
    #[serde(default)]
    pub modify: OrderedMap<ModifyRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRules {
    #[serde(default)]
    pub summarize: bool,
    /// Section ids (slugified headings) never summarized
    #[serde(default)]
    pub preserve_sections: Vec<String>,
    #[serde(default = "default_true")]
    pub fetch_links: bool,
    #[serde(default)]
    pub summary_style: Option<String>,
}

impl Default for ContentRules {
    fn default() -> Self {
        Self {
            summarize: false,
            preserve_sections: Vec::new(),
            fetch_links: true,
            summary_style: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRules {
    /// Glob patterns matched against the full path and the file name
    #[serde(default)]
    pub path_patterns: Vec<String>,
    /// Case-insensitive regexes matched against heading text
    #[serde(default)]
    pub heading_patterns: Vec<String>,
    /// Category vocabulary, single words or phrases
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Transformation and detection rules for one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub metadata: MetadataRules,
    #[serde(default)]
    pub content: ContentRules,
    #[serde(default)]
    pub detection: DetectionRules,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingPreferences {
    #[serde(default = "default_max_file_size_kb")]
    pub max_file_size_kb: u64,
    #[serde(default = "default_link_timeout_secs")]
    pub link_timeout_secs: u64,
    #[serde(default = "default_link_cache_ttl_hours")]
    pub link_cache_ttl_hours: u64,
    #[serde(default = "default_link_concurrency")]
    pub link_concurrency: usize,
    #[serde(default = "default_search_depth")]
    pub search_depth: usize,
    #[serde(default = "default_true")]
    pub check_external_links: bool,
}

impl Default for ProcessingPreferences {
    fn default() -> Self {
        Self {
            max_file_size_kb: defaults::MAX_FILE_SIZE_KB,
            link_timeout_secs: defaults::LINK_TIMEOUT_SECS,
            link_cache_ttl_hours: defaults::LINK_CACHE_TTL_HOURS,
            link_concurrency: defaults::LINK_CONCURRENCY,
            search_depth: defaults::SEARCH_DEPTH,
            check_external_links: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_file_size_kb() -> u64 {
    defaults::MAX_FILE_SIZE_KB
}

fn default_link_timeout_secs() -> u64 {
    defaults::LINK_TIMEOUT_SECS
}

fn default_link_cache_ttl_hours() -> u64 {
    defaults::LINK_CACHE_TTL_HOURS
}

fn default_link_concurrency() -> usize {
    defaults::LINK_CONCURRENCY
}

fn default_search_depth() -> usize {
    defaults::SEARCH_DEPTH
}

fn default_ai_provider() -> String {
    defaults::AI_PROVIDER.to_string()
}

fn default_backup_retention() -> String {
    defaults::BACKUP_RETENTION.to_string()
}

/// Effective configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurationConfig {
    #[serde(default = "default_ai_provider")]
    pub ai_provider: String,
    #[serde(default = "default_backup_retention")]
    pub backup_retention: String,
    #[serde(default)]
    pub processing: ProcessingPreferences,
    #[serde(default)]
    pub types: OrderedMap<TypeProfile>,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            ai_provider: default_ai_provider(),
            backup_retention: default_backup_retention(),
            processing: ProcessingPreferences::default(),
            types: builtin_types::builtin_profiles(),
        }
    }
}

// =====================================================
// Override tiers
// =====================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingTier {
    pub max_file_size_kb: Option<u64>,
    pub link_timeout_secs: Option<u64>,
    pub link_cache_ttl_hours: Option<u64>,
    pub link_concurrency: Option<usize>,
    pub search_depth: Option<usize>,
    pub check_external_links: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataRulesTier {
    pub keep: Option<Vec<String>>,
    pub remove: Option<Vec<String>>,
    pub add: Option<OrderedMap<Value>>,
    pub modify: Option<OrderedMap<ModifyRule>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRulesTier {
    pub summarize: Option<bool>,
    pub preserve_sections: Option<Vec<String>>,
    pub fetch_links: Option<bool>,
    pub summary_style: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRulesTier {
    pub path_patterns: Option<Vec<String>>,
    pub heading_patterns: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypeProfileTier {
    pub metadata: Option<MetadataRulesTier>,
    pub content: Option<ContentRulesTier>,
    pub detection: Option<DetectionRulesTier>,
}

/// One parsed tier file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigTier {
    pub ai_provider: Option<String>,
    pub backup_retention: Option<String>,
    pub processing: Option<ProcessingTier>,
    #[serde(default)]
    pub types: OrderedMap<TypeProfileTier>,
}

impl ConfigTier {
    pub fn from_json(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| format!("invalid config JSON: {}", e))
    }
}

/// Union `extra` into `target`, keeping first-appearance order and dropping duplicates.
pub fn union_into(target: &mut Vec<String>, extra: Vec<String>) {
    let mut merged: Vec<String> = Vec::with_capacity(target.len() + extra.len());
    for item in target.drain(..).chain(extra) {
        if !merged.contains(&item) {
            merged.push(item);
        }
    }
    *target = merged;
}

impl TypeProfile {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn apply_tier(&mut self, tier: TypeProfileTier) {
        if let Some(md) = tier.metadata {
            if let Some(keep) = md.keep {
                union_into(&mut self.metadata.keep, keep);
            }
            if let Some(remove) = md.remove {
                union_into(&mut self.metadata.remove, remove);
            }
            if let Some(add) = md.add {
                self.metadata.add.extend_override(add);
            }
            if let Some(modify) = md.modify {
                self.metadata.modify.extend_override(modify);
            }
        }
        if let Some(content) = tier.content {
            if let Some(summarize) = content.summarize {
                self.content.summarize = summarize;
            }
            if let Some(sections) = content.preserve_sections {
                union_into(&mut self.content.preserve_sections, sections);
            }
            if let Some(fetch) = content.fetch_links {
                self.content.fetch_links = fetch;
            }
            if content.summary_style.is_some() {
                self.content.summary_style = content.summary_style;
            }
        }
        if let Some(detection) = tier.detection {
            if let Some(patterns) = detection.path_patterns {
                union_into(&mut self.detection.path_patterns, patterns);
            }
            if let Some(patterns) = detection.heading_patterns {
                union_into(&mut self.detection.heading_patterns, patterns);
            }
            if let Some(keywords) = detection.keywords {
                union_into(&mut self.detection.keywords, keywords);
            }
        }
    }
}

impl CurationConfig {
    /// Configuration with no categories at all (compiled-in settings only).
    pub fn without_types() -> Self {
        Self {
            types: OrderedMap::new(),
            ..Self::default()
        }
    }

    pub fn profile(&self, name: &str) -> Option<&TypeProfile> {
        self.types.get(name)
    }

    /// Merge one tier onto this configuration. Returns warnings for rejected values.
    pub fn apply_tier(&mut self, tier: ConfigTier) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(provider) = tier.ai_provider {
            self.ai_provider = provider;
        }
        if let Some(retention_str) = tier.backup_retention {
            if retention::is_valid_retention(&retention_str) {
                self.backup_retention = retention_str;
            } else {
                warnings.push(format!(
                    "Ignoring invalid backupRetention '{}' (expected e.g. 30d, 2w, 12h, 6m)",
                    retention_str
                ));
            }
        }
        if let Some(p) = tier.processing {
            let prefs = &mut self.processing;
            if let Some(v) = p.max_file_size_kb {
                prefs.max_file_size_kb = v;
            }
            if let Some(v) = p.link_timeout_secs {
                prefs.link_timeout_secs = v.max(1);
            }
            if let Some(v) = p.link_cache_ttl_hours {
                if v <= defaults::MAX_LINK_CACHE_TTL_HOURS {
                    prefs.link_cache_ttl_hours = v;
                } else {
                    warnings.push(format!(
                        "Ignoring linkCacheTtlHours {} (maximum is {})",
                        v,
                        defaults::MAX_LINK_CACHE_TTL_HOURS
                    ));
                }
            }
            if let Some(v) = p.link_concurrency {
                prefs.link_concurrency = v.max(1);
            }
            if let Some(v) = p.search_depth {
                prefs.search_depth = v.max(1);
            }
            if let Some(v) = p.check_external_links {
                prefs.check_external_links = v;
            }
        }
        for (name, profile_tier) in tier.types {
            match self.types.get_mut(&name) {
                Some(profile) => profile.apply_tier(profile_tier),
                None => {
                    let mut profile = TypeProfile::named(&name);
                    profile.apply_tier(profile_tier);
                    self.types.insert(name, profile);
                }
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_have_builtin_types() {
        let config = CurationConfig::default();
        assert_eq!(config.ai_provider, "none");
        assert_eq!(config.backup_retention, "30d");
        assert!(config.profile("meeting-notes").is_some());
        assert_eq!(config.profile("meeting-notes").unwrap().name, "meeting-notes");
    }

    #[test]
    fn test_union_into_dedupes_and_keeps_order() {
        let mut keep = vec!["title".to_string(), "date".to_string()];
        union_into(&mut keep, vec!["date".to_string(), "tags".to_string(), "tags".to_string()]);
        assert_eq!(keep, vec!["title", "date", "tags"]);
    }

    #[test]
    fn test_apply_tier_merge_policy() {
        let mut config = CurationConfig::default();
        let before_keep = config.profile("meeting-notes").unwrap().metadata.keep.clone();

        let tier = ConfigTier::from_json(
            r#"{
                "aiProvider": "openai",
                "backupRetention": "2w",
                "processing": {"linkConcurrency": 8},
                "types": {
                    "meeting-notes": {
                        "metadata": {
                            "keep": ["location", "date"],
                            "add": {"type": "meeting"},
                            "modify": {"tags": {"operation": "prepend", "value": "mtg"}}
                        },
                        "content": {"summarize": true}
                    },
                    "recipe": {
                        "metadata": {"keep": ["servings"]},
                        "detection": {"headingPatterns": ["ingredients"]}
                    }
                }
            }"#,
        )
        .unwrap();

        let warnings = config.apply_tier(tier);
        assert!(warnings.is_empty());
        assert_eq!(config.ai_provider, "openai");
        assert_eq!(config.backup_retention, "2w");
        assert_eq!(config.processing.link_concurrency, 8);
        assert_eq!(config.processing.link_timeout_secs, defaults::LINK_TIMEOUT_SECS);

        let meeting = config.profile("meeting-notes").unwrap();
        for field in &before_keep {
            assert!(meeting.metadata.keep.contains(field));
        }
        assert!(meeting.metadata.keep.contains(&"location".to_string()));
        assert_eq!(
            meeting.metadata.keep.iter().filter(|k| *k == "date").count(),
            1
        );
        assert_eq!(meeting.metadata.add.get("type"), Some(&Value::from("meeting")));
        assert_eq!(
            meeting.metadata.modify.get("tags").map(|r| r.operation),
            Some(ModifyOperation::Prepend)
        );
        assert!(meeting.content.summarize);

        // New category lands after the builtins
        assert_eq!(config.types.keys().last(), Some("recipe"));
        assert_eq!(config.profile("recipe").unwrap().name, "recipe");
    }

    #[test]
    fn test_invalid_retention_is_ignored() {
        let mut config = CurationConfig::default();
        let tier = ConfigTier::from_json(r#"{"backupRetention": "forever"}"#).unwrap();
        let warnings = config.apply_tier(tier);
        assert_eq!(config.backup_retention, "30d");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_out_of_range_values_are_warnings() {
        let mut config = CurationConfig::default();
        let tier = ConfigTier::from_json(
            r#"{"backupRetention": "100000000d", "processing": {"linkCacheTtlHours": 9000000}}"#,
        )
        .unwrap();
        let warnings = config.apply_tier(tier);
        assert_eq!(warnings.len(), 2);
        assert_eq!(config.backup_retention, "30d");
        assert_eq!(config.processing.link_cache_ttl_hours, defaults::LINK_CACHE_TTL_HOURS);
    }

    #[test]
    fn test_tier_rejects_wrong_shape() {
        assert!(ConfigTier::from_json(r#"{"types": []}"#).is_err());
        assert!(ConfigTier::from_json("not json").is_err());
        assert!(ConfigTier::from_json("{}").is_ok());
    }
}
