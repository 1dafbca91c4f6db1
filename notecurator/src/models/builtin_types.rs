//! Compiled-in category profiles.

use super::curation_config::{
    ContentRules, DetectionRules, MetadataRules, ModifyOperation, ModifyRule, TypeProfile,
};
use notecurator_types::OrderedMap;
use serde_json::Value;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn adds(items: &[(&str, &str)]) -> OrderedMap<Value> {
    items.iter().map(|(k, v)| (*k, Value::from(*v))).collect()
}

fn meeting_notes() -> TypeProfile {
    TypeProfile {
        name: "meeting-notes".to_string(),
        metadata: MetadataRules {
            keep: strings(&["title", "date", "attendees", "project", "tags", "type"]),
            remove: strings(&["draft", "wip"]),
            add: adds(&[("type", "meeting"), ("reviewed", "{{date}}")]),
            modify: [(
                "tags",
                ModifyRule {
                    operation: ModifyOperation::Append,
                    value: Value::from("meeting"),
                },
            )]
            .into_iter()
            .collect(),
        },
        content: ContentRules {
            preserve_sections: strings(&["agenda", "action-items", "decisions"]),
            summary_style: Some("bullet points".to_string()),
            ..Default::default()
        },
        detection: DetectionRules {
            path_patterns: strings(&["**/meetings/**", "*meeting*", "*standup*", "*sync*"]),
            heading_patterns: strings(&[
                "agenda",
                "attendees",
                "action items",
                "decisions",
                "minutes",
                "next steps",
            ]),
            keywords: strings(&[
                "meeting",
                "agenda",
                "attendees",
                "discussed",
                "action item",
                "decision",
                "follow-up",
                "minutes",
            ]),
        },
    }
}

fn research_notes() -> TypeProfile {
    TypeProfile {
        name: "research-notes".to_string(),
        metadata: MetadataRules {
            keep: strings(&["title", "source", "tags", "date", "topic"]),
            remove: strings(&["draft"]),
            add: adds(&[("word_count", "{{word_count}}"), ("reading_time", "{{reading_time}}")]),
            modify: OrderedMap::new(),
        },
        content: ContentRules {
            summarize: true,
            preserve_sections: strings(&["references", "sources", "quotes"]),
            summary_style: Some("concise abstract".to_string()),
            ..Default::default()
        },
        detection: DetectionRules {
            path_patterns: strings(&["**/research/**", "*research*", "*paper*", "*literature*"]),
            heading_patterns: strings(&[
                "abstract",
                "summary",
                "findings",
                "references",
                "sources",
                "methodology",
                "conclusion",
            ]),
            keywords: strings(&[
                "research",
                "study",
                "paper",
                "findings",
                "hypothesis",
                "evidence",
                "source",
                "citation",
            ]),
        },
    }
}

fn project_plan() -> TypeProfile {
    TypeProfile {
        name: "project-plan".to_string(),
        metadata: MetadataRules {
            keep: strings(&["title", "status", "owner", "due", "tags", "project"]),
            remove: strings(&["wip"]),
            add: adds(&[("type", "project")]),
            modify: OrderedMap::new(),
        },
        content: ContentRules {
            preserve_sections: strings(&["milestones", "timeline", "goals"]),
            ..Default::default()
        },
        detection: DetectionRules {
            path_patterns: strings(&["**/projects/**", "*plan*", "*roadmap*"]),
            heading_patterns: strings(&[
                "goals",
                "milestones",
                "timeline",
                "deliverables",
                "risks",
                "scope",
                "tasks",
            ]),
            keywords: strings(&[
                "milestone",
                "deadline",
                "deliverable",
                "roadmap",
                "scope",
                "risk",
                "owner",
                "phase",
            ]),
        },
    }
}

fn daily_note() -> TypeProfile {
    TypeProfile {
        name: "daily-note".to_string(),
        metadata: MetadataRules {
            keep: strings(&["date", "tags", "mood"]),
            remove: Vec::new(),
            add: adds(&[("created", "{{modified}}")]),
            modify: OrderedMap::new(),
        },
        content: ContentRules {
            fetch_links: false,
            ..Default::default()
        },
        detection: DetectionRules {
            path_patterns: strings(&[
                "**/daily/**",
                "**/journal/**",
                "[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]*",
            ]),
            heading_patterns: strings(&[
                "today",
                "journal",
                "log",
                "gratitude",
                "reflection",
                "tomorrow",
            ]),
            keywords: strings(&[
                "today",
                "yesterday",
                "tomorrow",
                "morning",
                "evening",
                "feeling",
                "grateful",
            ]),
        },
    }
}

fn technical_doc() -> TypeProfile {
    TypeProfile {
        name: "technical-doc".to_string(),
        metadata: MetadataRules {
            keep: strings(&["title", "tags", "language", "version", "updated"]),
            remove: strings(&["draft"]),
            add: adds(&[("updated", "{{date}}")]),
            modify: OrderedMap::new(),
        },
        content: ContentRules {
            preserve_sections: strings(&["installation", "usage", "api", "examples"]),
            ..Default::default()
        },
        detection: DetectionRules {
            path_patterns: strings(&["**/docs/**", "*readme*", "*guide*", "*api*"]),
            heading_patterns: strings(&[
                "installation",
                "usage",
                "api",
                "configuration",
                "examples",
                "setup",
                "troubleshooting",
            ]),
            keywords: strings(&[
                "function",
                "install",
                "configure",
                "api",
                "parameter",
                "endpoint",
                "command",
                "library",
            ]),
        },
    }
}

/// Built-in profiles in their configured order.
pub fn builtin_profiles() -> OrderedMap<TypeProfile> {
    [meeting_notes(), research_notes(), project_plan(), daily_note(), technical_doc()]
        .into_iter()
        .map(|p| (p.name.clone(), p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_order_and_names() {
        let profiles = builtin_profiles();
        assert_eq!(
            profiles.keys().collect::<Vec<_>>(),
            vec!["meeting-notes", "research-notes", "project-plan", "daily-note", "technical-doc"]
        );
        for (key, profile) in profiles.iter() {
            assert_eq!(key, profile.name);
            assert!(!profile.metadata.keep.is_empty());
        }
    }

    #[test]
    fn test_daily_date_glob_matches() {
        let profiles = builtin_profiles();
        let pattern = &profiles.get("daily-note").unwrap().detection.path_patterns[2];
        assert!(glob::Pattern::new(pattern).unwrap().matches("2026-10-16.md"));
    }
}
