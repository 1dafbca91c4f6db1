//! Category-specific content scorers.
//!
//! Each scorer is a table of weighted signals; a signal contributes its weight
//! when its check holds. Weights per table sum to 1.0.

use crate::models::TypeProfile;
use notecurator_types::Document;
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

static DATE_STEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap());

const MEETING_HEADINGS: &[&str] = &["agenda", "attendees", "action items", "minutes", "decisions"];
const MEETING_VOCAB: &[&str] = &["meeting", "agenda", "attendees", "discussed", "action item", "minutes"];

const RESEARCH_HEADINGS: &[&str] = &["abstract", "findings", "references", "sources", "methodology"];
const RESEARCH_VOCAB: &[&str] = &["research", "study", "paper", "hypothesis", "evidence", "citation"];

const PROJECT_HEADINGS: &[&str] = &["goals", "milestones", "timeline", "deliverables", "risks"];
const PROJECT_VOCAB: &[&str] = &["milestone", "deadline", "deliverable", "roadmap", "owner"];

const DAILY_HEADINGS: &[&str] = &["today", "journal", "gratitude", "reflection", "tomorrow"];
const DAILY_VOCAB: &[&str] = &["today", "yesterday", "tomorrow", "morning", "evening"];

const TECH_HEADINGS: &[&str] = &["installation", "usage", "api", "configuration", "examples"];
const TECH_VOCAB: &[&str] = &["function", "install", "configure", "parameter", "endpoint", "command"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentScore {
    pub score: f64,
    pub reasons: Vec<String>,
}

pub type ContentScorer = fn(&Document, &TypeProfile) -> ContentScore;

struct Signal {
    weight: f64,
    reason: &'static str,
    check: fn(&Document, &TypeProfile) -> bool,
}

fn run_signals(signals: &[Signal], doc: &Document, profile: &TypeProfile) -> ContentScore {
    let mut result = ContentScore::default();
    for signal in signals {
        if (signal.check)(doc, profile) {
            result.score += signal.weight;
            result.reasons.push(signal.reason.to_string());
        }
    }
    result.score = result.score.clamp(0.0, 1.0);
    result
}

// =====================================================
// Shared checks
// =====================================================

fn case_insensitive(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern).case_insensitive(true).build().ok()
}

/// Headers matching any built-in or configured pattern. Invalid regexes fall back to substring match.
pub fn heading_matches(doc: &Document, builtin: &[&str], configured: &[String]) -> usize {
    let patterns: Vec<&str> = builtin
        .iter()
        .copied()
        .chain(configured.iter().map(String::as_str))
        .collect();
    let compiled: Vec<(Option<Regex>, String)> = patterns
        .iter()
        .map(|p| (case_insensitive(p), p.to_lowercase()))
        .collect();

    doc.headers
        .iter()
        .filter(|h| {
            let text = h.text.to_lowercase();
            compiled.iter().any(|(re, raw)| match re {
                Some(re) => re.is_match(&h.text),
                None => text.contains(raw.as_str()),
            })
        })
        .count()
}

/// Whole-word occurrences of the given words and phrases in the body.
pub fn vocabulary_hits(doc: &Document, builtin: &[&str], configured: &[String]) -> usize {
    let mut words: Vec<&str> = Vec::new();
    for w in builtin.iter().copied().chain(configured.iter().map(String::as_str)) {
        if !w.trim().is_empty() && !words.iter().any(|x| x.eq_ignore_ascii_case(w)) {
            words.push(w);
        }
    }
    words
        .iter()
        .filter_map(|w| case_insensitive(&format!(r"\b{}\b", regex::escape(w.trim()))))
        .map(|re| re.find_iter(&doc.body).count())
        .sum()
}

fn has_date_stem(doc: &Document) -> bool {
    DATE_STEM_RE.is_match(&doc.stem())
}

// =====================================================
// Tables
// =====================================================

const MEETING_SIGNALS: &[Signal] = &[
    Signal {
        weight: 0.5,
        reason: "Has meeting headings (agenda, attendees, action items)",
        check: |d, p| heading_matches(d, MEETING_HEADINGS, &p.detection.heading_patterns) >= 1,
    },
    Signal {
        weight: 0.25,
        reason: "Has checklist items",
        check: |d, _| !d.checklist.is_empty(),
    },
    Signal {
        weight: 0.25,
        reason: "Uses meeting vocabulary",
        check: |d, p| vocabulary_hits(d, MEETING_VOCAB, &p.detection.keywords) >= 1,
    },
];

const RESEARCH_SIGNALS: &[Signal] = &[
    Signal {
        weight: 0.375,
        reason: "Has research headings (findings, references, sources)",
        check: |d, p| heading_matches(d, RESEARCH_HEADINGS, &p.detection.heading_patterns) >= 1,
    },
    Signal {
        weight: 0.25,
        reason: "Cites several external sources",
        check: |d, _| d.external_links().count() >= 2,
    },
    Signal {
        weight: 0.25,
        reason: "Uses research vocabulary",
        check: |d, p| vocabulary_hits(d, RESEARCH_VOCAB, &p.detection.keywords) >= 2,
    },
    Signal {
        weight: 0.125,
        reason: "Long-form body",
        check: |d, _| d.metrics.word_count >= 300,
    },
];

const PROJECT_SIGNALS: &[Signal] = &[
    Signal {
        weight: 0.375,
        reason: "Has planning headings (goals, milestones, timeline)",
        check: |d, p| heading_matches(d, PROJECT_HEADINGS, &p.detection.heading_patterns) >= 1,
    },
    Signal {
        weight: 0.25,
        reason: "Has a task list",
        check: |d, _| d.checklist.len() >= 3,
    },
    Signal {
        weight: 0.25,
        reason: "Uses planning vocabulary",
        check: |d, p| vocabulary_hits(d, PROJECT_VOCAB, &p.detection.keywords) >= 1,
    },
    Signal {
        weight: 0.125,
        reason: "Tasks have owners",
        check: |d, _| d.checklist.iter().any(|c| c.assignee.is_some()),
    },
];

const DAILY_SIGNALS: &[Signal] = &[
    Signal {
        weight: 0.5,
        reason: "File name starts with a date",
        check: |d, _| has_date_stem(d),
    },
    Signal {
        weight: 0.25,
        reason: "Has journal headings",
        check: |d, p| heading_matches(d, DAILY_HEADINGS, &p.detection.heading_patterns) >= 1,
    },
    Signal {
        weight: 0.125,
        reason: "Uses day-to-day vocabulary",
        check: |d, p| vocabulary_hits(d, DAILY_VOCAB, &p.detection.keywords) >= 1,
    },
    Signal {
        weight: 0.125,
        reason: "Has checklist items",
        check: |d, _| !d.checklist.is_empty(),
    },
];

const TECH_SIGNALS: &[Signal] = &[
    Signal {
        weight: 0.5,
        reason: "Contains code blocks",
        check: |d, _| !d.code_blocks.is_empty(),
    },
    Signal {
        weight: 0.25,
        reason: "Has documentation headings (installation, usage, api)",
        check: |d, p| heading_matches(d, TECH_HEADINGS, &p.detection.heading_patterns) >= 1,
    },
    Signal {
        weight: 0.125,
        reason: "Uses technical vocabulary",
        check: |d, p| vocabulary_hits(d, TECH_VOCAB, &p.detection.keywords) >= 2,
    },
    Signal {
        weight: 0.125,
        reason: "Links to external references",
        check: |d, _| d.external_links().next().is_some(),
    },
];

const GENERIC_SIGNALS: &[Signal] = &[
    Signal {
        weight: 0.5,
        reason: "Has headings matching the category",
        check: |d, p| heading_matches(d, &[], &p.detection.heading_patterns) >= 1,
    },
    Signal {
        weight: 0.5,
        reason: "Uses the category's keywords",
        check: |d, p| vocabulary_hits(d, &[], &p.detection.keywords) >= 1,
    },
];

fn meeting_notes(doc: &Document, profile: &TypeProfile) -> ContentScore {
    run_signals(MEETING_SIGNALS, doc, profile)
}

fn research_notes(doc: &Document, profile: &TypeProfile) -> ContentScore {
    run_signals(RESEARCH_SIGNALS, doc, profile)
}

fn project_plan(doc: &Document, profile: &TypeProfile) -> ContentScore {
    run_signals(PROJECT_SIGNALS, doc, profile)
}

fn daily_note(doc: &Document, profile: &TypeProfile) -> ContentScore {
    run_signals(DAILY_SIGNALS, doc, profile)
}

fn technical_doc(doc: &Document, profile: &TypeProfile) -> ContentScore {
    run_signals(TECH_SIGNALS, doc, profile)
}

/// Scorer for categories without a dedicated table, driven by configured patterns only.
pub fn generic(doc: &Document, profile: &TypeProfile) -> ContentScore {
    run_signals(GENERIC_SIGNALS, doc, profile)
}

/// Category name -> content scorer.
pub struct ContentScorers {
    scorers: Vec<(&'static str, ContentScorer)>,
}

impl Default for ContentScorers {
    fn default() -> Self {
        Self {
            scorers: vec![
                ("meeting-notes", meeting_notes as ContentScorer),
                ("research-notes", research_notes),
                ("project-plan", project_plan),
                ("daily-note", daily_note),
                ("technical-doc", technical_doc),
            ],
        }
    }
}

impl ContentScorers {
    pub fn get(&self, category: &str) -> ContentScorer {
        self.scorers
            .iter()
            .find(|(name, _)| *name == category)
            .map(|(_, f)| *f)
            .unwrap_or(generic)
    }

    pub fn score(&self, doc: &Document, profile: &TypeProfile) -> ContentScore {
        (self.get(&profile.name))(doc, profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::parse_content;
    use std::path::PathBuf;

    fn doc(name: &str, body: &str) -> Document {
        parse_content(PathBuf::from(format!("/v/{}", name)), body, body.len() as u64, None).0
    }

    #[test]
    fn test_signal_weights_sum_to_one() {
        for table in [
            MEETING_SIGNALS,
            RESEARCH_SIGNALS,
            PROJECT_SIGNALS,
            DAILY_SIGNALS,
            TECH_SIGNALS,
            GENERIC_SIGNALS,
        ] {
            let total: f64 = table.iter().map(|s| s.weight).sum();
            assert_eq!(total, 1.0);
        }
    }

    #[test]
    fn test_meeting_scorer_full_marks() {
        let d = doc("sync.md", "## Agenda\n- [ ] one\n- [ ] two\n");
        let score = ContentScorers::default().score(&d, &TypeProfile::named("meeting-notes"));
        assert_eq!(score.score, 1.0);
        assert_eq!(score.reasons.len(), 3);
    }

    #[test]
    fn test_technical_doc_code_blocks() {
        let d = doc("guide.md", "## Usage\n```sh\ncargo install thing\n```\n");
        let score = ContentScorers::default().score(&d, &TypeProfile::named("technical-doc"));
        assert_eq!(score.score, 0.75);
    }

    #[test]
    fn test_daily_note_date_stem() {
        let d = doc("2026-10-16.md", "Nothing much\n");
        let score = ContentScorers::default().score(&d, &TypeProfile::named("daily-note"));
        assert_eq!(score.score, 0.5);
    }

    #[test]
    fn test_generic_scorer_uses_profile() {
        let mut profile = TypeProfile::named("recipe");
        profile.detection.heading_patterns = vec!["^ingredients$".to_string()];
        profile.detection.keywords = vec!["flour".to_string()];

        let d = doc("bread.md", "## Ingredients\n500g flour\n");
        assert_eq!(ContentScorers::default().score(&d, &profile).score, 1.0);

        let empty = TypeProfile::named("empty");
        assert_eq!(ContentScorers::default().score(&d, &empty).score, 0.0);
    }

    #[test]
    fn test_vocabulary_whole_words() {
        let d = doc("x.md", "Meetings are not a meeting. Another MEETING.\n");
        assert_eq!(vocabulary_hits(&d, &["meeting"], &[]), 2);
    }
}
