//! `{{placeholder}}` substitution for metadata add-rules.

use chrono::{DateTime, Utc};
use notecurator_types::Document;
use regex::Regex;
use std::sync::LazyLock;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

const WORDS_PER_MINUTE: usize = 200;
const SHORT_MAX_WORDS: usize = 300;
const MEDIUM_MAX_WORDS: usize = 1500;

/// Inputs available to placeholders
pub struct TemplateContext<'a> {
    pub document: &'a Document,
    pub category: &'a str,
    pub now: DateTime<Utc>,
}

pub type Placeholder = fn(&TemplateContext) -> String;

/// Result of rendering one template
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub text: String,
    /// Placeholder names that were left as literal text
    pub unknown: Vec<String>,
}

fn date(ctx: &TemplateContext) -> String {
    ctx.now.format("%Y-%m-%d").to_string()
}

fn datetime(ctx: &TemplateContext) -> String {
    ctx.now.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn time(ctx: &TemplateContext) -> String {
    ctx.now.format("%H:%M").to_string()
}

fn year(ctx: &TemplateContext) -> String {
    ctx.now.format("%Y").to_string()
}

fn word_count(ctx: &TemplateContext) -> String {
    ctx.document.metrics.word_count.to_string()
}

fn line_count(ctx: &TemplateContext) -> String {
    ctx.document.metrics.line_count.to_string()
}

fn length(ctx: &TemplateContext) -> String {
    match ctx.document.metrics.word_count {
        n if n < SHORT_MAX_WORDS => "short",
        n if n < MEDIUM_MAX_WORDS => "medium",
        _ => "long",
    }
    .to_string()
}

fn reading_time(ctx: &TemplateContext) -> String {
    let minutes = ctx.document.metrics.word_count.div_ceil(WORDS_PER_MINUTE).max(1);
    format!("{} min", minutes)
}

fn title(ctx: &TemplateContext) -> String {
    let doc = ctx.document;
    if let Some(t) = doc.metadata.get("title").and_then(|v| v.as_str()) {
        if !t.trim().is_empty() {
            return t.to_string();
        }
    }
    doc.headers
        .iter()
        .find(|h| h.level == 1)
        .map(|h| h.text.clone())
        .unwrap_or_else(|| doc.stem())
}

fn filename(ctx: &TemplateContext) -> String {
    ctx.document
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn category(ctx: &TemplateContext) -> String {
    ctx.category.to_string()
}

fn modified(ctx: &TemplateContext) -> String {
    ctx.document
        .metrics
        .modified
        .unwrap_or(ctx.now)
        .format("%Y-%m-%d")
        .to_string()
}

/// Placeholder name -> value function.
pub struct TemplateRegistry {
    placeholders: Vec<(&'static str, Placeholder)>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self {
            placeholders: vec![
                ("date", date as Placeholder),
                ("datetime", datetime),
                ("time", time),
                ("year", year),
                ("word_count", word_count),
                ("line_count", line_count),
                ("length", length),
                ("reading_time", reading_time),
                ("title", title),
                ("filename", filename),
                ("category", category),
                ("modified", modified),
            ],
        }
    }
}

impl TemplateRegistry {
    pub fn get(&self, name: &str) -> Option<Placeholder> {
        self.placeholders
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, f)| *f)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.placeholders.iter().map(|(n, _)| *n)
    }

    /// Substitute every known placeholder. Unknown ones stay as written.
    pub fn render(&self, template: &str, ctx: &TemplateContext) -> Rendered {
        let mut unknown = Vec::new();
        let text = PLACEHOLDER_RE
            .replace_all(template, |caps: &regex::Captures| {
                let name = &caps[1];
                match self.get(name) {
                    Some(f) => f(ctx),
                    None => {
                        if !unknown.iter().any(|u| u == name) {
                            unknown.push(name.to_string());
                        }
                        caps[0].to_string()
                    }
                }
            })
            .into_owned();
        Rendered { text, unknown }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::parse_content;
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn ctx_doc(body: &str) -> Document {
        parse_content(PathBuf::from("/v/weekly-sync.md"), body, body.len() as u64, None).0
    }

    #[test]
    fn test_render_known_placeholders() {
        let doc = ctx_doc("# Weekly Sync\none two three\n");
        let ctx = TemplateContext {
            document: &doc,
            category: "meeting-notes",
            now: Utc.with_ymd_and_hms(2026, 2, 18, 9, 30, 0).unwrap(),
        };
        let registry = TemplateRegistry::default();

        let r = registry.render("{{title}} ({{category}}) on {{date}} at {{time}}", &ctx);
        assert_eq!(r.text, "Weekly Sync (meeting-notes) on 2026-02-18 at 09:30");
        assert!(r.unknown.is_empty());

        assert_eq!(registry.render("{{ word_count }}", &ctx).text, "6");
        assert_eq!(registry.render("{{length}}", &ctx).text, "short");
        assert_eq!(registry.render("{{reading_time}}", &ctx).text, "1 min");
        assert_eq!(registry.render("{{filename}}", &ctx).text, "weekly-sync.md");
        assert_eq!(registry.render("{{modified}}", &ctx).text, "2026-02-18");
        assert_eq!(registry.render("{{datetime}}", &ctx).text, "2026-02-18T09:30:00Z");
    }

    #[test]
    fn test_unknown_placeholder_left_literal() {
        let doc = ctx_doc("text\n");
        let ctx = TemplateContext {
            document: &doc,
            category: "x",
            now: Utc::now(),
        };
        let r = TemplateRegistry::default().render("by {{author}} in {{year}}", &ctx);
        assert!(r.text.starts_with("by {{author}} in 2"));
        assert_eq!(r.unknown, vec!["author".to_string()]);
    }

    #[test]
    fn test_title_fallbacks() {
        let doc = ctx_doc("no heading\n");
        let ctx = TemplateContext {
            document: &doc,
            category: "x",
            now: Utc::now(),
        };
        assert_eq!(TemplateRegistry::default().render("{{title}}", &ctx).text, "weekly-sync");
    }
}
