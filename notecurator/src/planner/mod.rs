//! Change planning: metadata diffs, content summaries and link actions.
//!
//! A plan is computed from a parsed document, the category profile and the
//! already-resolved link statuses. Nothing is written here.

pub mod apply;
pub mod templates;

use crate::links::LinkReport;
use crate::models::{ModifyOperation, ModifyRule, TypeProfile};
use crate::notes::file_ops::slugify;
use crate::notes::frontmatter;
use crate::notes::structure;
use crate::pipeline::summarizer::Summarizer;
use chrono::{DateTime, Utc};
use notecurator_types::{
    ChangePlan, Complexity, ContentChange, ContentChangeKind, Document, LinkChange, LinkChangeKind,
    LinkStatus, MetadataChange, MetadataChangeKind, MetadataValue, PlanSummary,
};
use serde_json::Value;
use templates::{TemplateContext, TemplateRegistry};

/// Section id used for text before the first heading
pub const INTRO_SECTION: &str = "intro";
const DEFAULT_SUMMARY_HINT: &str = "concise";

/// A body section delimited by headings
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: String,
    pub heading: Option<String>,
    pub text: String,
}

/// Split a body into sections at every heading. Fenced code is never split.
pub fn split_sections(body: &str) -> Vec<Section> {
    let lines: Vec<&str> = body.lines().collect();
    let headers = structure::scan_body(body, 1).headers;

    let mut sections = Vec::new();
    let first_heading = headers.first().map(|h| h.line - 1).unwrap_or(lines.len());
    let intro = lines[..first_heading].join("\n");
    if !intro.trim().is_empty() {
        sections.push(Section {
            id: INTRO_SECTION.to_string(),
            heading: None,
            text: intro,
        });
    }

    for (i, header) in headers.iter().enumerate() {
        let start = header.line.min(lines.len());
        let end = headers
            .get(i + 1)
            .map(|next| next.line - 1)
            .unwrap_or(lines.len())
            .max(start);
        sections.push(Section {
            id: slugify(&header.text),
            heading: Some(header.text.clone()),
            text: lines[start..end].join("\n"),
        });
    }
    sections
}

/// Convert a config JSON value into a metadata value.
pub fn metadata_from_json(value: &Value) -> MetadataValue {
    match value {
        Value::Null => MetadataValue::Null,
        Value::Bool(b) => MetadataValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => MetadataValue::Integer(i),
            None => MetadataValue::Float(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => MetadataValue::Text(s.clone()),
        Value::Array(items) => MetadataValue::List(items.iter().map(metadata_from_json).collect()),
        Value::Object(entries) => MetadataValue::Map(
            entries
                .iter()
                .map(|(k, v)| (k.as_str(), metadata_from_json(v)))
                .collect(),
        ),
    }
}

/// Append or prepend `value` to `current`. Lists gain missing items, text is concatenated.
pub fn combine(current: &MetadataValue, rule: &ModifyRule, value: MetadataValue) -> MetadataValue {
    let prepend = rule.operation == ModifyOperation::Prepend;
    match (current, rule.operation) {
        (_, ModifyOperation::Replace) => value,
        (MetadataValue::Null, _) => value,
        (MetadataValue::List(items), _) => {
            let additions: Vec<MetadataValue> = match value {
                MetadataValue::List(v) => v,
                other => vec![other],
            };
            let mut missing: Vec<MetadataValue> = Vec::new();
            for item in additions {
                if !items.contains(&item) && !missing.contains(&item) {
                    missing.push(item);
                }
            }
            let mut out = Vec::with_capacity(items.len() + missing.len());
            if prepend {
                out.extend(missing);
                out.extend(items.iter().cloned());
            } else {
                out.extend(items.iter().cloned());
                out.extend(missing);
            }
            MetadataValue::List(out)
        }
        (scalar, _) => {
            let current = scalar.to_string();
            let addition = value.to_string();
            let already = if prepend {
                current.starts_with(&addition)
            } else {
                current.ends_with(&addition)
            };
            if already {
                scalar.clone()
            } else if prepend {
                MetadataValue::Text(format!("{}{}", addition, current))
            } else {
                MetadataValue::Text(format!("{}{}", current, addition))
            }
        }
    }
}

pub struct ChangePlanner {
    templates: TemplateRegistry,
    now: Option<DateTime<Utc>>,
}

impl Default for ChangePlanner {
    fn default() -> Self {
        Self {
            templates: TemplateRegistry::default(),
            now: None,
        }
    }
}

impl ChangePlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Planner with a fixed clock for date placeholders.
    pub fn with_now(now: DateTime<Utc>) -> Self {
        Self {
            templates: TemplateRegistry::default(),
            now: Some(now),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    /// Compute the full plan for `doc` under `profile`.
    pub async fn plan(
        &self,
        doc: &Document,
        profile: &TypeProfile,
        links: &LinkReport,
        summarizer: Option<&dyn Summarizer>,
    ) -> ChangePlan {
        let mut warnings = Vec::new();

        let metadata_changes = self.plan_metadata(doc, profile, &mut warnings);
        let content_changes = self.plan_content(doc, profile, summarizer, &mut warnings).await;
        let link_changes = plan_links(links, &mut warnings);

        let mut plan = ChangePlan {
            category: profile.name.clone(),
            metadata_changes,
            content_changes,
            link_changes,
            summary: PlanSummary {
                original_size: doc.metrics.byte_size,
                estimated_size: doc.metrics.byte_size,
                size_delta_percent: 0.0,
                complexity: Complexity::Simple,
                requires_ai: false,
                estimated_seconds: 0,
            },
            warnings,
        };
        plan.summary = summarize_plan(doc, &plan, links);

        log::info!(
            "[PLAN] {} as {}: {} metadata, {} content, {} link change(s)",
            doc.path.display(),
            plan.category,
            plan.metadata_changes.len(),
            plan.content_changes.len(),
            plan.link_changes.len()
        );
        plan
    }

    /// Removals, then additions, then modifications.
    pub fn plan_metadata(
        &self,
        doc: &Document,
        profile: &TypeProfile,
        warnings: &mut Vec<String>,
    ) -> Vec<MetadataChange> {
        let rules = &profile.metadata;
        let mut changes = Vec::new();

        for field in &rules.remove {
            if let Some(old) = doc.metadata.get(field) {
                changes.push(MetadataChange {
                    kind: MetadataChangeKind::Remove,
                    field: field.clone(),
                    old_value: Some(old.clone()),
                    new_value: None,
                    reason: format!("'{}' is listed for removal in {}", field, profile.name),
                });
            }
        }

        let ctx = TemplateContext {
            document: doc,
            category: &profile.name,
            now: self.now(),
        };

        for (field, template) in rules.add.iter() {
            if doc.metadata.contains_key(field) {
                continue;
            }
            let value = self.resolve_value(field, template, &ctx, warnings);
            changes.push(MetadataChange {
                kind: MetadataChangeKind::Add,
                field: field.to_string(),
                old_value: None,
                new_value: Some(value),
                reason: format!("Added by {} rules", profile.name),
            });
        }

        for (field, rule) in rules.modify.iter() {
            if rules.remove.iter().any(|r| r == field) {
                continue;
            }
            let Some(current) = doc.metadata.get(field) else {
                continue;
            };
            let value = self.resolve_value(field, &rule.value, &ctx, warnings);
            let updated = combine(current, rule, value);
            if &updated != current {
                changes.push(MetadataChange {
                    kind: MetadataChangeKind::Modify,
                    field: field.to_string(),
                    old_value: Some(current.clone()),
                    new_value: Some(updated),
                    reason: format!(
                        "{} rule from {}",
                        match rule.operation {
                            ModifyOperation::Append => "Append",
                            ModifyOperation::Prepend => "Prepend",
                            ModifyOperation::Replace => "Replace",
                        },
                        profile.name
                    ),
                });
            }
        }

        changes
    }

    /// Render string templates; other JSON values are taken literally.
    fn resolve_value(
        &self,
        field: &str,
        value: &Value,
        ctx: &TemplateContext,
        warnings: &mut Vec<String>,
    ) -> MetadataValue {
        let Value::String(template) = value else {
            return metadata_from_json(value);
        };

        let rendered = self.templates.render(template, ctx);
        for name in &rendered.unknown {
            let msg = format!(
                "Unknown placeholder {{{{{}}}}} in rule for '{}' left as literal text (known: {})",
                name,
                field,
                self.templates.names().collect::<Vec<_>>().join(", ")
            );
            log::warn!("[PLAN] {}", msg);
            warnings.push(msg);
        }

        // A template that renders to a bare number stays numeric
        if rendered.text != *template {
            if let Ok(n) = rendered.text.parse::<i64>() {
                return MetadataValue::Integer(n);
            }
        }
        MetadataValue::Text(rendered.text)
    }

    async fn plan_content(
        &self,
        doc: &Document,
        profile: &TypeProfile,
        summarizer: Option<&dyn Summarizer>,
        warnings: &mut Vec<String>,
    ) -> Vec<ContentChange> {
        if !profile.content.summarize {
            return Vec::new();
        }
        let Some(summarizer) = summarizer else {
            let msg = format!(
                "{} requests summarization but no summarizer is configured; content left unchanged",
                profile.name
            );
            log::warn!("[PLAN] {}", msg);
            warnings.push(msg);
            return Vec::new();
        };

        let preserved: Vec<String> = profile
            .content
            .preserve_sections
            .iter()
            .map(|s| slugify(s))
            .collect();
        let hint = profile
            .content
            .summary_style
            .as_deref()
            .unwrap_or(DEFAULT_SUMMARY_HINT);

        let mut changes = Vec::new();
        for section in split_sections(&doc.body) {
            if preserved.contains(&section.id) || section.text.trim().is_empty() {
                continue;
            }
            match summarizer.summarize(&section.text, hint).await {
                Ok(summary) if summary.trim() != section.text.trim() => {
                    changes.push(ContentChange {
                        kind: ContentChangeKind::Summarize,
                        section_id: section.id.clone(),
                        old_text: section.text,
                        new_text: summary,
                        reason: format!("Summarized by {} ({})", summarizer.name(), hint),
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    let msg = format!(
                        "Summarizer {} failed on section '{}': {}; content left unchanged",
                        summarizer.name(),
                        section.id,
                        e
                    );
                    log::warn!("[PLAN] {}", msg);
                    warnings.push(msg);
                    return Vec::new();
                }
            }
        }
        changes
    }
}

fn plan_links(links: &LinkReport, warnings: &mut Vec<String>) -> Vec<LinkChange> {
    let mut changes = Vec::new();

    for (url, check) in &links.external {
        let code = check
            .code
            .map(|c| format!("HTTP {}", c))
            .or_else(|| check.error.clone())
            .unwrap_or_default();
        let change = match check.status {
            LinkStatus::Broken => LinkChange {
                kind: LinkChangeKind::Remove,
                target: url.clone(),
                status: check.status,
                replacement: None,
                reason: format!("Link is broken ({})", code),
            },
            LinkStatus::Redirect => LinkChange {
                kind: LinkChangeKind::Update,
                target: url.clone(),
                status: check.status,
                replacement: check.redirect_target.clone(),
                reason: match &check.redirect_target {
                    Some(_) => format!("Link redirects ({})", code),
                    None => format!("Link redirects without a Location header ({})", code),
                },
            },
            status => LinkChange {
                kind: LinkChangeKind::Verify,
                target: url.clone(),
                status,
                replacement: None,
                reason: match status {
                    LinkStatus::Valid => "Link is reachable".to_string(),
                    other => format!("Could not confirm link ({}: {})", other, code),
                },
            },
        };
        changes.push(change);
    }

    for (reference, check) in &links.internal {
        let change = match check.status {
            LinkStatus::Broken => LinkChange {
                kind: LinkChangeKind::Remove,
                target: reference.clone(),
                status: check.status,
                replacement: None,
                reason: "No matching note in the vault".to_string(),
            },
            status => {
                if status == LinkStatus::Ambiguous {
                    let msg = format!(
                        "Reference '{}' is ambiguous: using {} (also: {})",
                        reference,
                        check
                            .resolved_path
                            .as_ref()
                            .map(|p| p.display().to_string())
                            .unwrap_or_default(),
                        check
                            .alternatives
                            .iter()
                            .map(|p| p.display().to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                    log::warn!("[PLAN] {}", msg);
                    warnings.push(msg);
                }
                LinkChange {
                    kind: LinkChangeKind::Verify,
                    target: reference.clone(),
                    status,
                    replacement: None,
                    reason: format!("Reference resolves ({})", status),
                }
            }
        };
        changes.push(change);
    }

    changes
}

fn summarize_plan(doc: &Document, plan: &ChangePlan, links: &LinkReport) -> PlanSummary {
    let original_size = doc.metrics.byte_size;
    // Re-rendering normalizes YAML style, so only the rendered difference is applied
    let estimated_size = if plan.metadata_changes.is_empty() {
        original_size
    } else {
        let metadata = apply::apply_metadata_changes(&doc.metadata, &plan.metadata_changes);
        let before = frontmatter::render_note(&doc.metadata, &doc.body, doc.has_metadata_block);
        let after = frontmatter::render_note(&metadata, &doc.body, doc.has_metadata_block);
        match (before, after) {
            (Ok(b), Ok(a)) => {
                (original_size as i64 + a.len() as i64 - b.len() as i64).max(0) as u64
            }
            _ => original_size,
        }
    };

    let size_delta_percent = if original_size > 0 {
        (estimated_size as f64 - original_size as f64) / original_size as f64 * 100.0
    } else {
        0.0
    };

    let change_count = plan.metadata_changes.len()
        + plan.content_changes.len()
        + plan.actionable_link_changes().count();
    let requires_ai = !plan.content_changes.is_empty();

    let seconds = 1.0
        + 0.5 * plan.metadata_changes.len() as f64
        + 2.0 * links.external.len() as f64
        + if requires_ai { 10.0 } else { 0.0 };

    PlanSummary {
        original_size,
        estimated_size,
        size_delta_percent,
        complexity: Complexity::from_change_count(change_count),
        requires_ai,
        estimated_seconds: seconds.ceil() as u64,
    }
}
