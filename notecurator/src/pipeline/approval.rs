//! The approval step between planning and applying.

use notecurator_types::{ChangePlan, Document, LinkChangeKind, MetadataChangeKind};
use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approve,
    Reject,
    /// Show the plan in detail and ask again
    Preview,
    /// Adjust settings and ask again
    Configure,
}

pub trait ApprovalGate: Send + Sync {
    fn decide(&self, doc: &Document, plan: &ChangePlan, category: &str) -> ApprovalDecision;
}

/// Approves everything (`--yes`).
pub struct AutoApprove;

impl ApprovalGate for AutoApprove {
    fn decide(&self, _doc: &Document, _plan: &ChangePlan, _category: &str) -> ApprovalDecision {
        ApprovalDecision::Approve
    }
}

/// One-line overview of a plan.
pub fn plan_headline(plan: &ChangePlan) -> String {
    format!(
        "{} metadata, {} content, {} link change(s); {:?} complexity, ~{}s, size {:+.1}%",
        plan.metadata_changes.len(),
        plan.content_changes.len(),
        plan.actionable_link_changes().count(),
        plan.summary.complexity,
        plan.summary.estimated_seconds,
        plan.summary.size_delta_percent
    )
}

/// Multi-line human-readable rendering of every change in a plan.
pub fn describe_plan(plan: &ChangePlan) -> String {
    let mut out = Vec::new();
    out.push(format!("Category: {}", plan.category));
    out.push(plan_headline(plan));

    for change in &plan.metadata_changes {
        let line = match change.kind {
            MetadataChangeKind::Remove => format!("  - {}", change.field),
            MetadataChangeKind::Add => format!(
                "  + {}: {}",
                change.field,
                change.new_value.as_ref().map(|v| v.to_string()).unwrap_or_default()
            ),
            MetadataChangeKind::Modify => format!(
                "  ~ {}: {} -> {}",
                change.field,
                change.old_value.as_ref().map(|v| v.to_string()).unwrap_or_default(),
                change.new_value.as_ref().map(|v| v.to_string()).unwrap_or_default()
            ),
        };
        out.push(line);
    }
    for change in &plan.content_changes {
        out.push(format!("  * section '{}': {}", change.section_id, change.reason));
    }
    for change in &plan.link_changes {
        let marker = match change.kind {
            LinkChangeKind::Verify => "ok",
            LinkChangeKind::Update => "->",
            LinkChangeKind::Remove => "x",
        };
        out.push(format!("  [{}] {} ({})", marker, change.target, change.reason));
    }
    for warning in &plan.warnings {
        out.push(format!("  ! {}", warning));
    }
    out.join("\n")
}

/// Interactive prompt on stdin/stdout.
pub struct StdinGate;

impl ApprovalGate for StdinGate {
    fn decide(&self, doc: &Document, plan: &ChangePlan, category: &str) -> ApprovalDecision {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let _ = writeln!(out, "\n{} ({})", doc.path.display(), category);
        let _ = writeln!(out, "{}", plan_headline(plan));
        let _ = write!(out, "Apply changes? [y]es / [n]o / [p]review / [c]onfigure: ");
        let _ = out.flush();

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return ApprovalDecision::Reject;
        }
        match parse_answer(&line) {
            ApprovalDecision::Preview => {
                let _ = writeln!(out, "{}", describe_plan(plan));
                ApprovalDecision::Preview
            }
            ApprovalDecision::Configure => {
                let _ = writeln!(
                    out,
                    "Edit .notecurator.json next to the note (or the vault config) and re-run to change the rules."
                );
                ApprovalDecision::Configure
            }
            decision => decision,
        }
    }
}

/// Map a typed answer to a decision. Anything unrecognized (including EOF) rejects.
pub fn parse_answer(answer: &str) -> ApprovalDecision {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => ApprovalDecision::Approve,
        "p" | "preview" => ApprovalDecision::Preview,
        "c" | "configure" => ApprovalDecision::Configure,
        _ => ApprovalDecision::Reject,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("Y\n"), ApprovalDecision::Approve);
        assert_eq!(parse_answer(" preview "), ApprovalDecision::Preview);
        assert_eq!(parse_answer("c"), ApprovalDecision::Configure);
        assert_eq!(parse_answer(""), ApprovalDecision::Reject);
        assert_eq!(parse_answer("maybe"), ApprovalDecision::Reject);
    }
}
