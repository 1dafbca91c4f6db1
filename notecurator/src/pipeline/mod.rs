//! Single-note curation: parse, classify, plan, approve, back up, apply, validate.

pub mod approval;
pub mod summarizer;

use crate::backup::BackupManager;
use crate::classifier;
use crate::config::defaults;
use crate::config_resolver::ConfigResolver;
use crate::error::{CuratorError, CuratorResult};
use crate::links::{LinkReport, LinkVerifier};
use crate::models::{CurationConfig, TypeProfile};
use crate::notes::{NoteParser, file_ops};
use crate::planner::{ChangePlanner, apply};
use approval::{ApprovalDecision, ApprovalGate};
use notecurator_types::{BackupRecord, ChangePlan, DetectionResult, Document};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use summarizer::Summarizer;

/// Process-wide collaborators shared by every pipeline run.
pub struct CurationContext {
    pub resolver: ConfigResolver,
    pub verifier: LinkVerifier,
    pub backups: BackupManager,
    pub summarizer: Option<Arc<dyn Summarizer>>,
}

impl CurationContext {
    /// Context whose link settings and summarizer follow `config`.
    pub fn from_config(resolver: ConfigResolver, config: &CurationConfig) -> Self {
        Self {
            resolver,
            verifier: LinkVerifier::new(&config.processing),
            backups: BackupManager::default(),
            summarizer: summarizer::from_provider(&config.ai_provider),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Use this category instead of the classifier's choice
    pub forced_type: Option<String>,
    /// Stop after planning
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Parsed,
    Classified,
    Planned,
    Approved,
    Rejected,
    BackedUp,
    Applied,
    Validated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    NoChanges,
    DryRun,
    Rejected,
    Applied { backup: BackupRecord },
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub path: PathBuf,
    pub state: PipelineState,
    pub outcome: Outcome,
    pub category: String,
    pub detection: DetectionResult,
    pub plan: ChangePlan,
    pub warnings: Vec<String>,
    /// Link and content suggestions left for manual follow-up
    pub follow_ups: Vec<String>,
}

pub type Validator = fn(&Path, &apply::AppliedNote) -> Result<(), String>;

pub struct Pipeline<'a> {
    ctx: &'a CurationContext,
    planner: ChangePlanner,
    validator: Validator,
}

impl<'a> Pipeline<'a> {
    pub fn new(ctx: &'a CurationContext) -> Self {
        Self {
            ctx,
            planner: ChangePlanner::new(),
            validator: apply::validate,
        }
    }

    pub fn with_planner(mut self, planner: ChangePlanner) -> Self {
        self.planner = planner;
        self
    }

    /// Replace the post-write check.
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    async fn plan(
        &self,
        doc: &Document,
        profile: &TypeProfile,
        links: &LinkReport,
    ) -> ChangePlan {
        self.planner
            .plan(doc, profile, links, self.ctx.summarizer.as_deref())
            .await
    }

    pub async fn run(
        &self,
        path: &Path,
        gate: &dyn ApprovalGate,
        options: &RunOptions,
    ) -> CuratorResult<PipelineReport> {
        let resolved = self.ctx.resolver.resolve(path);
        let config = resolved.config;
        let mut warnings = resolved.warnings;

        let parsed = NoteParser::new(config.processing.max_file_size_kb).parse(path)?;
        let doc = parsed.document;
        warnings.extend(parsed.warnings);
        log::debug!("[PIPELINE] {:?}: {}", PipelineState::Parsed, doc.path.display());

        let detection = classifier::classify(&doc, &config);
        let category = match &options.forced_type {
            Some(forced) => {
                if config.profile(forced).is_none() {
                    return Err(CuratorError::UnknownCategory(forced.clone()));
                }
                log::info!("[PIPELINE] Using forced category '{}'", forced);
                forced.clone()
            }
            None => detection.primary_type.clone(),
        };
        log::debug!("[PIPELINE] {:?}: {}", PipelineState::Classified, category);

        let profile = config
            .profile(&category)
            .cloned()
            .unwrap_or_else(|| TypeProfile::named(&category));

        let links = self.ctx.verifier.verify_document(&doc, &profile).await;
        let mut plan = self.plan(&doc, &profile, &links).await;
        warnings.extend(plan.warnings.iter().cloned());

        let mut report = PipelineReport {
            path: doc.path.clone(),
            state: PipelineState::Planned,
            outcome: Outcome::NoChanges,
            category: category.clone(),
            detection,
            plan: plan.clone(),
            warnings,
            follow_ups: Vec::new(),
        };

        if plan.is_empty() {
            log::info!("[PIPELINE] Nothing to change in {}", doc.path.display());
            return Ok(report);
        }
        if options.dry_run {
            report.outcome = Outcome::DryRun;
            return Ok(report);
        }

        let mut rounds = 0;
        loop {
            match gate.decide(&doc, &plan, &category) {
                ApprovalDecision::Approve => break,
                ApprovalDecision::Reject => {
                    log::info!("[PIPELINE] Changes to {} rejected", doc.path.display());
                    report.state = PipelineState::Rejected;
                    report.outcome = Outcome::Rejected;
                    return Ok(report);
                }
                ApprovalDecision::Preview => {
                    plan = self.plan(&doc, &profile, &links).await;
                    report.plan = plan.clone();
                }
                ApprovalDecision::Configure => {
                    log::info!("[PIPELINE] Configuration changes take effect on the next run");
                }
            }
            rounds += 1;
            if rounds >= defaults::MAX_PREVIEW_ROUNDS {
                log::warn!(
                    "[PIPELINE] No decision after {} rounds, treating as rejected",
                    rounds
                );
                report.state = PipelineState::Rejected;
                report.outcome = Outcome::Rejected;
                return Ok(report);
            }
        }
        report.state = PipelineState::Approved;

        let backup = self.ctx.backups.backup(&doc.path)?;
        report.state = PipelineState::BackedUp;

        let applied = match apply::build(&doc, &plan) {
            Ok(a) => a,
            Err(e) => return Err(self.rollback(&backup, e, &report.warnings)),
        };
        if let Err(e) = file_ops::write_note(&doc.path, &applied.text) {
            let message = format!("Failed to write {}: {}", doc.path.display(), e);
            return Err(self.rollback(&backup, message, &report.warnings));
        }
        report.state = PipelineState::Applied;

        if let Err(e) = (self.validator)(&doc.path, &applied) {
            return Err(self.rollback(&backup, e, &report.warnings));
        }
        report.state = PipelineState::Validated;

        for follow_up in &applied.follow_ups {
            log::warn!("[PIPELINE] Follow-up: {}", follow_up);
        }
        report.follow_ups = applied.follow_ups;
        report.outcome = Outcome::Applied { backup };

        log::info!("[PIPELINE] Curated {} as {}", doc.path.display(), category);
        Ok(report)
    }

    /// Restore the pre-write backup and wrap the failure.
    fn rollback(
        &self,
        backup: &BackupRecord,
        message: String,
        warnings: &[String],
    ) -> CuratorError {
        log::error!("[PIPELINE] {}; restoring {}", message, backup.original_path.display());
        let mut log = warnings.to_vec();
        log.push(message.clone());

        match self.ctx.backups.restore(backup) {
            Ok(()) => log.push(format!(
                "Restored {} from {}",
                backup.original_path.display(),
                backup.backup_path.display()
            )),
            Err(e) => {
                log::error!("[PIPELINE] Rollback failed: {}", e);
                log.push(format!("Rollback failed: {}", e));
            }
        }
        CuratorError::ProcessingFailed { message, log }
    }
}
