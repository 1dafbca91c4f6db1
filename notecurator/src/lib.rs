//! Curation of Markdown notes: classify a note, plan metadata and link fixes
//! from category rules, and apply them behind a verified backup.

pub mod backup;
pub mod classifier;
pub mod config;
pub mod config_resolver;
pub mod error;
pub mod links;
pub mod models;
pub mod notes;
pub mod pipeline;
pub mod planner;

pub use config_resolver::{ConfigResolver, ResolvedConfig};
pub use error::{CuratorError, CuratorResult};
pub use notecurator_types as types;
pub use pipeline::{CurationContext, Outcome, Pipeline, PipelineReport, RunOptions};
