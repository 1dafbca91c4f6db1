pub mod builtin_types;
pub mod curation_config;

pub use curation_config::{
    ConfigTier, ContentRules, CurationConfig, DetectionRules, MetadataRules, ModifyOperation,
    ModifyRule, ProcessingPreferences, TypeProfile,
};
pub use notecurator_types::OrderedMap;
