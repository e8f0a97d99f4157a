//! Configuration module for the SCN detector.
//!
//! This module handles all configuration-related functionality:
//! - Built-in default profile and AI prompt scaffolding
//! - Deep merge of a user profile over the defaults
//! - Loading YAML/JSON profiles and validating their structure
//! - Computing configuration fingerprints for report audit trails

mod defaults;
mod hash;
mod merge;
mod parser;
mod spec;
mod validator;

pub use defaults::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MAX_DIFF_CHARS, DEFAULT_MAX_TOKENS,
    DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT_TEMPLATE, default_config, default_notifications,
    default_rules,
};
pub use hash::ConfigHasher;
pub use merge::merge_config;
pub use parser::{ConfigParser, DEFAULT_CONFIG_FILES, effective_config, find_config_file};
pub use spec::{
    AdaptiveNotice, AiConfig, ImpactNotice, NotificationsConfig, Rule, RuleSet, ScnConfig,
    TransformativeNotice,
};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
