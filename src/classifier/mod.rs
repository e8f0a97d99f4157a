//! Change classification.
//!
//! This module provides:
//! - SCN categories and classification result types
//! - The ordered rule matcher
//! - The [`ClassificationEngine`] combining rules with the AI fallback

mod engine;
mod rules;
mod types;

pub use engine::{ClassificationEngine, effective_ai_config};
pub use rules::{CompiledRule, RuleMatch, RuleMatcher};
pub use types::{
    Category, CategorySummary, Classification, ClassificationReport, ClassifiedChange, Method,
};
