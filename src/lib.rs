// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # SCN Detector
//!
//! Classifies infrastructure-as-code changes into FedRAMP Significant Change
//! Notification categories.
//!
//! ## Overview
//!
//! Every changed Terraform, Kubernetes or CloudFormation resource ends up in
//! exactly one category:
//!
//! - **ROUTINE**: regular maintenance, no notification
//! - **ADAPTIVE**: notify within 10 days after completion
//! - **TRANSFORMATIVE**: 30 day advance notice plus a final notice
//! - **IMPACT**: security boundary changes, new assessment required
//! - **`MANUAL_REVIEW`**: could not be determined automatically
//!
//! ## Architecture
//!
//! 1. **Analysis**: a git diff is turned into per-resource change records
//! 2. **Rules**: ordered regex rules are matched, first match wins
//! 3. **AI fallback**: unmatched changes optionally go to an LLM provider,
//!    whose answer is gated by a confidence threshold
//!
//! ## Modules
//!
//! - [`analyzer`]: Diff retrieval and resource extraction
//! - [`config`]: Default profile, merging, parsing and validation
//! - [`classifier`]: Rule matching and the classification engine
//! - [`ai`]: AI providers and the fallback dispatcher
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! version: "1.0"
//! rules:
//!   routine:
//!     - pattern: "tags.*"
//!       description: "Tag changes"
//! ai_fallback:
//!   enabled: true
//!   provider: anthropic
//!   model: claude-sonnet-4-20250514
//!   confidence_threshold: 0.8
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod ai;
pub mod analyzer;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;

// ============================================================================
// Re-exports
// ============================================================================

pub use ai::{AiClassifier, AiProvider, ProviderKind};
pub use analyzer::{AnalysisReport, DiffAnalyzer, FileChange, GitDiffSource, IacFormat, ResourceChange};
pub use classifier::{Category, Classification, ClassificationEngine, ClassificationReport, Method};
pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigHasher, ConfigParser, ConfigValidator, ScnConfig};
pub use error::{Result, ScnError};
