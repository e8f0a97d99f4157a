//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SCN detector - FedRAMP significant change classification for IaC diffs.
#[derive(Parser, Debug)]
#[command(name = "scn-detector")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Summary output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output_format: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze the IaC changes between two git refs.
    Analyze {
        /// Base git ref.
        #[arg(long, default_value = "origin/main")]
        base_ref: String,

        /// Head git ref.
        #[arg(long, default_value = "HEAD")]
        head_ref: String,

        /// Where to write the analysis JSON.
        #[arg(short, long, default_value = "scn-analysis.json")]
        output: PathBuf,
    },

    /// Classify analyzed changes into SCN categories.
    Classify {
        /// Analysis JSON produced by `analyze`.
        #[arg(short, long, default_value = "scn-analysis.json")]
        input: PathBuf,

        /// Where to write the classification JSON.
        #[arg(short, long, default_value = "scn-classification.json")]
        output: PathBuf,

        /// Configuration profile (YAML or JSON).
        #[arg(short, long, env = "SCN_CONFIG")]
        config: Option<PathBuf>,

        /// Enable the AI fallback for unmatched changes.
        #[arg(long)]
        enable_ai: bool,

        /// Standalone AI fallback configuration.
        #[arg(long)]
        ai_config: Option<PathBuf>,
    },

    /// Validate a configuration profile.
    Validate {
        /// Configuration profile (YAML or JSON).
        #[arg(short, long, env = "SCN_CONFIG")]
        config: Option<PathBuf>,

        /// Standalone AI fallback configuration.
        #[arg(long)]
        ai_config: Option<PathBuf>,

        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}
