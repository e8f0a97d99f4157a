//! SCN detector CLI entrypoint.
//!
//! This is the main entrypoint for the scn-detector command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use scn_detector::analyzer::{DiffAnalyzer, GitDiffSource};
use scn_detector::classifier::ClassificationEngine;
use scn_detector::cli::{Cli, Commands, OutputFormatter, read_analysis, write_json};
use scn_detector::config::{
    ConfigParser, ConfigValidator, default_config, find_config_file, merge_config,
};
use scn_detector::error::{ConfigError, Result};

use clap::Parser;
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system. Logs go to stderr.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output_format);

    match cli.command {
        Commands::Analyze {
            base_ref,
            head_ref,
            output,
        } => cmd_analyze(base_ref, head_ref, &output, &formatter).await,
        Commands::Classify {
            input,
            output,
            config,
            enable_ai,
            ai_config,
        } => {
            cmd_classify(
                &input,
                &output,
                config.as_deref(),
                enable_ai,
                ai_config.as_deref(),
                &formatter,
            )
            .await
        }
        Commands::Validate {
            config,
            ai_config,
            warnings,
        } => cmd_validate(config.as_deref(), ai_config.as_deref(), warnings, &formatter),
    }
}

/// Analyze IaC changes between two refs.
async fn cmd_analyze(
    base_ref: String,
    head_ref: String,
    output: &Path,
    formatter: &OutputFormatter,
) -> Result<()> {
    let source = GitDiffSource::new(base_ref, head_ref);
    let report = DiffAnalyzer::new().analyze_source(&source).await?;

    write_json(output, &report).await?;
    emit(&formatter.format_analysis(&report))
}

/// Classify analyzed changes.
async fn cmd_classify(
    input: &Path,
    output: &Path,
    config_path: Option<&Path>,
    enable_ai: bool,
    ai_config: Option<&Path>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let analysis = read_analysis(input).await?;

    let profile = resolve_config_path(config_path);
    let parser = parser_for(profile.as_deref());
    parser.load_dotenv()?;
    let config = parser.load_effective(profile.as_deref(), ai_config)?;

    let engine = ClassificationEngine::new(&config, enable_ai, None)?;
    let report = engine.classify_all(&analysis).await;

    write_json(output, &report).await?;
    emit(&formatter.format_classification(&report, &config))
}

/// Validate a configuration profile.
fn cmd_validate(
    config_path: Option<&Path>,
    ai_config: Option<&Path>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let profile = resolve_config_path(config_path);
    let parser = parser_for(profile.as_deref());

    let custom = match &profile {
        Some(path) => {
            info!("Validating configuration: {}", path.display());
            parser.load_file(path)?
        }
        None => {
            info!("No configuration profile found, validating the built-in defaults");
            Value::Object(serde_json::Map::new())
        }
    };

    let validator = ConfigValidator::new();
    if let Some(path) = ai_config {
        let ai_value = parser.load_file(path)?;
        validator.validate_ai_config(&ai_value)?;
    }

    let merged = merge_config(Some(&custom), &default_config());
    let result = validator.check(&merged);
    emit(&formatter.format_validation(&result, show_warnings))?;

    if !result.is_valid() {
        return Err(ConfigError::validation_general(format!(
            "{} error(s) found",
            result.error_count()
        ))
        .into());
    }

    let config = parser.load_effective(profile.as_deref(), ai_config)?;
    emit(&formatter.format_config_summary(&config))
}

/// Resolves the configuration path, searching the working tree if none was given.
fn resolve_config_path(config_path: Option<&Path>) -> Option<PathBuf> {
    config_path
        .map(Path::to_path_buf)
        .or_else(|| find_config_file("."))
}

/// Creates a parser rooted next to the profile, for `.env` lookup.
fn parser_for(profile: Option<&Path>) -> ConfigParser {
    let base = profile
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    debug!("Configuration base path: {}", base.display());
    ConfigParser::new().with_base_path(base)
}

/// Writes command output to stdout.
fn emit(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}")?;
    Ok(())
}
