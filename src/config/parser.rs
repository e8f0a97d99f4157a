//! Configuration parser for loading and merging configuration files.
//!
//! Profiles are loaded as untyped mappings (YAML or JSON), deep-merged over
//! the built-in defaults, validated, and only then turned into a typed
//! [`ScnConfig`].

use crate::error::{ConfigError, Result, ScnError};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::defaults::default_config;
use super::merge::merge_config;
use super::spec::ScnConfig;
use super::validator::ConfigValidator;

/// Configuration parser for loading SCN profiles.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving the `.env` file.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path used to look up `.env`.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads a configuration mapping from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, has an unsupported extension,
    /// or cannot be parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::parse(
                format!("Failed to read file: {e}"),
                Some(path.display().to_string()),
            )
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "yml" | "yaml" => self.parse_yaml(&content, Some(path)),
            "json" => self.parse_json(&content, Some(path)),
            other => Err(ConfigError::parse(
                format!("Unsupported config file type: .{other}. Use .yml, .yaml, or .json"),
                Some(path.display().to_string()),
            )
            .into()),
        }
    }

    /// Parses a configuration mapping from a YAML string.
    ///
    /// An empty document yields an empty mapping.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<Value> {
        debug!("Parsing YAML configuration");

        if content.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        let value: Value = serde_yaml::from_str(content).map_err(|e| {
            ConfigError::parse(
                format!("YAML parse error: {e}"),
                source.map(|p| p.display().to_string()),
            )
        })?;

        Ok(normalize_root(value))
    }

    /// Parses a configuration mapping from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid.
    pub fn parse_json(&self, content: &str, source: Option<&Path>) -> Result<Value> {
        debug!("Parsing JSON configuration");

        let value: Value = serde_json::from_str(content).map_err(|e| {
            ConfigError::parse(
                format!("JSON parse error: {e}"),
                source.map(|p| p.display().to_string()),
            )
        })?;

        Ok(normalize_root(value))
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                ConfigError::parse(
                    format!("Failed to load .env file: {e}"),
                    Some(env_path.display().to_string()),
                )
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Loads the effective configuration for a run.
    ///
    /// Without a profile path the built-in defaults are used. A standalone AI
    /// config file, when given, is merged over the profile's `ai_fallback`
    /// section.
    ///
    /// # Errors
    ///
    /// Returns an error if any file cannot be loaded or the merged
    /// configuration fails validation.
    pub fn load_effective(
        &self,
        profile: Option<&Path>,
        ai_config: Option<&Path>,
    ) -> Result<ScnConfig> {
        let mut custom = match profile {
            Some(path) => self.load_file(path)?,
            None => {
                info!("No configuration profile given, using default FedRAMP rules");
                Value::Object(serde_json::Map::new())
            }
        };

        if let Some(path) = ai_config {
            let ai_value = self.load_file(path)?;
            ConfigValidator::new().validate_ai_config(&ai_value)?;
            attach_ai_config(&mut custom, &ai_value)?;
        }

        effective_config(Some(&custom))
    }
}

/// Builds the validated, typed effective configuration from a custom mapping.
///
/// # Errors
///
/// Returns an error if the custom value is not a mapping or the merged result
/// fails validation.
pub fn effective_config(custom: Option<&Value>) -> Result<ScnConfig> {
    if let Some(value) = custom
        && !value.is_object()
    {
        return Err(ConfigError::validation("must be a mapping", "config").into());
    }

    let merged = merge_config(custom, &default_config());
    let result = ConfigValidator::new().validate(&merged)?;
    for warning in &result.warnings {
        warn!("{warning}");
    }

    let config = ScnConfig::from_value(merged)?;
    debug!(
        "Effective configuration: version {}, {} rules, AI section {}",
        config.version,
        config.rules.len(),
        if config.ai_fallback.is_some() { "present" } else { "absent" }
    );
    Ok(config)
}

/// Merges a standalone AI config over `custom.ai_fallback`.
fn attach_ai_config(custom: &mut Value, ai_value: &Value) -> Result<()> {
    let Value::Object(map) = custom else {
        return Err(ScnError::from(ConfigError::validation(
            "must be a mapping",
            "config",
        )));
    };
    let merged = merge_config(Some(ai_value), map.get("ai_fallback").unwrap_or(&Value::Null));
    map.insert(String::from("ai_fallback"), merged);
    Ok(())
}

/// A YAML/JSON document containing only `null` is an empty profile.
fn normalize_root(value: Value) -> Value {
    if value.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        value
    }
}

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    ".github/scn-config.yml",
    ".github/scn-config.yaml",
    "scn-config.yml",
    "scn-config.yaml",
];

/// Finds a configuration profile in the given directory or its parents.
///
/// Returns `None` when no profile exists; the defaults then apply.
#[must_use]
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    let mut current = start_dir.as_ref().to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Some(config_path);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}
