use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::TwingenError;
use crate::rules::RewriteRules;

/// Main configuration structure for twingen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub targets: Vec<TargetConfig>,
    pub formatter: FormatterConfig,
    pub difftool: DifftoolConfig,
    pub rules: RewriteRules,
    pub logging: LoggingConfig,
}

/// One file/impl pair the tool can check or generate for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Name used on the command line to select this target
    pub name: String,
    pub path: PathBuf,
    /// Type whose inherent impl block is scanned
    pub impl_type: String,
}

/// External formatter invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatterConfig {
    pub program: String,
    /// Arguments placed before the file path
    pub args: Vec<String>,
    /// Substring on stdout that signals the formatter made no further
    /// changes. Formatters that print nothing are detected by comparing the
    /// file content before and after the pass.
    pub stable_marker: String,
}

/// Optional external diff viewer, spawned best-effort after generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifftoolConfig {
    pub enabled: bool,
    pub program: String,
    /// Arguments placed before the two file paths
    pub args: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: vec![
                TargetConfig {
                    name: "queue".to_string(),
                    path: PathBuf::from("src/queue.rs"),
                    impl_type: "PgmqQueue".to_string(),
                },
                TargetConfig {
                    name: "operation".to_string(),
                    path: PathBuf::from("src/operation.rs"),
                    impl_type: "PgmqOperation".to_string(),
                },
            ],
            formatter: FormatterConfig::default(),
            difftool: DifftoolConfig::default(),
            rules: RewriteRules::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            program: "rustfmt".to_string(),
            args: vec!["--edition".to_string(), "2021".to_string()],
            stable_marker: "unchanged".to_string(),
        }
    }
}

impl Default for DifftoolConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            program: "git".to_string(),
            args: vec!["difftool".to_string(), "--no-index".to_string()],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration with precedence:
    /// 1. Environment variables (TWINGEN_*)
    /// 2. twingen.toml file (if exists)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_dir(&std::env::current_dir()?)
    }

    /// Load configuration from a specific directory
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        let config_file = dir.join("twingen.toml");
        if config_file.exists() {
            builder = builder.add_source(File::from(config_file));
        }

        builder = builder.add_source(
            Environment::with_prefix("TWINGEN")
                .separator("_")
                .try_parsing(true),
        );

        let loaded = builder.build().context("Failed to build configuration")?;

        let mut result = Config::default();
        match loaded.clone().try_deserialize::<Config>() {
            Ok(full) => result = full,
            Err(_) => {
                // Partial files are fine; pick up whichever sections parse
                if let Ok(targets) = loaded.get::<Vec<TargetConfig>>("targets") {
                    result.targets = targets;
                }
                if let Ok(formatter) = loaded.get::<FormatterConfig>("formatter") {
                    result.formatter = formatter;
                }
                if let Ok(difftool) = loaded.get::<DifftoolConfig>("difftool") {
                    result.difftool = difftool;
                }
                if let Ok(rules) = loaded.get::<RewriteRules>("rules") {
                    result.rules = rules;
                }
                if let Ok(logging) = loaded.get::<LoggingConfig>("logging") {
                    result.logging = logging;
                }
            }
        }

        Ok(result)
    }

    /// Look up a target by its command-line name
    pub fn target(&self, name: &str) -> std::result::Result<&TargetConfig, TwingenError> {
        self.targets
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| TwingenError::UnknownTarget(name.to_string()))
    }

    pub fn target_names(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.name.as_str()).collect()
    }
}
