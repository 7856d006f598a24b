//! Configuration loading and merging logic
//!
//! Handles loading configuration from multiple sources and merging them
//! according to precedence rules.

use std::path::Path;

use anyhow::{Context, Result};

use super::paths;
use super::schema::Config;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers merged
    ///
    /// Precedence order (highest to lowest):
    /// 1. Environment variable overrides
    /// 2. Root config file
    /// 3. Built-in defaults
    ///
    /// Command line flags are applied on top by the caller.
    pub fn load() -> Result<Config> {
        Self::load_from(&paths::root_config_path())
    }

    /// Load configuration using the given file as the root config
    pub fn load_from(path: &Path) -> Result<Config> {
        let mut config = Self::load_defaults();

        if path.exists() {
            match Self::load_file(path) {
                Ok(file_config) => config = Self::merge_config(config, file_config),
                // `config validate` reports the details
                Err(e) => tracing::warn!("Ignoring invalid config file: {:#}", e),
            }
        }

        Ok(Self::apply_env_overrides(config))
    }

    /// Load configuration from a file
    pub fn load_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the root config file, if there is one
    ///
    /// Fails on invalid YAML, unknown output formats, invalid value types
    /// and out of range values.
    pub fn validate() -> Result<()> {
        let root_path = paths::root_config_path();
        if !root_path.exists() {
            return Ok(());
        }

        let config = Self::load_file(&root_path)?;
        if config.fetch.concurrency == 0 {
            return Err(anyhow::anyhow!("fetch.concurrency must be at least 1"));
        }

        Ok(())
    }

    /// Load default configuration
    pub fn load_defaults() -> Config {
        Config::default()
    }

    /// Merge two configurations, with `other` taking precedence
    ///
    /// Missing keys in a file already deserialize to their defaults, so the
    /// file layer replaces the defaults wholesale.
    fn merge_config(_base: Config, other: Config) -> Config {
        other
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: Config) -> Config {
        // KUBE_LINEAGE_OUTPUT override
        if let Ok(output) = std::env::var("KUBE_LINEAGE_OUTPUT") {
            if let Ok(val) = output.parse() {
                config.output = val;
            }
        }

        // KUBE_LINEAGE_NAMESPACE override
        if let Ok(namespace) = std::env::var("KUBE_LINEAGE_NAMESPACE") {
            config.default_namespace = namespace;
        }

        config
    }

    /// Save configuration to a file
    pub fn save(config: &Config, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }

        let yaml =
            serde_yaml::to_string(config).context("Failed to serialize configuration to YAML")?;

        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Save root configuration
    pub fn save_root(config: &Config) -> Result<()> {
        Self::save(config, &paths::root_config_path())
    }
}
