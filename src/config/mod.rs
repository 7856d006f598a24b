//! Configuration system for kube-lineage
//!
//! A single optional `config.yaml` supplies defaults for command line flags.
//! Environment variables override the file, and flags override both.

pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{Config, FetchConfig, OutputFormat};

/// Get a configuration value by key (dot notation)
pub fn get_config_value(config: &Config, key: &str) -> anyhow::Result<String> {
    match key {
        "defaultNamespace" => Ok(config.default_namespace.clone()),
        "output" => Ok(config.output.to_string()),
        "showGroup" => Ok(config.show_group.to_string()),
        "fetch.concurrency" => Ok(config.fetch.concurrency.to_string()),
        "fetch.excludedGroups" => Ok(config.fetch.excluded_groups.join(",")),
        _ => Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }
}

/// Set a configuration value by key (dot notation)
pub fn set_config_value(config: &mut Config, key: &str, value: &str) -> anyhow::Result<()> {
    use anyhow::Context;
    match key {
        "defaultNamespace" => {
            config.default_namespace = value.to_string();
        }
        "output" => {
            config.output = value.parse()?;
        }
        "showGroup" => {
            config.show_group = value
                .parse()
                .context("showGroup must be 'true' or 'false'")?;
        }
        "fetch.concurrency" => {
            let concurrency: usize = value
                .parse()
                .context("fetch.concurrency must be a number")?;
            if concurrency == 0 {
                return Err(anyhow::anyhow!("fetch.concurrency must be at least 1"));
            }
            config.fetch.concurrency = concurrency;
        }
        "fetch.excludedGroups" => {
            // Comma-separated list
            config.fetch.excluded_groups = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        _ => return Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }

    Ok(())
}
