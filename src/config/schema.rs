//! Configuration schema definitions
//!
//! Defines the structure of configuration files using serde for serialization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::kube::DEFAULT_CONCURRENCY;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Namespace of the root object when none is given; empty uses the
    /// kubeconfig context namespace
    #[serde(default)]
    pub default_namespace: String,

    /// Output format
    #[serde(default)]
    pub output: OutputFormat,

    /// Include API groups in object names
    #[serde(default)]
    pub show_group: bool,

    /// Cluster fetch configuration
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Cluster fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FetchConfig {
    /// Resource types listed concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// API groups never listed (e.g. `metrics.k8s.io`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_groups: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Tree,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree => f.write_str("tree"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tree" => Ok(Self::Tree),
            "json" => Ok(Self::Json),
            _ => Err(anyhow::anyhow!("output must be 'tree' or 'json', got '{}'", s)),
        }
    }
}

// Default value functions
fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            excluded_groups: Vec::new(),
        }
    }
}
