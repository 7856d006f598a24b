//! Kubernetes object sources
//!
//! Objects are loaded either from a live cluster or from manifest files.
//! Both implement [`ObjectSource`], so the rest of the application does not
//! care where a snapshot came from.
//!
//! Cluster connections honour the standard proxy environment variables
//! (`HTTP_PROXY`, `HTTPS_PROXY`, `NO_PROXY`) through kube's proxy support.

mod fetch;
mod file;

use std::path::PathBuf;

use async_trait::async_trait;
use kube::config::{InferConfigError, KubeConfigOptions, KubeconfigError};
use kube::core::DynamicObject;
use kube::{Client, Config};

pub use fetch::{ClusterSource, DEFAULT_CONCURRENCY};
pub use file::FileSource;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to load kubeconfig: {0}")]
    Kubeconfig(#[from] KubeconfigError),

    #[error("Failed to infer cluster configuration: {0}")]
    InferConfig(#[from] InferConfigError),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid object in {}: {source}", path.display())]
    Object {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Somewhere a snapshot of Kubernetes objects can be loaded from
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Load every object the source can see
    async fn fetch(&self) -> SourceResult<Vec<DynamicObject>>;

    /// Namespace used for namespaced lookups when none is given explicitly
    fn default_namespace(&self) -> &str {
        "default"
    }
}

/// Initialize a Kubernetes client
///
/// Without a context this uses the default kubeconfig loading strategy:
/// 1. In-cluster config (if running in a pod)
/// 2. KUBECONFIG environment variable
/// 3. ~/.kube/config
///
/// With a context the kubeconfig is always used.
pub async fn create_client(context: Option<&str>) -> SourceResult<Client> {
    let config = match context {
        Some(context) => {
            let options = KubeConfigOptions {
                context: Some(context.to_string()),
                ..Default::default()
            };
            Config::from_kubeconfig(&options).await?
        }
        None => Config::infer().await?,
    };

    tracing::debug!(
        "Connecting to {} (default namespace: {})",
        config.cluster_url,
        config.default_namespace
    );
    Ok(Client::try_from(config)?)
}
