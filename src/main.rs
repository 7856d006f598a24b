//! kube-lineage - display all dependents of a Kubernetes object
//!
//! Loads a snapshot of objects from the cluster (or from manifest files),
//! resolves the relationships between them and prints the tree of objects
//! that depend on the requested one.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use kube_lineage::cli::{
    ConfigSubcommand, Lineage, RenderOptions, ResourceQuery, handle_config_command, init_logging,
    render_json, render_tree,
};
use kube_lineage::config::{ConfigLoader, OutputFormat};
use kube_lineage::kube::{ClusterSource, FileSource, ObjectSource, create_client};
use kube_lineage::relationships::default_registry;

/// Display all dependents of a Kubernetes object
#[derive(Parser, Debug)]
#[command(name = "kube-lineage", version)]
#[command(about = "Display all dependents of a Kubernetes object", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Args {
    /// Enable debug logging
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    /// Resource type (TYPE, TYPE/NAME or TYPE.GROUP/NAME)
    resource: Option<String>,

    /// Object name
    name: Option<String>,

    /// Namespace of the object
    #[arg(long, short = 'n')]
    namespace: Option<String>,

    /// List objects in all namespaces instead of only the object's namespace
    #[arg(long, short = 'A')]
    all_namespaces: bool,

    /// Read objects from manifest files instead of the cluster
    #[arg(long = "file", short = 'f', value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long)]
    context: Option<String>,

    /// Output format
    #[arg(long, short = 'o', value_enum)]
    output: Option<OutputFormat>,

    /// Include API groups in object names
    #[arg(long)]
    show_group: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Main commands
#[derive(Subcommand, Debug)]
enum Command {
    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(log_path) = init_logging(args.debug)? {
        eprintln!("Debug logging enabled: {}", log_path.display());
    }

    if let Some(Command::Config { subcommand }) = args.command {
        return handle_config_command(subcommand);
    }

    let resource = args
        .resource
        .as_deref()
        .context("Missing resource: expected TYPE NAME, TYPE/NAME or TYPE.GROUP/NAME")?;
    let query = ResourceQuery::parse(resource, args.name.as_deref())?;

    let config = ConfigLoader::load().context("Failed to load configuration")?;
    let namespace = args
        .namespace
        .clone()
        .or_else(|| Some(config.default_namespace.clone()).filter(|ns| !ns.is_empty()));
    let output = args.output.unwrap_or(config.output);
    let options = RenderOptions {
        show_group: args.show_group || config.show_group,
    };

    let source: Box<dyn ObjectSource> = if args.files.is_empty() {
        let client = create_client(args.context.as_deref())
            .await
            .context("Failed to connect to Kubernetes cluster")?;
        let scope = if args.all_namespaces {
            None
        } else {
            Some(
                namespace
                    .clone()
                    .unwrap_or_else(|| client.default_namespace().to_string()),
            )
        };
        Box::new(
            ClusterSource::new(client)
                .namespace(scope)
                .concurrency(config.fetch.concurrency)
                .exclude_groups(config.fetch.excluded_groups.clone()),
        )
    } else {
        Box::new(FileSource::new(args.files.clone()).namespace(namespace.clone()))
    };

    let lineage = Lineage::load(source.as_ref(), &query, namespace.as_deref()).await?;

    let registry = default_registry();
    let graph = lineage.graph(&registry);
    let stats = graph.stats();
    tracing::info!(
        "Resolved {} objects: {} edges, {} unresolved, {} extractor failures",
        stats.indexed_objects,
        stats.edges,
        stats.dropped(),
        stats.extractor_failures
    );
    let nodes = graph.dependents_of(lineage.root_uid());

    match output {
        OutputFormat::Tree => print!("{}", render_tree(&nodes, lineage.root_uid(), options)),
        OutputFormat::Json => println!(
            "{}",
            render_json(&nodes).context("Failed to serialize dependents")?
        ),
    }

    Ok(())
}
