//! CLI command handling module
//!
//! Argument interpretation, root lookup and output rendering for the
//! `kube-lineage` binary.

mod commands;
mod lineage;
mod logging;
mod output;
mod query;

pub use commands::{ConfigSubcommand, handle_config_command};
pub use lineage::{Lineage, LineageError};
pub use logging::init_logging;
pub use output::{RenderOptions, render_json, render_tree};
pub use query::{QueryError, ResourceQuery};
