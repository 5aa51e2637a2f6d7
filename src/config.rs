//! Operator process configuration
//!
//! Every option can be given as a flag or through its environment variable.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Command-line and environment configuration
#[derive(Clone, Debug, Parser)]
#[command(name = "ovn-central-operator", version, about)]
pub struct Config {
    /// Directory containing ovsdb_container.yaml, pvc.yaml and bootstrap-container.yaml
    #[arg(long, env = "OPERATOR_YAMLS")]
    pub templates_dir: PathBuf,

    /// Only watch OVNCentral resources in this namespace
    #[arg(long, env = "WATCH_NAMESPACE")]
    pub namespace: Option<String>,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,

    /// Seconds between checks on a running bootstrap pod
    #[arg(long, env = "REQUEUE_SECS", default_value_t = 30)]
    pub requeue_secs: u64,
}

impl Config {
    pub fn requeue_interval(&self) -> Duration {
        Duration::from_secs(self.requeue_secs)
    }
}
