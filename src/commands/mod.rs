use anyhow::Result;
use clap::Subcommand;

use crate::config::AdminToolConfig;

pub mod cluster;
pub mod segmentstore;

#[derive(Subcommand)]
pub enum Command {
    /// Commands addressed to segment store nodes
    #[command(subcommand)]
    Segmentstore(segmentstore::SegmentstoreCommand),
    /// Cluster membership queries
    #[command(subcommand)]
    Cluster(cluster::ClusterCommand),
}

impl Command {
    pub async fn run(&self, config: &AdminToolConfig) -> Result<()> {
        match self {
            Command::Segmentstore(cmd) => cmd.run(config).await,
            Command::Cluster(cmd) => cmd.run(config).await,
        }
    }
}
