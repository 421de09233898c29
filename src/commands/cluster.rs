use anyhow::Result;
use clap::Subcommand;

use crate::cluster;
use crate::config::AdminToolConfig;

#[derive(Subcommand)]
pub enum ClusterCommand {
    /// Print the current segment store host to container ownership map
    ListHosts,
}

impl ClusterCommand {
    pub async fn run(&self, config: &AdminToolConfig) -> Result<()> {
        match self {
            ClusterCommand::ListHosts => list_hosts(config).await,
        }
    }
}

async fn list_hosts(config: &AdminToolConfig) -> Result<()> {
    let host_map = cluster::current_host_map(config).await?;
    if host_map.is_empty() {
        println!("No segment store hosts registered.");
        return Ok(());
    }
    for entry in &host_map {
        let mut containers = entry.containers.clone();
        containers.sort_unstable();
        println!(
            "{}:{} ({}) -> containers {:?}",
            entry.host.ip_addr, entry.host.port, entry.host.host_id, containers
        );
    }
    Ok(())
}
