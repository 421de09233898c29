use std::collections::HashMap;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Subcommand};

use crate::admin_client::AdminSegmentClient;
use crate::config::AdminToolConfig;
use crate::{auth, cluster};

const ALL_CONTAINERS: &str = "all";

#[derive(Subcommand)]
pub enum SegmentstoreCommand {
    /// Persist the given Segment Container into long-term storage
    FlushToStorage(FlushToStorageArgs),
}

impl SegmentstoreCommand {
    pub async fn run(&self, config: &AdminToolConfig) -> Result<()> {
        match self {
            SegmentstoreCommand::FlushToStorage(args) => args.run(config).await,
        }
    }
}

#[derive(Args)]
pub struct FlushToStorageArgs {
    /// Container id to persist, or "all" for every container in the cluster
    pub container_id: String,
}

impl FlushToStorageArgs {
    pub async fn run(&self, config: &AdminToolConfig) -> Result<()> {
        config.validate()?;
        let targets = parse_targets(&self.container_id, config.container_count)?;
        let master_token = auth::retrieve_master_token(&config.auth)?;
        let container_hosts = cluster::resolve_container_hosts(config).await?;
        let client = AdminSegmentClient::new(
            config.admin_gateway_port,
            config.connect_timeout(),
            master_token,
        );
        flush_containers(&client, &targets, &container_hosts).await
    }
}

/// Resolves the positional argument into the list of containers to flush:
/// either one id below `container_count` or every id in ascending order.
pub(crate) fn parse_targets(arg: &str, container_count: u32) -> Result<Vec<u32>> {
    if arg.eq_ignore_ascii_case(ALL_CONTAINERS) {
        return Ok((0..container_count).collect());
    }
    let container_id: u32 = arg.parse().with_context(|| {
        format!("container-id must be a non-negative integer or \"{ALL_CONTAINERS}\", got {arg:?}")
    })?;
    if container_id >= container_count {
        bail!("container id {container_id} out of range; the cluster has {container_count} containers");
    }
    Ok(vec![container_id])
}

/// One outstanding flush at a time, in the given order. A failure aborts the
/// rest, leaving an unambiguous prefix of containers known flushed; nothing
/// is rolled back since flushing is idempotent on the server side.
pub(crate) async fn flush_containers(
    client: &AdminSegmentClient,
    targets: &[u32],
    container_hosts: &HashMap<u32, String>,
) -> Result<()> {
    for &container_id in targets {
        let host = container_hosts
            .get(&container_id)
            .ok_or_else(|| anyhow!("no segment store host owns container {container_id}"))?;
        client.flush_to_storage(container_id, host).await?;
        println!("Flushed the Segment Container with containerId {container_id} to Storage.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_target() {
        assert_eq!(parse_targets("0", 4).unwrap(), vec![0]);
        assert_eq!(parse_targets("3", 4).unwrap(), vec![3]);
    }

    #[test]
    fn test_parse_all_is_ascending_and_case_insensitive() {
        assert_eq!(parse_targets("all", 4).unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(parse_targets("ALL", 4).unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(parse_targets("All", 2).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_parse_rejects_out_of_range_ids() {
        assert!(parse_targets("4", 4).is_err());
        assert!(parse_targets("100", 4).is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_targets("-1", 4).is_err());
        assert!(parse_targets("zero", 4).is_err());
        assert!(parse_targets("", 4).is_err());
        assert!(parse_targets("1.5", 4).is_err());
    }
}
