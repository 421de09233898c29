use std::collections::HashMap;

use anyhow::{anyhow, bail, Context, Result};
use etcd_client::{Client, ConnectOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AdminToolConfig;

/// A segment store node as registered in the coordination service. Only the
/// ip address is consumed by the admin tool; the remaining attributes travel
/// with the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub ip_addr: String,
    /// Data-path port, distinct from the admin gateway port.
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub host_id: String,
}

/// One entry of the host map: a node and the containers it currently owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostContainers {
    pub host: Host,
    pub containers: Vec<u32>,
}

pub type HostMap = Vec<HostContainers>;

pub fn host_map_key(cluster_name: &str) -> String {
    format!("/streamvault/{cluster_name}/segmentstore/hosts")
}

pub fn decode_host_map(payload: &[u8]) -> Result<HostMap> {
    serde_json::from_slice(payload).context("malformed host map payload")
}

/// Inverts host -> containers into container -> owning ip.
///
/// Ownership is exclusive by cluster invariant. Should two hosts ever claim
/// the same container, the later entry wins; the conflict is logged since
/// diagnosing it belongs to the coordination layer, not to this tool.
pub fn container_host_map(host_map: &HostMap) -> HashMap<u32, String> {
    let mut containers = HashMap::new();
    for entry in host_map {
        for &container_id in &entry.containers {
            if let Some(previous) = containers.insert(container_id, entry.host.ip_addr.clone()) {
                if previous != entry.host.ip_addr {
                    warn!(
                        container_id,
                        "container claimed by more than one segment store host"
                    );
                }
            }
        }
    }
    containers
}

/// Reads the host map stored under the cluster's well-known key. The etcd
/// client lives only for the duration of this read.
pub async fn read_host_map(config: &AdminToolConfig) -> Result<HostMap> {
    let opts = ConnectOptions::new().with_connect_timeout(config.connect_timeout());
    let mut client = Client::connect(&config.metadata_addresses, Some(opts))
        .await
        .context("failed to connect to etcd cluster")?;

    let key = host_map_key(&config.cluster_name);
    debug!(key = %key, "reading segment store host map");
    let response = client
        .get(key.as_str(), None)
        .await
        .context("failed to read segment store host map")?;
    let kv = response
        .kvs()
        .first()
        .ok_or_else(|| anyhow!("no host map registered under {key}"))?;
    decode_host_map(kv.value())
}

/// Same as [`read_host_map`] but with the operator-facing error contract:
/// coordination failures are reported on stderr once, then abort the command.
pub async fn current_host_map(config: &AdminToolConfig) -> Result<HostMap> {
    match read_host_map(config).await {
        Ok(host_map) => Ok(host_map),
        Err(err) => {
            eprintln!("Exception accessing to etcd cluster metadata: {err:#}");
            bail!("Error getting segment store hosts for containers.");
        }
    }
}

pub async fn resolve_container_hosts(config: &AdminToolConfig) -> Result<HashMap<u32, String>> {
    let host_map = current_host_map(config).await?;
    Ok(container_host_map(&host_map))
}
