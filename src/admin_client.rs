use std::time::Duration;

use admin_api::segment_store_admin::segment_store_admin_client::SegmentStoreAdminClient;
use admin_api::segment_store_admin::{FlushToStorageRequest, StorageFlushedResponse};
use anyhow::{anyhow, Context, Result};
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, Uri};
use tonic::Request;
use tracing::debug;

/// Per-request deadline for admin RPCs. Flushing a large container can take a
/// while; the gateway keeps working past this only on its own side.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60 * 5);

/// Thin client for the privileged admin gateway of segment store nodes.
///
/// One RPC at a time; a fresh channel per call, dropped when the call
/// resolves, so no connection state outlives a command invocation.
pub struct AdminSegmentClient {
    admin_gateway_port: u16,
    connect_timeout: Duration,
    request_timeout: Duration,
    master_token: String,
}

impl AdminSegmentClient {
    pub fn new(admin_gateway_port: u16, connect_timeout: Duration, master_token: String) -> Self {
        AdminSegmentClient {
            admin_gateway_port,
            connect_timeout,
            request_timeout: REQUEST_TIMEOUT,
            master_token,
        }
    }

    #[cfg(test)]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    async fn connect(&self, host: &str) -> Result<Channel> {
        let uri: Uri = format!("http://{}:{}", host, self.admin_gateway_port)
            .parse()
            .context("invalid admin gateway endpoint")?;
        Channel::builder(uri)
            .connect_timeout(self.connect_timeout)
            .connect()
            .await
            .with_context(|| {
                format!(
                    "failed to connect to segment store at {}:{}",
                    host, self.admin_gateway_port
                )
            })
    }

    /// Issues FlushToStorage against the node owning the container and waits
    /// for the StorageFlushed acknowledgement within the request deadline.
    pub async fn flush_to_storage(
        &self,
        container_id: u32,
        host: &str,
    ) -> Result<StorageFlushedResponse> {
        debug!(container_id, host, "issuing FlushToStorage");
        let rpc = async {
            let channel = self.connect(host).await?;
            let mut client = SegmentStoreAdminClient::new(channel);
            let mut request = Request::new(FlushToStorageRequest { container_id });
            let token: MetadataValue<Ascii> = format!("Bearer {}", self.master_token)
                .parse()
                .context("master token is not valid metadata")?;
            request.metadata_mut().insert("authorization", token);
            let response = client
                .flush_to_storage(request)
                .await
                .with_context(|| format!("flush to storage failed for container {container_id}"))?;
            Ok::<_, anyhow::Error>(response.into_inner())
        };
        tokio::time::timeout(self.request_timeout, rpc)
            .await
            .map_err(|_| {
                anyhow!(
                    "flush to storage timed out after {:?} for container {container_id}",
                    self.request_timeout
                )
            })?
    }
}
