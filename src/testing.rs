use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use admin_api::segment_store_admin::segment_store_admin_server::{
    SegmentStoreAdmin, SegmentStoreAdminServer,
};
use admin_api::segment_store_admin::{FlushToStorageRequest, StorageFlushedResponse};
use anyhow::Result;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response, Status};

/// In-process stand-in for a segment store admin gateway. Records arrival
/// order of flush requests and can be programmed to fail a given container,
/// delay replies, or reject missing master tokens.
#[derive(Default)]
pub struct MockState {
    pub calls: Mutex<Vec<u32>>,
    pub fail_on: Mutex<Option<u32>>,
    pub delay: Mutex<Option<Duration>>,
    pub require_token: Mutex<Option<String>>,
}

impl MockState {
    pub fn recorded_calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_on(&self, container_id: u32) {
        *self.fail_on.lock().unwrap() = Some(container_id);
    }

    pub fn delay_replies(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay.into();
    }

    pub fn clear_delay(&self) {
        *self.delay.lock().unwrap() = None;
    }

    pub fn require_token(&self, token: &str) {
        *self.require_token.lock().unwrap() = Some(token.to_string());
    }
}

#[derive(Clone, Default)]
pub struct MockSegmentStore {
    pub state: Arc<MockState>,
}

#[tonic::async_trait]
impl SegmentStoreAdmin for MockSegmentStore {
    async fn flush_to_storage(
        &self,
        request: Request<FlushToStorageRequest>,
    ) -> Result<Response<StorageFlushedResponse>, Status> {
        if let Some(expected) = self.state.require_token.lock().unwrap().clone() {
            let authorized = request
                .metadata()
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .map(|value| value == format!("Bearer {expected}"))
                .unwrap_or(false);
            if !authorized {
                return Err(Status::unauthenticated(
                    "master token missing or not accepted",
                ));
            }
        }

        let container_id = request.into_inner().container_id;
        self.state.calls.lock().unwrap().push(container_id);

        let delay = *self.state.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *self.state.fail_on.lock().unwrap() == Some(container_id) {
            return Err(Status::internal(format!(
                "flush failed for container {container_id}"
            )));
        }
        Ok(Response::new(StorageFlushedResponse { container_id }))
    }
}

/// Serves the mock on an ephemeral loopback port until the test runtime
/// shuts down.
pub async fn spawn_mock_segment_store(mock: MockSegmentStore) -> Result<SocketAddr> {
    spawn_mock_segment_store_at("127.0.0.1:0".parse()?, mock).await
}

/// Same, but on a fixed address. Lets tests stand up one gateway per loopback
/// alias on the same port, mirroring the uniform admin port of a real cluster.
pub async fn spawn_mock_segment_store_at(
    addr: SocketAddr,
    mock: MockSegmentStore,
) -> Result<SocketAddr> {
    let listener = TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;
    let incoming = TcpListenerStream::new(listener);
    tokio::spawn(async move {
        let _ = tonic::transport::Server::builder()
            .add_service(SegmentStoreAdminServer::new(mock))
            .serve_with_incoming(incoming)
            .await;
    });
    Ok(addr)
}
