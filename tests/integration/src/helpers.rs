//! Test helpers for integration tests
//!
//! Provides utilities for spawning the mock server, building client configuration
//! pointed at it, and waiting on room sessions.

use std::net::SocketAddr;
use std::time::Duration;

use ama_client::HttpRoomApi;
use ama_common::{ApiConfig, AppSettings, ClientConfig, LiveConfig};
use ama_core::RoomId;
use ama_sync::{RoomSession, RoomView, SessionNotice};
use anyhow::Result;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::mock::{router, MockState};

/// Upper bound for any single wait in a test
pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Mock server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: MockState,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a mock server on an ephemeral port
    pub async fn start() -> Result<Self> {
        let state = MockState::new();
        let app = router(state.clone());

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    /// REST base URL
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Websocket base URL
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Client configuration with fast reconnects
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            app: AppSettings {
                name: "ama-integration".to_string(),
                env: ama_common::Environment::Development,
            },
            api: ApiConfig {
                base_url: self.api_url(),
                request_timeout_ms: 5_000,
            },
            live: LiveConfig {
                ws_url: self.ws_url(),
                reconnect_initial_ms: 20,
                reconnect_max_ms: 100,
                degraded_after: 3,
                resync_on_reconnect: true,
                event_buffer: 64,
            },
        }
    }

    pub fn api(&self) -> Result<HttpRoomApi> {
        Ok(HttpRoomApi::new(&self.client_config().api)?)
    }

    /// Open a session with the default test configuration
    pub fn open_session(&self, room_id: &str) -> Result<RoomSession> {
        self.open_session_with(room_id, self.client_config())
    }

    pub fn open_session_with(&self, room_id: &str, config: ClientConfig) -> Result<RoomSession> {
        Ok(ama_client::connect(&config, RoomId::from(room_id))?)
    }

    /// Wait until `n` websocket subscribers are attached to a room
    pub async fn wait_for_subscribers(&self, room_id: &str, n: usize) -> Result<()> {
        let deadline = tokio::time::Instant::now() + TIMEOUT;
        while self.state.subscriber_count(room_id) != n {
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!(
                    "expected {n} subscribers, have {}",
                    self.state.subscriber_count(room_id)
                );
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Wait until the published view satisfies a predicate
pub async fn wait_for_view(
    session: &RoomSession,
    what: impl Fn(&RoomView) -> bool,
) -> Result<RoomView> {
    let mut rx = session.watch();
    let view = tokio::time::timeout(TIMEOUT, rx.wait_for(|view| what(view)))
        .await
        .map_err(|_| anyhow::anyhow!("timed out waiting for view"))?
        .map_err(|_| anyhow::anyhow!("session closed while waiting"))?
        .clone();
    Ok(view)
}

/// Wait for the next notice matching a predicate, skipping others
pub async fn wait_for_notice(
    notices: &mut broadcast::Receiver<SessionNotice>,
    what: impl Fn(&SessionNotice) -> bool,
) -> Result<SessionNotice> {
    tokio::time::timeout(TIMEOUT, async {
        loop {
            match notices.recv().await {
                Ok(notice) if what(&notice) => return Ok(notice),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => {
                    anyhow::bail!("notice stream closed")
                }
            }
        }
    })
    .await
    .map_err(|_| anyhow::anyhow!("timed out waiting for notice"))?
}
