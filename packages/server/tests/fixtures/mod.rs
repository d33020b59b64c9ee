//! Test fixtures shared by the integration tests.
//!
//! `TestServer` runs the full router in-process on an ephemeral port, so tests
//! can run in parallel without port collisions.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use hiroba_server::{
    ServerConfig,
    domain::{UserDisplay, UserId},
    infrastructure::{auth::JwtCredentialVerifier, repository::InMemoryUserDirectory},
    ui::{serve, state::AppState},
};
use tokio::{net::TcpStream, sync::oneshot};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

pub const SECRET: &str = "integration-test-secret";

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long to wait for a frame before failing a test
const RECV_TIMEOUT: Duration = Duration::from_secs(3);

pub struct TestServer {
    addr: SocketAddr,
    pub state: Arc<AppState>,
    pub directory: Arc<InMemoryUserDirectory>,
    issuer: JwtCredentialVerifier,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(ServerConfig::with_secret(SECRET)).await
    }

    pub async fn start_with(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        let directory = Arc::new(InMemoryUserDirectory::new());
        let state = Arc::new(AppState::new(
            &config,
            Arc::new(JwtCredentialVerifier::new(config.jwt_secret.as_bytes())),
            directory.clone(),
        ));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server_state = state.clone();
        tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = serve(listener, server_state, shutdown).await {
                eprintln!("Test server error: {e}");
            }
        });

        Self {
            addr,
            state,
            directory,
            issuer: JwtCredentialVerifier::new(config.jwt_secret.as_bytes()),
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// A valid access token for `user_id`
    pub fn token(&self, user_id: &str) -> String {
        self.issuer
            .issue_token(&user(user_id), 3600)
            .expect("Failed to issue token")
    }

    pub async fn add_user(&self, user_id: &str, name: &str) {
        self.directory
            .upsert(
                user(user_id),
                UserDisplay {
                    name: name.to_string(),
                    username: user_id.to_string(),
                    avatar_url: None,
                },
            )
            .await;
    }

    /// Open a websocket without authenticating
    pub async fn connect(&self) -> WsClient {
        let (ws, _) = connect_async(self.ws_url())
            .await
            .expect("Failed to connect websocket");
        ws
    }

    /// Open a websocket and complete the handshake as `user_id`
    pub async fn connect_as(&self, user_id: &str) -> WsClient {
        let mut ws = self.connect().await;
        send_json(
            &mut ws,
            serde_json::json!({"type": "authentication", "token": self.token(user_id)}),
        )
        .await;
        let reply = recv_json(&mut ws).await;
        assert_eq!(reply["type"], "auth_success", "unexpected reply: {reply}");
        ws
    }

    /// Poll `/api/connections` until `user_id` has `expected` connections
    pub async fn wait_for_connections(&self, user_id: &str, expected: u64) {
        let client = reqwest::Client::new();
        for _ in 0..50 {
            let body: serde_json::Value = client
                .get(format!("{}/api/connections", self.base_url()))
                .send()
                .await
                .expect("Failed to send request")
                .json()
                .await
                .expect("Failed to parse JSON");
            let count = body
                .as_array()
                .and_then(|users| users.iter().find(|u| u["userId"] == user_id))
                .and_then(|u| u["connections"].as_u64())
                .unwrap_or(0);
            if count == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("user {user_id} never reached {expected} connections");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub fn user(id: &str) -> UserId {
    UserId::new(id.to_string()).expect("Invalid user id")
}

pub async fn send_json(ws: &mut WsClient, value: serde_json::Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("Failed to send frame");
}

/// Next JSON text frame, skipping control frames
pub async fn recv_json(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("Connection ended")
            .expect("WebSocket error");
        match msg {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("Frame is not JSON");
            }
            Message::Close(frame) => panic!("Connection closed: {frame:?}"),
            _ => continue,
        }
    }
}

/// Wait for the server to close the connection, returning the close code
pub async fn recv_close(ws: &mut WsClient) -> Option<u16> {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for close");
        match msg {
            Some(Ok(Message::Close(frame))) => return frame.map(|f| u16::from(f.code)),
            Some(Ok(_)) => continue,
            Some(Err(_)) | None => return None,
        }
    }
}

/// Assert that nothing arrives within `wait`
pub async fn assert_silent(ws: &mut WsClient, wait: Duration) {
    if let Ok(Some(Ok(msg))) = tokio::time::timeout(wait, ws.next()).await {
        panic!("expected no frame, got {msg:?}");
    }
}
