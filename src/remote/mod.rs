//! Remote session manager (C8): a synchronous-looking facade over a
//! long-lived streaming MCP session to the authoritative remote service.
//!
//! The source's Python implementation runs a dedicated event-loop thread and
//! submits coroutines to it (two concurrency models meeting). This crate is
//! async-native throughout, so that thread collapses into ordinary awaits
//! serialized by one mutex around the session state — the same semantics,
//! fewer moving parts, matching the allowance in the design notes.

use chrono::{DateTime, Utc};
use rmcp::model::{CallToolRequestParams, CallToolResult, ClientInfo, Implementation};
use rmcp::service::{Peer, RunningService};
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::{serve_client, RoleClient};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfficialErrorCode {
    OfficialToolError,
    OfficialUnavailable,
}

impl std::fmt::Display for OfficialErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OfficialErrorCode::OfficialToolError => "official_tool_error",
            OfficialErrorCode::OfficialUnavailable => "official_unavailable",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct OfficialToolError {
    pub code: OfficialErrorCode,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub timeout_seconds: u64,
    pub sse_read_timeout_seconds: u64,
    pub read_timeout_seconds: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            url: "https://mcp.linear.app/mcp".to_string(),
            headers: HashMap::new(),
            timeout_seconds: 30,
            sse_read_timeout_seconds: 300,
            read_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RemoteHealth {
    pub url: String,
    pub connected: bool,
    pub failure_count: u64,
    pub last_error: Option<String>,
    pub last_connected_at: Option<DateTime<Utc>>,
}

struct SessionState {
    peer: Option<Peer<RoleClient>>,
    service: Option<RunningService<RoleClient, ClientInfo>>,
    connected: bool,
    failure_count: u64,
    last_error: Option<String>,
    last_connected_at: Option<DateTime<Utc>>,
    cached_tool_names: Vec<String>,
}

impl SessionState {
    fn new() -> Self {
        SessionState {
            peer: None,
            service: None,
            connected: false,
            failure_count: 0,
            last_error: None,
            last_connected_at: None,
            cached_tool_names: Vec::new(),
        }
    }
}

pub struct RemoteSession {
    config: RemoteConfig,
    state: Mutex<SessionState>,
}

impl RemoteSession {
    pub fn new(config: RemoteConfig) -> Self {
        RemoteSession { config, state: Mutex::new(SessionState::new()) }
    }

    fn client_info() -> ClientInfo {
        ClientInfo {
            meta: None,
            protocol_version: Default::default(),
            capabilities: Default::default(),
            client_info: Implementation {
                name: "linear-fast".into(),
                title: Some("Linear Fast Query Layer".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
        }
    }

    async fn do_connect(&self, state: &mut SessionState) -> Result<(), OfficialToolError> {
        let mut transport_config = StreamableHttpClientTransportConfig::with_uri(self.config.url.as_str());
        if let Some(token) = self.config.headers.get("Authorization").cloned() {
            transport_config = transport_config.auth_header(token);
        }
        let transport = StreamableHttpClientTransport::from_config(transport_config);

        let service = serve_client(Self::client_info(), transport).await.map_err(|e| OfficialToolError {
            code: OfficialErrorCode::OfficialUnavailable,
            message: format!("failed to connect to {}: {e}", self.config.url),
        })?;
        let peer = service.peer().clone();

        let tools = peer.list_all_tools().await.map_err(|e| OfficialToolError {
            code: OfficialErrorCode::OfficialUnavailable,
            message: format!("failed to list tools after connect: {e}"),
        })?;

        state.cached_tool_names = tools.iter().map(|t| t.name.to_string()).collect();
        state.peer = Some(peer);
        state.service = Some(service);
        state.connected = true;
        state.last_connected_at = Some(Utc::now());
        Ok(())
    }

    fn disconnect(state: &mut SessionState) {
        // Dropping the RunningService tears down the transport; any error
        // doing so is not actionable here.
        state.peer = None;
        state.service = None;
        state.connected = false;
    }

    async fn ensure_connected(&self, state: &mut SessionState) -> Result<(), OfficialToolError> {
        if state.connected && state.peer.is_some() {
            return Ok(());
        }
        self.do_connect(state).await
    }

    fn record_failure(state: &mut SessionState, message: String) {
        state.failure_count += 1;
        state.last_error = Some(message);
    }

    fn normalize_result(result: CallToolResult) -> Result<Value, OfficialToolError> {
        let text = || -> String {
            result
                .content
                .iter()
                .filter_map(|c| c.as_text().map(|t| t.text.to_string()))
                .collect::<Vec<_>>()
                .join("\n")
        };

        if result.is_error.unwrap_or(false) {
            return Err(OfficialToolError { code: OfficialErrorCode::OfficialToolError, message: text() });
        }
        if let Some(structured) = result.structured_content.clone() {
            return Ok(structured);
        }
        let joined = text();
        match serde_json::from_str::<Value>(&joined) {
            Ok(v) => Ok(v),
            Err(_) => Ok(serde_json::json!({ "text": joined })),
        }
    }

    /// The sole hot path: serialized call with a reconnect-once retry.
    pub async fn call_tool(&self, name: &str, args: Option<Value>) -> Result<Value, OfficialToolError> {
        let mut state = self.state.lock().await;
        let arguments = match args {
            Some(Value::Object(map)) => Some(map),
            Some(_) | None => None,
        };

        for attempt in 0..2 {
            if let Err(err) = self.ensure_connected(&mut state).await {
                Self::record_failure(&mut state, err.message.clone());
                Self::disconnect(&mut state);
                if attempt == 1 {
                    return Err(OfficialToolError { code: OfficialErrorCode::OfficialUnavailable, message: err.message });
                }
                continue;
            }

            let peer = state.peer.clone().expect("ensure_connected guarantees a peer");
            let call = peer.call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_string().into(),
                arguments: arguments.clone(),
                task: None,
            });
            let outcome = tokio::time::timeout(
                Duration::from_secs(self.config.read_timeout_seconds + 10),
                call,
            )
            .await;

            match outcome {
                Ok(Ok(result)) => {
                    state.failure_count = 0;
                    state.last_error = None;
                    return Self::normalize_result(result);
                }
                Ok(Err(e)) => {
                    let message = e.to_string();
                    Self::record_failure(&mut state, message.clone());
                    Self::disconnect(&mut state);
                    if attempt == 1 {
                        return Err(OfficialToolError { code: OfficialErrorCode::OfficialUnavailable, message });
                    }
                }
                Err(_) => {
                    let message = format!("remote call to '{name}' timed out");
                    Self::record_failure(&mut state, message.clone());
                    Self::disconnect(&mut state);
                    if attempt == 1 {
                        return Err(OfficialToolError { code: OfficialErrorCode::OfficialUnavailable, message });
                    }
                }
            }
        }
        unreachable!("loop always returns on attempt 1")
    }

    /// Returns the last successfully cached tool name list without forcing a
    /// reconnect; empty if never connected.
    pub async fn list_tools(&self) -> Vec<String> {
        self.state.lock().await.cached_tool_names.clone()
    }

    pub async fn get_health(&self) -> RemoteHealth {
        let state = self.state.lock().await;
        RemoteHealth {
            url: self.config.url.clone(),
            connected: state.connected,
            failure_count: state.failure_count,
            last_error: state.last_error.clone(),
            last_connected_at: state.last_connected_at,
        }
    }

    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        Self::disconnect(&mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_reference_endpoint() {
        let config = RemoteConfig::default();
        assert_eq!(config.url, "https://mcp.linear.app/mcp");
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.sse_read_timeout_seconds, 300);
    }

    #[tokio::test]
    async fn health_before_any_connection_attempt() {
        let session = RemoteSession::new(RemoteConfig::default());
        let health = session.get_health().await;
        assert!(!health.connected);
        assert_eq!(health.failure_count, 0);
        assert!(session.list_tools().await.is_empty());
    }
}
