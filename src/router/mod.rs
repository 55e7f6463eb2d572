//! Router (C9): the single entry point external callers go through. Picks
//! local-only, local-with-fallback, or official-passthrough per tool name,
//! and opens a coherence window after any write so reads that follow it
//! don't serve a snapshot known to be behind the write they just caused.

use crate::handlers::{self, LocalFallbackRequested};
use crate::remote::{OfficialErrorCode, OfficialToolError, RemoteHealth, RemoteSession};
use crate::snapshot::cache::{CachedSnapshot, Health};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const COHERENCE_WINDOW_SECONDS: u64 = 30;

const WRITE_PREFIXES: &[&str] = &["create_", "update_", "delete_", "archive_", "unarchive_"];

fn looks_like_write(tool_name: &str) -> bool {
    WRITE_PREFIXES.iter().any(|p| tool_name.starts_with(p))
}

#[derive(Debug, Clone)]
pub struct RouterHealth {
    pub local: Health,
    pub remote: RemoteHealth,
    pub coherence_window_active: bool,
    pub coherence_window_deadline: Option<chrono::DateTime<chrono::Utc>>,
}

enum LocalOutcome {
    Value(Value),
    Fallback(LocalFallbackRequested),
    /// Not one of this router's known local tools.
    Unrecognized,
}

fn to_outcome<T: serde::Serialize>(result: T) -> LocalOutcome {
    match serde_json::to_value(result) {
        Ok(v) => LocalOutcome::Value(v),
        Err(e) => LocalOutcome::Fallback(LocalFallbackRequested {
            code: crate::handlers::FallbackCode::UnsupportedFilter,
            message: format!("failed to serialize local result: {e}"),
        }),
    }
}

fn dispatch_local(snapshot: &crate::snapshot::Snapshot, tool_name: &str, raw_args: &Value) -> LocalOutcome {
    macro_rules! args {
        () => {
            match serde_json::from_value(raw_args.clone()) {
                Ok(a) => a,
                Err(e) => {
                    return LocalOutcome::Fallback(LocalFallbackRequested {
                        code: crate::handlers::FallbackCode::UnsupportedFilter,
                        message: format!("invalid arguments for {tool_name}: {e}"),
                    })
                }
            }
        };
    }

    match tool_name {
        "list_issues" => to_outcome(handlers::list_issues(snapshot, &args!())),
        "get_issue" => to_outcome(handlers::get_issue(snapshot, &args!())),
        "list_teams" => to_outcome(handlers::list_teams(snapshot)),
        "get_team" => to_outcome(handlers::get_team(snapshot, &args!())),
        "list_projects" => to_outcome(handlers::list_projects(snapshot, &args!())),
        "get_project" => to_outcome(handlers::get_project(snapshot, &args!())),
        "list_users" => to_outcome(handlers::list_users(snapshot)),
        "get_user" => to_outcome(handlers::get_user(snapshot, &args!())),
        "list_issue_statuses" => to_outcome(handlers::list_issue_statuses(snapshot, &args!())),
        "get_issue_status" => to_outcome(handlers::get_issue_status(snapshot, &args!())),
        "list_comments" => to_outcome(handlers::list_comments(snapshot, &args!())),
        "list_issue_labels" => to_outcome(handlers::list_issue_labels(snapshot, &args!())),
        "list_initiatives" => to_outcome(handlers::list_initiatives(snapshot)),
        "get_initiative" => to_outcome(handlers::get_initiative(snapshot, &args!())),
        "list_cycles" => to_outcome(handlers::list_cycles(snapshot, &args!())),
        "list_documents" => to_outcome(handlers::list_documents(snapshot, &args!())),
        "get_document" => to_outcome(handlers::get_document(snapshot, &args!())),
        "list_milestones" => to_outcome(handlers::list_milestones(snapshot, &args!())),
        "get_milestone" => to_outcome(handlers::get_milestone(snapshot, &args!())),
        "list_project_updates" => match handlers::list_project_updates(snapshot, &args!()) {
            Ok(v) => to_outcome(v),
            Err(e) => LocalOutcome::Fallback(e),
        },
        "get_status_updates" => {
            let parsed: crate::handlers::args::GetStatusUpdatesArgs = args!();
            if parsed.id.is_some() {
                match handlers::get_status_update_by_id(snapshot, &parsed) {
                    Ok(v) => to_outcome(v),
                    Err(e) => LocalOutcome::Fallback(e),
                }
            } else {
                match handlers::get_status_updates(snapshot, &parsed) {
                    Ok(v) => to_outcome(v),
                    Err(e) => LocalOutcome::Fallback(e),
                }
            }
        }
        _ => LocalOutcome::Unrecognized,
    }
}

/// Ties the cache, local handlers, and the remote session together behind one
/// call surface. Holds the coherence-window deadline so a write followed
/// immediately by a read doesn't serve a snapshot known to predate it.
pub struct Router {
    cache: Arc<CachedSnapshot>,
    remote: Arc<RemoteSession>,
    coherence_deadline: Mutex<Option<Instant>>,
    coherence_window: Duration,
}

impl Router {
    pub fn new(cache: Arc<CachedSnapshot>, remote: Arc<RemoteSession>) -> Self {
        Self::with_coherence_window(cache, remote, Duration::from_secs(COHERENCE_WINDOW_SECONDS))
    }

    pub fn with_coherence_window(cache: Arc<CachedSnapshot>, remote: Arc<RemoteSession>, coherence_window: Duration) -> Self {
        Router { cache, remote, coherence_deadline: Mutex::new(None), coherence_window }
    }

    async fn open_coherence_window(&self) {
        let mut deadline = self.coherence_deadline.lock().await;
        *deadline = Some(Instant::now() + self.coherence_window);
    }

    async fn coherence_window_active(&self) -> bool {
        match *self.coherence_deadline.lock().await {
            Some(deadline) => Instant::now() < deadline,
            None => false,
        }
    }

    /// `list_official_tools`: the only tool that never touches local state.
    pub async fn list_official_tools(&self) -> Vec<String> {
        self.remote.list_tools().await
    }

    /// The primary read path: local handlers first, remote only on explicit
    /// fallback or for tools this router doesn't implement locally.
    pub async fn call_read(&self, tool_name: &str, args: Value) -> Result<Value, OfficialToolError> {
        if tool_name == "list_official_tools" {
            return Ok(serde_json::json!(self.list_official_tools().await));
        }

        if self.coherence_window_active().await {
            tracing::debug!(tool = tool_name, "coherence window open, routing read through remote session");
            return self.remote.call_tool(tool_name, Some(args)).await;
        }

        let snapshot = self.cache.ensure_cache().await;
        match dispatch_local(&snapshot, tool_name, &args) {
            LocalOutcome::Value(v) => Ok(v),
            LocalOutcome::Fallback(reason) => {
                tracing::info!(tool = tool_name, reason = %reason, "falling back to remote");
                self.remote.call_tool(tool_name, Some(args)).await
            }
            LocalOutcome::Unrecognized => self.remote.call_tool(tool_name, Some(args)).await,
        }
    }

    /// Writes (and anything this router doesn't recognize as local) always go
    /// straight to the remote service. A successful write invalidates the
    /// local cache and opens a coherence window so the read that naturally
    /// follows doesn't serve stale data out of the TTL cache.
    pub async fn call_official(&self, tool_name: &str, args: Value) -> Result<Value, OfficialToolError> {
        let result = self.remote.call_tool(tool_name, Some(args)).await?;
        if looks_like_write(tool_name) {
            self.cache.mark_stale().await;
            self.open_coherence_window().await;
        }
        Ok(result)
    }

    pub async fn refresh_local_cache(&self) -> Health {
        self.cache.refresh_cache(true).await
    }

    pub async fn get_health(&self) -> RouterHealth {
        let deadline = *self.coherence_deadline.lock().await;
        let active = self.coherence_window_active().await;
        RouterHealth {
            local: self.cache.health().await,
            remote: self.remote.get_health().await,
            coherence_window_active: active,
            coherence_window_deadline: deadline.map(|d| {
                let remaining = d.saturating_duration_since(Instant::now());
                chrono::Utc::now() + chrono::Duration::from_std(remaining).unwrap_or_default()
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    LocalOnly,
    LocalFirstFallback,
    OfficialOnly,
    OfficialWithCoherenceWindow,
}

/// Classifies a tool name the way [`Router::call_read`]/[`Router::call_official`]
/// already behave; exposed for callers (the CLI, health reporting) that want
/// to describe a tool without actually invoking it. Does not know whether a
/// coherence window happens to be open right now — that's a runtime state,
/// not a property of the tool name — so a `LocalFirstFallback` tool can still
/// be served from the remote session for the duration of a window.
pub fn classify(tool_name: &str) -> RouteKind {
    match tool_name {
        "list_official_tools" => RouteKind::OfficialOnly,
        "list_issues" | "get_issue" | "list_teams" | "get_team" | "list_projects" | "get_project" | "list_users"
        | "get_user" | "list_issue_statuses" | "get_issue_status" | "list_comments" | "list_issue_labels"
        | "list_initiatives" | "get_initiative" | "list_cycles" | "list_documents" | "get_document"
        | "list_milestones" | "get_milestone" | "get_status_updates" | "list_project_updates" => {
            RouteKind::LocalFirstFallback
        }
        name if looks_like_write(name) => RouteKind::OfficialWithCoherenceWindow,
        _ => RouteKind::OfficialOnly,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_tools() {
        assert_eq!(classify("list_issues"), RouteKind::LocalFirstFallback);
        assert_eq!(classify("get_status_updates"), RouteKind::LocalFirstFallback);
        assert_eq!(classify("list_official_tools"), RouteKind::OfficialOnly);
        assert_eq!(classify("create_issue"), RouteKind::OfficialWithCoherenceWindow);
        assert_eq!(classify("search_documents"), RouteKind::OfficialOnly);
    }

    #[test]
    fn write_prefixes_cover_expected_verbs() {
        for name in ["create_comment", "update_issue", "delete_issue", "archive_project", "unarchive_project"] {
            assert!(looks_like_write(name), "{name} should be classified as a write");
        }
        assert!(!looks_like_write("list_issues"));
    }

    #[tokio::test]
    async fn coherence_window_routes_reads_through_remote() {
        use crate::snapshot::loader::SnapshotLoader;
        use crate::snapshot::scope::ScopeConfig;
        use crate::snapshot::store::{CrdtDecoder, ObjectStoreDatabase};
        use async_trait::async_trait;
        use std::collections::HashMap;

        struct FakeDb(HashMap<String, Vec<crate::model::AttributeMap>>);
        #[async_trait]
        impl ObjectStoreDatabase for FakeDb {
            fn object_store_names(&self) -> Vec<String> {
                self.0.keys().cloned().collect()
            }
            async fn sample_records(&self, name: &str, limit: usize) -> anyhow::Result<Vec<crate::model::AttributeMap>> {
                Ok(self.0.get(name).cloned().unwrap_or_default().into_iter().take(limit).collect())
            }
            async fn all_records(&self, name: &str) -> anyhow::Result<Vec<crate::model::AttributeMap>> {
                Ok(self.0.get(name).cloned().unwrap_or_default())
            }
        }
        struct NoopDecoder;
        impl CrdtDecoder for NoopDecoder {
            fn decode(&self, _blob: &Value) -> anyhow::Result<String> {
                Ok(String::new())
            }
        }

        let mut stores = HashMap::new();
        stores.insert(
            "teams".to_string(),
            vec![serde_json::json!({"id": "T1", "key": "ENG", "name": "Engineering"}).as_object().unwrap().clone()],
        );
        let loader = SnapshotLoader::new(Arc::new(FakeDb(stores)), Arc::new(NoopDecoder), Option::<ScopeConfig>::None);
        let cache = Arc::new(CachedSnapshot::new(loader));
        // Port 0 refuses immediately instead of hanging out to the real timeout.
        let remote = Arc::new(RemoteSession::new(crate::remote::RemoteConfig {
            url: "http://127.0.0.1:0/mcp".to_string(),
            read_timeout_seconds: 1,
            ..crate::remote::RemoteConfig::default()
        }));
        let router = Router::new(cache, remote);

        let before = router.call_read("list_teams", serde_json::json!({})).await;
        assert!(before.is_ok(), "local dispatch should serve the read before any window opens");

        router.open_coherence_window().await;
        let during = router.call_read("list_teams", serde_json::json!({})).await;
        assert!(
            during.is_err(),
            "with the window open the read must be routed to the (unreachable, in this test) remote session instead of local dispatch"
        );
    }
}
