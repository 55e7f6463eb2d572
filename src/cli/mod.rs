//! Direct tool execution and inspection from the command line. This is a
//! debug harness for the query layer, not the outer RPC tool server an
//! embedding application exposes to a model — it wires a JSON-file object
//! store in place of the real one so `call`/`health`/`refresh-cache` work
//! against a fixture without a live sync database.

use crate::config::EnvConfig;
use crate::error::QueryError;
use crate::model::AttributeMap;
use crate::remote::RemoteSession;
use crate::router::Router;
use crate::snapshot::cache::CachedSnapshot;
use crate::snapshot::loader::SnapshotLoader;
use crate::snapshot::store::{CrdtDecoder, ObjectStoreDatabase};
use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "linear-fast", about = "Debug harness for the Linear fast query layer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Call a tool by name with a JSON argument object, e.g. `call get_issue '{"id":"DEV-1"}'`
    Call { tool: String, args: String },
    /// Force a cache reload regardless of TTL.
    RefreshCache,
    /// Print local + remote health as JSON.
    Health,
}

/// Reads a `{ "storeName": [record, ...] }` fixture file in place of a live
/// IndexedDB-family database.
struct JsonFileDatabase {
    stores: HashMap<String, Vec<AttributeMap>>,
}

impl JsonFileDatabase {
    /// Loads and parses the fixture; I/O and JSON failures surface as
    /// [`QueryError`] the way config loading does elsewhere in this crate.
    fn from_path(path: &str) -> crate::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| QueryError::Config(format!("reading db fixture at {path}: {e}")))?;
        let value: Value = serde_json::from_str(&raw)?;
        let object = value
            .as_object()
            .ok_or_else(|| QueryError::Config("db fixture must be a JSON object of storeName -> records".to_string()))?;
        let mut stores = HashMap::new();
        for (name, records) in object {
            let records = records
                .as_array()
                .ok_or_else(|| QueryError::Config(format!("store '{name}' must be a JSON array")))?
                .iter()
                .map(|r| r.as_object().cloned().unwrap_or_default())
                .collect();
            stores.insert(name.clone(), records);
        }
        Ok(JsonFileDatabase { stores })
    }
}

#[async_trait]
impl ObjectStoreDatabase for JsonFileDatabase {
    fn object_store_names(&self) -> Vec<String> {
        self.stores.keys().cloned().collect()
    }

    async fn sample_records(&self, store_name: &str, limit: usize) -> anyhow::Result<Vec<AttributeMap>> {
        Ok(self.stores.get(store_name).cloned().unwrap_or_default().into_iter().take(limit).collect())
    }

    async fn all_records(&self, store_name: &str) -> anyhow::Result<Vec<AttributeMap>> {
        Ok(self.stores.get(store_name).cloned().unwrap_or_default())
    }
}

/// A blob is treated as already-decoded content: strings pass through,
/// anything else is rendered for inspection. The real CRDT format is an
/// external concern this crate never implements.
struct PassthroughDecoder;

impl CrdtDecoder for PassthroughDecoder {
    fn decode(&self, blob: &Value) -> anyhow::Result<String> {
        match blob {
            Value::String(s) => Ok(s.clone()),
            Value::Null => Ok(String::new()),
            other => Ok(other.to_string()),
        }
    }
}

async fn build_router(config: &EnvConfig) -> Result<Router> {
    let db_path = config.db_path.as_deref().ok_or_else(|| {
        QueryError::Config("LINEAR_FAST_DB_PATH must point at a JSON object-store fixture for the CLI".to_string())
    })?;
    let db = Arc::new(JsonFileDatabase::from_path(db_path)?);
    let scope = config.fast_account_scope.clone().into_scope_config();
    let loader = SnapshotLoader::new(db, Arc::new(PassthroughDecoder), scope);
    let cache = Arc::new(CachedSnapshot::with_ttl(loader, std::time::Duration::from_secs(config.cache_ttl_seconds)));
    let remote = Arc::new(RemoteSession::new(config.remote_config()));
    Ok(Router::with_coherence_window(cache, remote, std::time::Duration::from_secs(config.coherence_window_seconds)))
}

pub async fn run_call(config: &EnvConfig, tool: String, args: String) -> Result<()> {
    let router = build_router(config).await?;
    let args: Value = serde_json::from_str(&args).context("args must be a JSON object")?;
    match router.call_read(&tool, args).await {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(e) => eprintln!("error: {e}"),
    }
    Ok(())
}

pub async fn run_refresh_cache(config: &EnvConfig) -> Result<()> {
    let router = build_router(config).await?;
    let health = router.refresh_local_cache().await;
    println!("{}", serde_json::to_string_pretty(&serde_json::json!({
        "degraded": health.degraded,
        "reason": health.reason,
        "failureCount": health.failure_count,
    }))?);
    Ok(())
}

pub async fn run_health(config: &EnvConfig) -> Result<()> {
    let router = build_router(config).await?;
    let health = router.get_health().await;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "local": {
                "degraded": health.local.degraded,
                "reason": health.local.reason,
                "failureCount": health.local.failure_count,
            },
            "remote": {
                "url": health.remote.url,
                "connected": health.remote.connected,
                "failureCount": health.remote.failure_count,
            },
            "coherenceWindowActive": health.coherence_window_active,
        }))?
    );
    Ok(())
}
