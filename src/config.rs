//! Environment-based configuration — single source of truth for all env
//! vars this crate reads. `EnvConfig::load()` is the only place `std::env`
//! is touched outside of tests.

use crate::remote::RemoteConfig;
use crate::snapshot::scope::ScopeConfig;
use std::collections::HashMap;
use tracing::{debug, info, warn};

const DEFAULT_OFFICIAL_MCP_URL: &str = "https://mcp.linear.app/mcp";
const DEFAULT_COHERENCE_WINDOW_SECONDS: u64 = 30;
const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

fn read_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_csv(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

fn read_list(plural: &str, singular: &str) -> Vec<String> {
    if let Some(v) = read_var(plural) {
        return parse_csv(&v);
    }
    read_var(singular).into_iter().collect()
}

fn parse_u64_env(name: &str, default: u64) -> u64 {
    match read_var(name) {
        Some(v) => v.parse().unwrap_or_else(|_| {
            warn!(var = name, value = %v, "not a valid integer, using default");
            default
        }),
        None => default,
    }
}

/// Who this workspace's fast path is scoped to, if anyone. Matching either
/// list enables the account-scope filter in [`crate::snapshot::scope`].
#[derive(Debug, Clone, Default)]
pub struct FastAccountScope {
    pub emails: Vec<String>,
    pub user_account_ids: Vec<String>,
}

impl FastAccountScope {
    fn from_env() -> Self {
        FastAccountScope {
            emails: read_list("LINEAR_FAST_ACCOUNT_EMAILS", "LINEAR_FAST_ACCOUNT_EMAIL"),
            user_account_ids: read_list("LINEAR_FAST_USER_ACCOUNT_IDS", "LINEAR_FAST_USER_ACCOUNT_ID"),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.emails.is_empty() || !self.user_account_ids.is_empty()
    }

    pub fn into_scope_config(self) -> Option<ScopeConfig> {
        if self.is_enabled() {
            Some(ScopeConfig { emails: self.emails, user_account_ids: self.user_account_ids })
        } else {
            None
        }
    }
}

fn parse_headers(raw: &str) -> HashMap<String, String> {
    match serde_json::from_str::<HashMap<String, String>>(raw) {
        Ok(map) => map,
        Err(e) => {
            warn!(error = %e, "LINEAR_OFFICIAL_MCP_HEADERS is not a JSON object of strings, ignoring");
            HashMap::new()
        }
    }
}

#[derive(Debug)]
pub struct ConfigValidation {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ConfigValidation {
    fn new() -> Self {
        ConfigValidation { warnings: Vec::new(), errors: Vec::new() }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn report(&self) -> String {
        let mut lines = Vec::new();
        if !self.errors.is_empty() {
            lines.push("Errors:".to_string());
            lines.extend(self.errors.iter().map(|e| format!("  - {e}")));
        }
        if !self.warnings.is_empty() {
            lines.push("Warnings:".to_string());
            lines.extend(self.warnings.iter().map(|w| format!("  - {w}")));
        }
        if lines.is_empty() {
            "Configuration OK".to_string()
        } else {
            lines.join("\n")
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub official_mcp_url: String,
    pub official_mcp_headers: HashMap<String, String>,
    pub fast_account_scope: FastAccountScope,
    pub db_path: Option<String>,
    pub blob_path: Option<String>,
    pub coherence_window_seconds: u64,
    pub cache_ttl_seconds: u64,
}

impl EnvConfig {
    /// Loads `~/.config/linear-fast/.env` (if present) then reads every
    /// `LINEAR_*` variable. Never reads a `.env` from the current directory —
    /// a workspace under query shouldn't be able to override its own headers.
    pub fn load() -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            let env_path = config_dir.join("linear-fast").join(".env");
            if let Err(e) = dotenvy::from_path(&env_path) {
                debug!(path = %env_path.display(), error = %e, "no global .env loaded");
            }
        }

        info!("loading environment configuration");
        let config = EnvConfig {
            official_mcp_url: read_var("LINEAR_OFFICIAL_MCP_URL").unwrap_or_else(|| DEFAULT_OFFICIAL_MCP_URL.to_string()),
            official_mcp_headers: read_var("LINEAR_OFFICIAL_MCP_HEADERS").map(|v| parse_headers(&v)).unwrap_or_default(),
            fast_account_scope: FastAccountScope::from_env(),
            db_path: read_var("LINEAR_FAST_DB_PATH"),
            blob_path: read_var("LINEAR_FAST_BLOB_PATH"),
            coherence_window_seconds: parse_u64_env("LINEAR_FAST_COHERENCE_WINDOW_SECONDS", DEFAULT_COHERENCE_WINDOW_SECONDS),
            cache_ttl_seconds: parse_u64_env("LINEAR_FAST_CACHE_TTL_SECONDS", DEFAULT_CACHE_TTL_SECONDS),
        };
        if config.fast_account_scope.is_enabled() {
            debug!(
                emails = config.fast_account_scope.emails.len(),
                ids = config.fast_account_scope.user_account_ids.len(),
                "account scope filter enabled"
            );
        }
        config
    }

    pub fn validate(&self) -> ConfigValidation {
        let mut validation = ConfigValidation::new();
        if url::Url::parse(&self.official_mcp_url).is_err() {
            validation.errors.push(format!("LINEAR_OFFICIAL_MCP_URL is not a valid URL: {}", self.official_mcp_url));
        }
        if self.db_path.is_none() {
            validation.warnings.push("LINEAR_FAST_DB_PATH not set; the object-store database location must be supplied by the embedding application".to_string());
        }
        if self.coherence_window_seconds == 0 {
            validation.warnings.push("LINEAR_FAST_COHERENCE_WINDOW_SECONDS=0 disables the post-write coherence window".to_string());
        }
        validation
    }

    pub fn remote_config(&self) -> RemoteConfig {
        RemoteConfig {
            url: self.official_mcp_url.clone(),
            headers: self.official_mcp_headers.clone(),
            ..RemoteConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_list_prefers_plural_csv() {
        assert_eq!(parse_csv("a@x.com, b@x.com ,"), vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn parse_headers_rejects_non_object_json() {
        assert!(parse_headers("not json").is_empty());
        assert!(parse_headers("[1,2,3]").is_empty());
        let ok = parse_headers(r#"{"Authorization":"Bearer abc"}"#);
        assert_eq!(ok.get("Authorization").unwrap(), "Bearer abc");
    }

    #[test]
    fn disabled_scope_has_no_config() {
        let scope = FastAccountScope::default();
        assert!(!scope.is_enabled());
        assert!(scope.into_scope_config().is_none());
    }
}
