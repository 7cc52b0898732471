//! Process-wide service configuration.
//!
//! Read once at startup and shared read-only with every request handler.
//! [`ServiceConfig::from_lookup`] takes any key lookup so tests can build a
//! configuration without touching the process environment.
//!
//! ## Environment
//!
//! - `CORS_ALLOW_ORIGINS`: comma-separated origins or `*` (default `*`)
//! - `REMOTE_FETCH_ALLOWED`: JSON string, JSON array or bare regex (default: disabled)
//! - `REMOTE_CONTEXT_FETCH_WHITELIST`: JSON array of allowed context URLs (default: open)
//! - `BACKEND_ROOT_PATH`: prefix for every route (default: none)
//! - `SERVICE_NAME`: name reported by `GET /`
//! - `HOST` / `PORT`: bind address (default `0.0.0.0:8000`)

use tracing::{info, warn};

use crate::policy::{ContextFetchPolicy, FetchPolicy};
use crate::DEFAULT_SERVICE_NAME;

/// Startup configuration errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A fetch allow pattern does not compile.
    #[error("Invalid remote fetch pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// Pattern source.
        pattern: String,
        /// Compiler message.
        reason: String,
    },
    /// `REMOTE_FETCH_ALLOWED` holds JSON that is neither a string nor a list of strings.
    #[error("Unparseable REMOTE_FETCH_ALLOWED: {0}")]
    InvalidFetchSetting(String),
    /// `REMOTE_CONTEXT_FETCH_WHITELIST` is not a JSON list.
    #[error("Unparseable REMOTE_CONTEXT_FETCH_WHITELIST: {0}")]
    InvalidWhitelist(String),
    /// `PORT` is not a port number.
    #[error("Invalid PORT: {0}")]
    InvalidPort(String),
}

/// Allowed CORS origins.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CorsOrigins {
    /// Any origin (`*`).
    #[default]
    Any,
    /// Only these origins.
    List(Vec<String>),
}

impl CorsOrigins {
    /// Parse a comma-separated origin list. `*` anywhere means any origin.
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            Self::Any
        } else {
            Self::List(origins)
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Name reported by `GET /`.
    pub service_name: String,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Prefix for every route, normalized to `/segment` form.
    pub root_path: Option<String>,
    /// Allowed CORS origins.
    pub cors: CorsOrigins,
    /// Allow-list for document and context definition fetches.
    pub fetch_policy: FetchPolicy,
    /// Policy for JSON-LD contexts referenced by a context definition.
    pub context_fetch_policy: ContextFetchPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            root_path: None,
            cors: CorsOrigins::Any,
            fetch_policy: FetchPolicy::disabled(),
            context_fetch_policy: ContextFetchPolicy::Open,
        }
    }
}

impl ServiceConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration from an arbitrary key lookup.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT").filter(|p| !p.trim().is_empty()) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => defaults.port,
        };

        Ok(Self {
            service_name: lookup("SERVICE_NAME")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.service_name),
            host: lookup("HOST")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.host),
            port,
            root_path: lookup("BACKEND_ROOT_PATH").and_then(|raw| normalize_root_path(&raw)),
            cors: CorsOrigins::parse(
                &lookup("CORS_ALLOW_ORIGINS").unwrap_or_else(|| "*".to_string()),
            ),
            fetch_policy: FetchPolicy::from_setting(
                &lookup("REMOTE_FETCH_ALLOWED").unwrap_or_default(),
            )?,
            context_fetch_policy: ContextFetchPolicy::from_setting(
                lookup("REMOTE_CONTEXT_FETCH_WHITELIST").as_deref(),
            )?,
        })
    }

    /// Replace the fetch allow-list.
    pub fn with_fetch_policy(mut self, policy: FetchPolicy) -> Self {
        self.fetch_policy = policy;
        self
    }

    /// Replace the context fetch policy.
    pub fn with_context_fetch_policy(mut self, policy: ContextFetchPolicy) -> Self {
        self.context_fetch_policy = policy;
        self
    }

    /// Set the route prefix.
    pub fn with_root_path(mut self, root_path: &str) -> Self {
        self.root_path = normalize_root_path(root_path);
        self
    }

    /// Log the effective policies once at startup.
    pub fn log_summary(&self) {
        if self.fetch_policy.is_enabled() {
            info!(
                patterns = ?self.fetch_policy.patterns().collect::<Vec<_>>(),
                "Remote fetch allowed"
            );
        } else {
            info!("Remote fetch disabled");
        }

        match &self.context_fetch_policy {
            ContextFetchPolicy::Open => warn!("Remote context fetch allowed for any URL"),
            ContextFetchPolicy::Disabled => info!("Remote context fetch disabled"),
            ContextFetchPolicy::Whitelist(entries) => {
                info!(whitelist = ?entries, "Remote context fetch whitelist")
            }
        }

        match &self.cors {
            CorsOrigins::Any => info!(origins = "*", "Allowed CORS origins"),
            CorsOrigins::List(origins) => info!(origins = ?origins, "Allowed CORS origins"),
        }
    }
}

fn normalize_root_path(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("/{trimmed}"))
    }
}
