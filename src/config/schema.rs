//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::services::Domain;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Origin allow-list and CORS response headers.
    pub cors: CorsConfig,

    /// API key rules.
    pub api_keys: ApiKeyConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Domain services and their upstreams.
    pub services: Vec<ServiceConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for one upstream call, in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { upstream_secs: 15 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum RPC request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024, // 1MB
        }
    }
}

/// Origin allow-list and CORS header values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origin patterns (`scheme://host[:port]`, `*.` host and `*` port wildcards).
    pub allowed_origins: Vec<String>,

    /// `Access-Control-Allow-Origin` value for origins not on the list.
    pub fallback_origin: String,

    pub allowed_methods: Vec<String>,

    pub allowed_headers: Vec<String>,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

fn trusted_origins() -> Vec<String> {
    [
        "https://worldmonitor.app",
        "https://*.worldmonitor.app",
        "http://localhost:*",
        "https://localhost:*",
        "http://127.0.0.1:*",
        "https://127.0.0.1:*",
        "http://tauri.localhost:*",
        "https://tauri.localhost:*",
        "http://*.tauri.localhost:*",
        "https://*.tauri.localhost:*",
        "tauri://localhost",
        "asset://localhost",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: trusted_origins(),
            fallback_origin: "https://worldmonitor.app".to_string(),
            allowed_methods: vec!["GET".into(), "POST".into(), "OPTIONS".into()],
            allowed_headers: vec![
                "Content-Type".into(),
                "Authorization".into(),
                "X-WorldMonitor-Key".into(),
            ],
            max_age_secs: 86_400,
        }
    }
}

/// API key configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiKeyConfig {
    /// Enable the key guard.
    pub enabled: bool,

    /// Header carrying the key.
    pub header: String,

    /// Accepted keys. `WORLDMONITOR_VALID_KEYS` is appended at load time.
    pub keys: Vec<String>,

    /// Browser origins that may call without a key.
    pub keyless_origins: Vec<String>,
}

impl Default for ApiKeyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            header: "X-WorldMonitor-Key".to_string(),
            keys: Vec::new(),
            keyless_origins: [
                "https://worldmonitor.app",
                "https://*.worldmonitor.app",
                "http://localhost:*",
                "https://localhost:*",
                "http://127.0.0.1:*",
                "https://127.0.0.1:*",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl std::fmt::Debug for ApiKeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyConfig")
            .field("enabled", &self.enabled)
            .field("header", &self.header)
            .field("keys", &format_args!("[{} redacted]", self.keys.len()))
            .field("keyless_origins", &self.keyless_origins)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// One domain service backed by an upstream.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    pub domain: Domain,

    /// Base URL RPCs are forwarded to (`{upstream}/{rpc}`).
    pub upstream: String,

    /// RPC names to expose. Empty means the domain's known RPCs.
    #[serde(default)]
    pub rpcs: Vec<String>,
}
