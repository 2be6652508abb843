//! API key authorization.
//!
//! # Responsibilities
//! - Decide per request whether a key is required
//! - Validate a supplied key against the configured key set
//!
//! # Design Decisions
//! - A supplied key is always checked, whatever the origin
//! - Trusted browser origins may call without a key
//! - Key comparison is constant-time per key and never short-circuits

use axum::{
    body::Body,
    http::{HeaderName, Request},
};
use subtle::{Choice, ConstantTimeEq};

use crate::config::ApiKeyConfig;
use crate::security::origin::{origin_matches, parse_patterns, request_origin, OriginPattern};
use crate::security::PolicyError;

pub const KEY_REQUIRED_MESSAGE: &str = "API key required";
pub const KEY_INVALID_MESSAGE: &str = "Invalid API key";

/// Outcome of an API key check. `valid` is only meaningful when `required`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyCheckResult {
    pub required: bool,
    pub valid: bool,
    pub error: Option<String>,
}

impl KeyCheckResult {
    pub fn not_required() -> Self {
        Self::default()
    }

    pub fn accepted() -> Self {
        Self {
            required: true,
            valid: true,
            error: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            required: true,
            valid: false,
            error: Some(message.into()),
        }
    }

    /// True when the request must be turned away.
    pub fn is_rejected(&self) -> bool {
        self.required && !self.valid
    }
}

/// Key rules consumed by the gateway entry point.
pub trait ApiKeyGuard: Send + Sync {
    fn validate_api_key(&self, req: &Request<Body>) -> KeyCheckResult;
}

/// Config-driven key guard.
#[derive(Clone)]
pub struct KeyGuard {
    enabled: bool,
    header: HeaderName,
    keys: Vec<String>,
    keyless_origins: Vec<OriginPattern>,
}

impl KeyGuard {
    pub fn from_config(config: &ApiKeyConfig) -> Result<Self, PolicyError> {
        let header = HeaderName::from_bytes(config.header.as_bytes())
            .map_err(|_| PolicyError::InvalidHeaderName(config.header.clone()))?;

        let keys: Vec<String> = config
            .keys
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if config.enabled && keys.is_empty() {
            tracing::warn!("API key guard enabled with no keys; keyed requests will be rejected");
        }

        Ok(Self {
            enabled: config.enabled,
            header,
            keys,
            keyless_origins: parse_patterns(&config.keyless_origins)?,
        })
    }

    fn is_known_key(&self, candidate: &[u8]) -> bool {
        let found = self
            .keys
            .iter()
            .fold(Choice::from(0), |acc, key| acc | key.as_bytes().ct_eq(candidate));
        found.into()
    }

    fn is_keyless_origin(&self, req: &Request<Body>) -> bool {
        request_origin(req)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|origin| origin_matches(&self.keyless_origins, origin))
    }
}

impl ApiKeyGuard for KeyGuard {
    fn validate_api_key(&self, req: &Request<Body>) -> KeyCheckResult {
        if !self.enabled {
            return KeyCheckResult::not_required();
        }

        match req.headers().get(&self.header).filter(|v| !v.is_empty()) {
            Some(key) => {
                if self.is_known_key(key.as_bytes()) {
                    KeyCheckResult::accepted()
                } else {
                    KeyCheckResult::rejected(KEY_INVALID_MESSAGE)
                }
            }
            None if self.is_keyless_origin(req) => KeyCheckResult::not_required(),
            None => KeyCheckResult::rejected(KEY_REQUIRED_MESSAGE),
        }
    }
}

impl std::fmt::Debug for KeyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyGuard")
            .field("enabled", &self.enabled)
            .field("header", &self.header)
            .field("keys", &format_args!("[{} redacted]", self.keys.len()))
            .field("keyless_origins", &self.keyless_origins)
            .finish()
    }
}
