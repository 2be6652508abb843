//! Origin classification and CORS header computation.
//!
//! # Responsibilities
//! - Classify the `Origin` header as unknown, allowed or disallowed
//! - Compute the CORS header set for a request
//! - Provide the wildcard fallback when computation fails
//!
//! # Design Decisions
//! - A missing or empty `Origin` is unknown, not disallowed
//! - Malformed origins (including `null`) are disallowed
//! - Patterns are plain `scheme://host[:port]` with `*.` host and `*` port
//!   wildcards; no regex

use std::fmt;
use std::str::FromStr;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request},
};
use url::Url;

use crate::config::CorsConfig;
use crate::security::PolicyError;

/// Origin rules consumed by the gateway entry point.
pub trait OriginPolicy: Send + Sync {
    /// True when the request declares an origin that must be rejected.
    fn is_disallowed_origin(&self, req: &Request<Body>) -> bool;

    /// CORS headers to attach to every non-rejected response.
    fn cors_headers(&self, req: &Request<Body>) -> Result<HeaderMap, PolicyError>;
}

/// Permissive header set used when [`OriginPolicy::cors_headers`] fails.
pub fn wildcard_cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers
}

/// Compute CORS headers, falling back to the wildcard set on error.
pub fn cors_headers_or_wildcard(policy: &dyn OriginPolicy, req: &Request<Body>) -> HeaderMap {
    policy.cors_headers(req).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "CORS header computation failed, using wildcard");
        wildcard_cors_headers()
    })
}

/// How a request's declared origin relates to the allow list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginClass {
    Unknown,
    Allowed,
    Disallowed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
    Exact(String),
    /// `*.suffix`: one or more labels in front of `suffix`.
    Subdomains(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortPattern {
    /// No explicit port (or the scheme's default).
    Default,
    Any,
    Exact(u16),
}

/// One entry of an origin allow list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPattern {
    /// `*`: every well-formed origin.
    Any,
    Origin {
        scheme: String,
        host: HostPattern,
        port: PortPattern,
    },
}

impl FromStr for OriginPattern {
    type Err = PolicyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| PolicyError::InvalidOriginPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        let raw = raw.trim();
        if raw == "*" {
            return Ok(OriginPattern::Any);
        }

        let (scheme, rest) = raw.split_once("://").ok_or_else(|| invalid("missing scheme"))?;
        if scheme.is_empty()
            || !scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            return Err(invalid("invalid scheme"));
        }
        if rest.contains(['/', '?', '#', '@']) {
            return Err(invalid("origin patterns cannot carry a path, query or credentials"));
        }

        let (host, port) = match rest.find(']') {
            Some(end) => (&rest[..=end], rest[end + 1..].strip_prefix(':')),
            None => match rest.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (rest, None),
            },
        };

        let port = match port {
            None => PortPattern::Default,
            Some("*") => PortPattern::Any,
            Some(p) => PortPattern::Exact(p.parse().map_err(|_| invalid("invalid port"))?),
        };

        let lowered = host.to_ascii_lowercase();
        let host = match lowered.strip_prefix("*.") {
            Some(suffix) if !suffix.is_empty() && !suffix.contains('*') => {
                HostPattern::Subdomains(suffix.to_string())
            }
            Some(_) => return Err(invalid("invalid wildcard host")),
            None if lowered.is_empty() => return Err(invalid("missing host")),
            None if lowered.contains('*') => {
                return Err(invalid("wildcards are only allowed as a leading `*.`"))
            }
            None => HostPattern::Exact(lowered.clone()),
        };

        Ok(OriginPattern::Origin {
            scheme: scheme.to_ascii_lowercase(),
            host,
            port,
        })
    }
}

impl fmt::Display for OriginPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginPattern::Any => f.write_str("*"),
            OriginPattern::Origin { scheme, host, port } => {
                write!(f, "{scheme}://")?;
                match host {
                    HostPattern::Exact(h) => f.write_str(h)?,
                    HostPattern::Subdomains(s) => write!(f, "*.{s}")?,
                }
                match port {
                    PortPattern::Default => Ok(()),
                    PortPattern::Any => f.write_str(":*"),
                    PortPattern::Exact(p) => write!(f, ":{p}"),
                }
            }
        }
    }
}

/// A parsed `Origin` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedOrigin {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl ParsedOrigin {
    fn parse(origin: &str) -> Option<Self> {
        let url = Url::parse(origin).ok()?;
        let bare = matches!(url.path(), "" | "/")
            && url.query().is_none()
            && url.fragment().is_none()
            && url.username().is_empty()
            && url.password().is_none();
        if !bare {
            return None;
        }

        Some(Self {
            scheme: url.scheme().to_string(),
            host: url.host_str()?.to_ascii_lowercase(),
            port: url.port(),
        })
    }
}

impl OriginPattern {
    fn matches(&self, origin: &ParsedOrigin) -> bool {
        match self {
            OriginPattern::Any => true,
            OriginPattern::Origin { scheme, host, port } => {
                let host_ok = match host {
                    HostPattern::Exact(h) => origin.host == *h,
                    HostPattern::Subdomains(suffix) => origin
                        .host
                        .strip_suffix(suffix.as_str())
                        .and_then(|prefix| prefix.strip_suffix('.'))
                        .is_some_and(|labels| !labels.is_empty()),
                };
                let port_ok = match port {
                    PortPattern::Default => origin.port.is_none(),
                    PortPattern::Any => true,
                    PortPattern::Exact(p) => origin.port == Some(*p),
                };
                origin.scheme == *scheme && host_ok && port_ok
            }
        }
    }
}

/// Parse a list of patterns, reporting the first invalid one.
pub fn parse_patterns<S: AsRef<str>>(raw: &[S]) -> Result<Vec<OriginPattern>, PolicyError> {
    raw.iter().map(|p| p.as_ref().parse()).collect()
}

/// True when `origin` is well-formed and matches one of `patterns`.
pub fn origin_matches(patterns: &[OriginPattern], origin: &str) -> bool {
    ParsedOrigin::parse(origin).is_some_and(|parsed| patterns.iter().any(|p| p.matches(&parsed)))
}

/// Declared `Origin` of a request. Empty values count as absent.
pub fn request_origin(req: &Request<Body>) -> Option<&HeaderValue> {
    req.headers().get(header::ORIGIN).filter(|v| !v.is_empty())
}

/// Config-driven origin policy.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed: Vec<OriginPattern>,
    fallback_origin: HeaderValue,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    max_age: HeaderValue,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Result<Self, PolicyError> {
        let allowed = parse_patterns(&config.allowed_origins)?;

        let fallback_origin = header_value("fallback_origin", &config.fallback_origin)?;

        for method in &config.allowed_methods {
            Method::from_bytes(method.as_bytes())
                .map_err(|_| PolicyError::InvalidMethod(method.clone()))?;
        }
        for name in &config.allowed_headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| PolicyError::InvalidHeaderName(name.clone()))?;
        }

        Ok(Self {
            allowed,
            fallback_origin,
            allow_methods: header_value("allowed_methods", &config.allowed_methods.join(", "))?,
            allow_headers: header_value("allowed_headers", &config.allowed_headers.join(", "))?,
            max_age: HeaderValue::from(config.max_age_secs),
        })
    }

    pub fn classify(&self, req: &Request<Body>) -> OriginClass {
        let Some(origin) = request_origin(req) else {
            return OriginClass::Unknown;
        };
        match origin.to_str() {
            Ok(origin) if origin_matches(&self.allowed, origin) => OriginClass::Allowed,
            _ => OriginClass::Disallowed,
        }
    }
}

impl OriginPolicy for CorsPolicy {
    fn is_disallowed_origin(&self, req: &Request<Body>) -> bool {
        self.classify(req) == OriginClass::Disallowed
    }

    fn cors_headers(&self, req: &Request<Body>) -> Result<HeaderMap, PolicyError> {
        let allow_origin = match (self.classify(req), request_origin(req)) {
            (OriginClass::Allowed, Some(origin)) => origin.clone(),
            _ => self.fallback_origin.clone(),
        };

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        Ok(headers)
    }
}

fn header_value(field: &'static str, value: &str) -> Result<HeaderValue, PolicyError> {
    HeaderValue::from_str(value).map_err(|_| PolicyError::InvalidHeaderValue {
        field,
        value: value.to_string(),
    })
}
