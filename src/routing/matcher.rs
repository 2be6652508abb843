//! Path pattern matching.
//!
//! # Responsibilities
//! - Parse route patterns into literal and `{name}` parameter segments
//! - Match request paths segment by segment, binding parameters
//! - Refuse paths that still contain unresolved template placeholders
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A single trailing slash is ignored (`/a/b/` matches `/a/b`)
//! - Parameters bind exactly one non-empty segment
//! - No regex to guarantee O(segments) matching

use std::fmt;

use thiserror::Error;

/// Error raised when a route pattern cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern `{0}` must start with '/'")]
    MissingLeadingSlash(String),
    #[error("pattern `{0}` contains an empty segment")]
    EmptySegment(String),
    #[error("pattern `{pattern}` has a malformed placeholder in segment `{segment}`")]
    MalformedPlaceholder { pattern: String, segment: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// Parameters bound while matching a path, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A compiled route path such as `/api/seismology/v1/list-earthquakes`
/// or `/api/{domain}/v1/{rpc}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(pattern.to_string()));
        }

        let mut segments = Vec::new();
        for segment in split_segments(pattern) {
            if segment.is_empty() {
                return Err(PatternError::EmptySegment(pattern.to_string()));
            }

            let malformed = || PatternError::MalformedPlaceholder {
                pattern: pattern.to_string(),
                segment: segment.to_string(),
            };

            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => {
                    if name.is_empty() || name.contains(['{', '}']) {
                        return Err(malformed());
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None => {
                    if segment.contains(['{', '}']) {
                        return Err(malformed());
                    }
                    segments.push(Segment::Literal(segment.to_string()));
                }
            }
        }

        Ok(Self {
            raw: normalize(pattern).to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a request path, returning the bound parameters on success.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let mut params = Vec::new();
        let mut remaining = self.segments.iter();

        for segment in split_segments(path) {
            if is_unresolved_placeholder(segment) {
                return None;
            }
            match remaining.next()? {
                Segment::Literal(literal) => {
                    if literal != segment {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if segment.is_empty() {
                        return None;
                    }
                    params.push((name.clone(), segment.to_string()));
                }
            }
        }

        if remaining.next().is_some() {
            return None;
        }
        Some(PathParams(params))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn normalize(path: &str) -> &str {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    let normalized = normalize(path);
    let body = normalized.strip_prefix('/').unwrap_or(normalized);
    body.split('/').filter(move |_| !body.is_empty())
}

/// A segment that still looks like `{name}`, raw or percent-encoded.
fn is_unresolved_placeholder(segment: &str) -> bool {
    if segment.contains(['{', '}']) {
        return true;
    }
    let lower = segment.to_ascii_lowercase();
    lower.contains("%7b") || lower.contains("%7d")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_pattern() {
        let pattern = PathPattern::parse("/api/seismology/v1/list-earthquakes").unwrap();

        assert!(pattern.matches("/api/seismology/v1/list-earthquakes").is_some());
        assert!(pattern.matches("/api/seismology/v1/list-earthquakes/").is_some());
        assert!(pattern.matches("/api/seismology/v1/List-Earthquakes").is_none()); // Case sensitive
        assert!(pattern.matches("/api/seismology/v1").is_none());
        assert!(pattern.matches("/api/seismology/v1/list-earthquakes/extra").is_none());
    }

    #[test]
    fn test_param_binding() {
        let pattern = PathPattern::parse("/api/{domain}/v1/{rpc}").unwrap();

        let params = pattern.matches("/api/wildfire/v1/list-fire-detections").unwrap();
        assert_eq!(params.get("domain"), Some("wildfire"));
        assert_eq!(params.get("rpc"), Some("list-fire-detections"));
        assert_eq!(params.get("missing"), None);

        assert!(pattern.matches("/api//v1/list-fire-detections").is_none());
    }

    #[test]
    fn test_unresolved_placeholders_never_match() {
        let pattern = PathPattern::parse("/api/{domain}/v1/{rpc}").unwrap();
        assert!(pattern.matches("/api/{domain}/v1/list-earthquakes").is_none());
        assert!(pattern.matches("/api/seismology/v1/%7Brpc%7D").is_none());
        assert!(pattern.matches("/api/seismology/v1/%7brpc%7d").is_none());
    }

    #[test]
    fn test_root_pattern() {
        let root = PathPattern::parse("/").unwrap();
        assert!(root.matches("/").is_some());
        assert!(root.matches("/api").is_none());
        assert_eq!(root.as_str(), "/");
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(
            PathPattern::parse("api/x"),
            Err(PatternError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            PathPattern::parse("/api//x"),
            Err(PatternError::EmptySegment(_))
        ));
        assert!(matches!(
            PathPattern::parse("/api/{}"),
            Err(PatternError::MalformedPlaceholder { .. })
        ));
        assert!(matches!(
            PathPattern::parse("/api/v{1}x"),
            Err(PatternError::MalformedPlaceholder { .. })
        ));
    }
}
