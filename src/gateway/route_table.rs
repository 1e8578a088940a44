// Route table - immutable after load, shared read-only across requests.
//
// Pattern syntax:
//   /api/exams           exact segments
//   /api/exams/{id}      `{name}` matches exactly one segment
//   /api/exams/*         trailing `*` (or `{*rest}`) matches zero or more segments
//
// Literal segments compare ASCII-case-insensitively. When several rules match,
// the longest literal prefix wins, then the rule with more literal segments,
// then a rule without a catch-all, then declaration order.

use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route pattern '{0}' must start with '/'")]
    MissingLeadingSlash(String),

    #[error("route pattern '{pattern}': catch-all is only allowed as the last segment")]
    MisplacedCatchAll { pattern: String },

    #[error("route pattern '{pattern}': invalid segment '{segment}'")]
    InvalidSegment { pattern: String, segment: String },

    #[error("routes '{first}' and '{second}' overlap on the same methods")]
    AmbiguousRoute { first: String, second: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

/// Parsed `matchPath`
#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
    catch_all: bool,
}

impl RoutePattern {
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        if !raw.starts_with('/') {
            return Err(RouteError::MissingLeadingSlash(raw.to_string()));
        }

        let parts: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(parts.len());
        let mut catch_all = false;

        for (idx, part) in parts.iter().enumerate() {
            let is_last = idx + 1 == parts.len();

            if *part == "*" || (part.starts_with("{*") && part.ends_with('}')) {
                if !is_last {
                    return Err(RouteError::MisplacedCatchAll { pattern: raw.to_string() });
                }
                catch_all = true;
                continue;
            }

            if part.starts_with('{') && part.ends_with('}') && part.len() > 2 {
                segments.push(Segment::Param);
                continue;
            }

            if part.contains(['*', '{', '}', '?', '#']) || *part == "." || *part == ".." {
                return Err(RouteError::InvalidSegment {
                    pattern: raw.to_string(),
                    segment: part.to_string(),
                });
            }

            segments.push(Segment::Literal(part.to_ascii_lowercase()));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
            catch_all,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_catch_all(&self) -> bool {
        self.catch_all
    }

    /// Length of the literal text before the first placeholder, e.g. 10 for `/api/exams/*`
    pub fn literal_prefix_len(&self) -> usize {
        self.segments
            .iter()
            .take_while(|s| matches!(s, Segment::Literal(_)))
            .map(|s| match s {
                Segment::Literal(text) => text.len() + 1,
                Segment::Param => 0,
            })
            .sum()
    }

    fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    pub fn matches(&self, path_segments: &[&str]) -> bool {
        let length_ok = if self.catch_all {
            path_segments.len() >= self.segments.len()
        } else {
            path_segments.len() == self.segments.len()
        };

        length_ok
            && self
                .segments
                .iter()
                .zip(path_segments)
                .all(|(pattern, actual)| match pattern {
                    Segment::Literal(text) => text.eq_ignore_ascii_case(actual),
                    Segment::Param => !actual.is_empty(),
                })
    }

    /// Two patterns that accept exactly the same paths
    fn same_shape(&self, other: &RoutePattern) -> bool {
        self.catch_all == other.catch_all && self.segments == other.segments
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One configured mapping from an inbound path/method to an upstream service
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub pattern: RoutePattern,
    /// Empty means any method
    pub methods: Vec<Method>,
    pub service: String,
    pub upstream: Url,
    pub requires_auth: bool,
}

impl RouteRule {
    pub fn allows_method(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }

    fn methods_overlap(&self, other: &RouteRule) -> bool {
        self.methods.is_empty()
            || other.methods.is_empty()
            || self.methods.iter().any(|m| other.methods.contains(m))
    }

    /// Upstream URL for an already normalised path
    pub fn upstream_url(&self, normalized_path: &str, query: Option<&str>) -> Url {
        let mut url = self.upstream.clone();
        let base_path = self.upstream.path().trim_end_matches('/');
        url.set_path(&format!("{}{}", base_path, normalized_path));
        url.set_query(query);
        url
    }

    pub fn method_list(&self) -> String {
        if self.methods.is_empty() {
            "*".to_string()
        } else {
            self.methods
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(",")
        }
    }
}

/// Ordered, immutable set of route rules
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rules: Vec<Arc<RouteRule>>,
}

impl RouteTable {
    /// Build a table, rejecting rules that would match identical requests.
    pub fn new(rules: Vec<RouteRule>) -> Result<Self, RouteError> {
        for (i, first) in rules.iter().enumerate() {
            for second in &rules[i + 1..] {
                if first.pattern.same_shape(&second.pattern) && first.methods_overlap(second) {
                    return Err(RouteError::AmbiguousRoute {
                        first: first.pattern.to_string(),
                        second: second.pattern.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            rules: rules.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn rules(&self) -> &[Arc<RouteRule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Select the rule for `method` + normalised `path`.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<Arc<RouteRule>> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.allows_method(method) && rule.pattern.matches(&segments))
            .max_by_key(|(idx, rule)| {
                (
                    rule.pattern.literal_prefix_len(),
                    rule.pattern.literal_count(),
                    !rule.pattern.is_catch_all(),
                    std::cmp::Reverse(*idx),
                )
            })
            .map(|(_, rule)| Arc::clone(rule))
    }
}

/// Collapse duplicate slashes, drop `.` segments and a trailing slash.
///
/// Returns `None` when the path contains a `..` segment (plain or percent-encoded)
/// or a segment holding an encoded separator (`%2f`, `%5c`) or a backslash.
pub fn normalize_path(path: &str) -> Option<String> {
    let mut out = String::with_capacity(path.len());

    for segment in path.split('/') {
        let lowered = segment.to_ascii_lowercase();
        if lowered.contains("%2f") || lowered.contains("%5c") || lowered.contains('\\') {
            return None;
        }
        match lowered.as_str() {
            "" | "." | "%2e" => continue,
            ".." | "%2e%2e" | ".%2e" | "%2e." => return None,
            _ => {
                out.push('/');
                out.push_str(segment);
            }
        }
    }

    if out.is_empty() {
        out.push('/');
    }
    Some(out)
}
