//! Traffic log filtering.
//!
//! # Responsibilities
//! - Match the request method against a regex
//! - Match the request path (without query) against a regex
//! - Combine configured conditions with AND semantics
//!
//! # Design Decisions
//! - No condition configured = log everything
//! - Regexes are unanchored; anchor them explicitly (`^/health`) for prefix matches

use axum::body::Body;
use axum::http::Request;
use regex::Regex;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Request<Body>) -> bool;
}

/// Matches the request method.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    pattern: Regex,
}

impl MethodMatcher {
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        self.pattern.is_match(req.method().as_str())
    }
}

/// Matches the request path.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pattern: Regex,
}

impl PathMatcher {
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }
}

impl Matcher for PathMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        self.pattern.is_match(req.uri().path())
    }
}

/// Decides which requests reach the traffic log.
#[derive(Debug, Default)]
pub struct LogFilter {
    matchers: Vec<Box<dyn Matcher>>,
}

impl LogFilter {
    /// Build a filter from optional method and path regexes.
    pub fn from_patterns(method: Option<&str>, path: Option<&str>) -> Result<Self, regex::Error> {
        let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
        if let Some(method) = method {
            matchers.push(Box::new(MethodMatcher::new(Regex::new(method)?)));
        }
        if let Some(path) = path {
            matchers.push(Box::new(PathMatcher::new(Regex::new(path)?)));
        }
        Ok(Self { matchers })
    }

    /// A filter that lets every request through.
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn matches(&self, req: &Request<Body>) -> bool {
        self.matchers.iter().all(|m| m.matches(req))
    }
}
