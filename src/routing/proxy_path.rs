//! Proxy chaining path convention.
//!
//! `/proxy/<hostport>/<rest...>` asks this instance to forward the request to `<hostport>`
//! with `/<rest...>` as the new path. A chain `/proxy/a/proxy/b/x` is unrolled one hop per
//! instance: `a` receives `/proxy/b/x` and repeats the same parsing.

/// Reserved prefix that marks a proxy hop.
pub const PROXY_PREFIX: &str = "/proxy/";

/// One forwarding step extracted from a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyHop {
    pub target_host_port: String,
    pub remaining_path: String,
}

/// Split a request path into a hop, or `None` when it is not a proxy request.
pub fn parse_proxy_path(path: &str) -> Option<ProxyHop> {
    let rest = path.strip_prefix(PROXY_PREFIX)?;
    let (target, remaining) = match rest.split_once('/') {
        Some((target, remaining)) => (target, remaining),
        None => (rest, ""),
    };
    if target.is_empty() {
        return None;
    }

    Some(ProxyHop {
        target_host_port: target.to_string(),
        remaining_path: format!("/{}", remaining),
    })
}
