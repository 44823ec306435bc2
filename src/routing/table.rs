//! Route matching and prefix rewriting.
//!
//! # Responsibilities
//! - Match path prefix (case-sensitive) and method
//! - Rewrite the matched prefix to the upstream prefix
//! - Preserve the path remainder and query string byte-for-byte
//!
//! # Design Decisions
//! - Rules evaluated in declaration order; first match wins
//! - No regex to guarantee O(n) matching
//! - Compiled at startup, immutable at runtime

use axum::http::Method;

use crate::config::schema::{RelayKind, RouteConfig};

/// A compiled route rule.
#[derive(Debug, Clone)]
pub struct RouteRule {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Inbound path prefix to match.
    pub path_prefix: String,

    /// Replacement prefix on the upstream side.
    pub upstream_prefix: String,

    /// Allowed methods. Empty means any method.
    pub methods: Vec<Method>,

    /// Body relay kind for this route.
    pub relay: RelayKind,
}

impl RouteRule {
    fn matches(&self, method: &Method, path: &str) -> bool {
        if !path.starts_with(&self.path_prefix) {
            return false;
        }
        self.methods.is_empty() || self.methods.contains(method)
    }
}

/// Result of a successful route lookup.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    /// The rule that matched.
    pub rule: &'a RouteRule,

    /// Rewritten path plus original query string, ready to append to the
    /// upstream base URL.
    pub target: String,
}

/// Ordered, immutable collection of route rules.
#[derive(Debug)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// Compile route rules from configuration.
    ///
    /// Methods that fail to parse are dropped from the rule with a warning
    /// rather than failing startup.
    pub fn from_config(routes: &[RouteConfig]) -> Self {
        let rules = routes
            .iter()
            .map(|route| {
                let methods = route
                    .methods
                    .iter()
                    .filter_map(|m| match m.to_uppercase().parse::<Method>() {
                        Ok(method) => Some(method),
                        Err(_) => {
                            tracing::warn!(
                                route = %route.name,
                                method = %m,
                                "Dropping unparseable method from route"
                            );
                            None
                        }
                    })
                    .collect();

                RouteRule {
                    name: route.name.clone(),
                    path_prefix: route.path_prefix.clone(),
                    upstream_prefix: route.upstream_prefix.clone(),
                    methods,
                    relay: route.relay,
                }
            })
            .collect();

        Self { rules }
    }

    /// Find the first rule matching (method, path) and rewrite the target.
    ///
    /// Rewriting strips the matched prefix, prepends the upstream prefix,
    /// and appends the original query string unmodified.
    pub fn match_request(
        &self,
        method: &Method,
        path: &str,
        query: Option<&str>,
    ) -> Option<RouteMatch<'_>> {
        let rule = self.rules.iter().find(|r| r.matches(method, path))?;

        let remainder = &path[rule.path_prefix.len()..];
        let mut target = String::with_capacity(
            rule.upstream_prefix.len() + remainder.len() + query.map_or(0, |q| q.len() + 1),
        );
        target.push_str(&rule.upstream_prefix);
        target.push_str(remainder);
        if let Some(q) = query {
            target.push('?');
            target.push_str(q);
        }

        Some(RouteMatch { rule, target })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::GatewayConfig;

    fn default_table() -> RouteTable {
        RouteTable::from_config(&GatewayConfig::default().routes)
    }

    #[test]
    fn map_route_rewrites_prefix_and_keeps_query() {
        let table = default_table();
        let m = table
            .match_request(&Method::GET, "/api/map/tree", Some("zoom=3&bbox=a%20b"))
            .unwrap();
        assert_eq!(m.rule.name, "map-data");
        assert_eq!(m.target, "/map/tree?zoom=3&bbox=a%20b");
    }

    #[test]
    fn map_route_without_query_has_no_question_mark() {
        let table = default_table();
        let m = table.match_request(&Method::GET, "/api/map/tree", None).unwrap();
        assert_eq!(m.target, "/map/tree");
    }

    #[test]
    fn first_match_wins_over_generic_rule() {
        let table = default_table();
        let m = table
            .match_request(&Method::POST, "/api/ai/image", None)
            .unwrap();
        assert_eq!(m.rule.name, "image-analysis");
        assert_eq!(m.rule.relay, RelayKind::Multipart);
        assert_eq!(m.target, "/ai/image");
    }

    #[test]
    fn method_mismatch_falls_through_to_generic_rule() {
        // POST /api/map/... is not allowed on the GET-only map rule, so the
        // generic rule picks it up and strips only "/api".
        let table = default_table();
        let m = table
            .match_request(&Method::POST, "/api/map/upload", None)
            .unwrap();
        assert_eq!(m.rule.name, "api");
        assert_eq!(m.target, "/map/upload");
    }

    #[test]
    fn generic_route_strips_api_prefix() {
        let table = default_table();
        let m = table
            .match_request(&Method::DELETE, "/api/records/7", Some("force=true"))
            .unwrap();
        assert_eq!(m.rule.name, "api");
        assert_eq!(m.target, "/records/7?force=true");
    }

    #[test]
    fn unmatched_path_returns_none() {
        let table = default_table();
        assert!(table.match_request(&Method::GET, "/static/app.js", None).is_none());
    }
}
