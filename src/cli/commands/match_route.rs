use std::sync::Arc;

use axum::http::Method;
use serde_json::json;

use super::routes::RouteSummary;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::gateway::{normalize_path, RouteRule, RouteTable};

/// Outcome of resolving one request against a route table
#[derive(Debug)]
pub enum MatchResult {
    Matched { normalized_path: String, rule: Arc<RouteRule> },
    Unroutable,
    NoRoute { normalized_path: String },
}

pub fn select(routes: &RouteTable, method: &str, path: &str) -> anyhow::Result<MatchResult> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| anyhow::anyhow!("invalid HTTP method '{}'", method))?;

    let Some(normalized_path) = normalize_path(path) else {
        return Ok(MatchResult::Unroutable);
    };

    Ok(match routes.resolve(&method, &normalized_path) {
        Some(rule) => MatchResult::Matched { normalized_path, rule },
        None => MatchResult::NoRoute { normalized_path },
    })
}

pub fn handle(app: &AppConfig, method: &str, path: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let route_file = super::load_route_file(app)?;

    match select(&route_file.routes, method, path)? {
        MatchResult::Matched { normalized_path, rule } => {
            let target = rule.upstream_url(&normalized_path, None);
            let summary = RouteSummary::from(rule.as_ref());
            output_success(
                &output_format,
                &format!(
                    "{} {} -> {} ({}) via '{}'",
                    method.to_ascii_uppercase(),
                    normalized_path,
                    target,
                    summary.service,
                    summary.pattern
                ),
                Some(json!({ "matched": true, "target": target.as_str(), "route": summary })),
            )
        }
        MatchResult::Unroutable => output_success(
            &output_format,
            &format!("{} contains a '..' segment or an encoded separator and is never routed", path),
            Some(json!({ "matched": false })),
        ),
        MatchResult::NoRoute { normalized_path } => output_success(
            &output_format,
            &format!("no route for {} {}", method.to_ascii_uppercase(), normalized_path),
            Some(json!({ "matched": false })),
        ),
    }
}
