use serde::Serialize;
use serde_json::json;

use crate::cli::utils::{format_table, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::gateway::RouteRule;

/// One row of `routes` output
#[derive(Debug, Serialize)]
pub struct RouteSummary {
    pub pattern: String,
    pub methods: String,
    pub service: String,
    pub upstream: String,
    pub requires_auth: bool,
}

impl From<&RouteRule> for RouteSummary {
    fn from(rule: &RouteRule) -> Self {
        Self {
            pattern: rule.pattern.to_string(),
            methods: rule.method_list(),
            service: rule.service.clone(),
            upstream: rule.upstream.to_string(),
            requires_auth: rule.requires_auth,
        }
    }
}

impl RouteSummary {
    fn cells(&self) -> Vec<String> {
        vec![
            self.pattern.clone(),
            self.methods.clone(),
            self.service.clone(),
            self.upstream.clone(),
            if self.requires_auth { "required" } else { "public" }.to_string(),
        ]
    }
}

pub fn handle(app: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let route_file = super::load_route_file(app)?;
    let summaries: Vec<RouteSummary> = route_file.routes.rules().iter().map(|r| RouteSummary::from(r.as_ref())).collect();

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            &format!("{} routes", summaries.len()),
            Some(json!({ "routes": summaries })),
        ),
        OutputFormat::Text => {
            let rows: Vec<Vec<String>> = summaries.iter().map(RouteSummary::cells).collect();
            println!(
                "{}",
                format_table(&["PATTERN", "METHODS", "SERVICE", "UPSTREAM", "AUTH"], &rows)
            );
            Ok(())
        }
    }
}
