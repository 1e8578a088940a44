use serde_json::json;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;

pub fn handle(app: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let route_file = match super::load_route_file(app) {
        Ok(route_file) => route_file,
        Err(e) => {
            // Text mode leaves reporting to the binary's error path
            if matches!(output_format, OutputFormat::Json) {
                output_error(&output_format, &format!("{:#}", e), Some("CONFIG_INVALID"))?;
            }
            return Err(e);
        }
    };

    let routes = &route_file.routes;
    let protected = routes.rules().iter().filter(|r| r.requires_auth).count();
    let jwt_secret_set = !app.security.jwt_secret.is_empty();

    let mut message = format!(
        "{} is valid: {} routes ({} protected), {} services with secrets",
        app.gateway_file.display(),
        routes.len(),
        protected,
        route_file.secrets.len()
    );
    if !jwt_secret_set {
        message.push_str("; JWT_SECRET is not set, serve will refuse to start");
    }

    output_success(
        &output_format,
        &message,
        Some(json!({
            "file": app.gateway_file.display().to_string(),
            "routes": routes.len(),
            "protected_routes": protected,
            "services_with_secrets": route_file.secrets.len(),
            "jwt_secret_set": jwt_secret_set,
        })),
    )
}
