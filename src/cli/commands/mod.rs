pub mod check;
pub mod match_route;
pub mod routes;
pub mod serve;

use anyhow::Context;

use crate::auth::SecretTable;
use crate::config::{AppConfig, ConfigError, GatewayFile};
use crate::gateway::RouteTable;

/// Route file contents as the read-only commands see them.
///
/// Built without a signing secret so a route file can be inspected offline.
pub(crate) struct RouteFile {
    pub routes: RouteTable,
    pub secrets: SecretTable,
}

impl RouteFile {
    pub fn from_file(file: &GatewayFile) -> Result<Self, ConfigError> {
        Ok(Self {
            routes: file.route_table()?,
            secrets: file.secret_table(|key| std::env::var(key).ok()),
        })
    }
}

/// Load and validate the route file with the same rules `serve` applies.
pub(crate) fn load_route_file(app: &AppConfig) -> anyhow::Result<RouteFile> {
    let file = GatewayFile::from_path(&app.gateway_file)
        .with_context(|| format!("failed to read gateway config {}", app.gateway_file.display()))?;

    RouteFile::from_file(&file).with_context(|| format!("invalid gateway config {}", app.gateway_file.display()))
}
