use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};

use super::file::{ConfigError, GatewayFile};
use super::{AppConfig, SecurityConfig};
use crate::auth::CredentialValidator;
use crate::gateway::route_table::RouteTable;

/// Everything a request needs from configuration, frozen at load time.
#[derive(Debug)]
pub struct ConfigSnapshot {
    pub routes: RouteTable,
    pub credentials: CredentialValidator,
    pub version: u64,
    pub loaded_at: DateTime<Utc>,
}

impl ConfigSnapshot {
    pub fn build<F>(file: &GatewayFile, security: &SecurityConfig, secret_lookup: F, version: u64) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if security.jwt_secret.is_empty() {
            return Err(ConfigError::MissingJwtSecret);
        }

        let routes = file.route_table()?;
        let secrets = file.secret_table(secret_lookup);

        for rule in routes.rules() {
            if rule.requires_auth && !secrets.contains(&rule.service) {
                tracing::warn!(
                    route = %rule.pattern,
                    service = %rule.service,
                    "Protected route has no service secret; only user tokens will be accepted"
                );
            }
        }

        Ok(Self {
            routes,
            credentials: CredentialValidator::new(&security.jwt_secret, security.jwt_leeway_secs, secrets),
            version,
            loaded_at: Utc::now(),
        })
    }
}

/// Current configuration snapshot behind an atomic pointer.
///
/// Readers take an `Arc` once per request; reloads swap in a whole new
/// snapshot and never mutate the one in use.
pub struct ConfigStore {
    current: ArcSwap<ConfigSnapshot>,
    source: Option<PathBuf>,
    security: SecurityConfig,
}

impl ConfigStore {
    /// Store without a file source; `reload` will fail with `NoSource`.
    pub fn from_snapshot(snapshot: ConfigSnapshot, security: SecurityConfig) -> Self {
        Self {
            current: ArcSwap::from_pointee(snapshot),
            source: None,
            security,
        }
    }

    /// Initial load from `app.gateway_file`.
    pub fn load(app: &AppConfig) -> Result<Self, ConfigError> {
        let file = GatewayFile::from_path(&app.gateway_file)?;
        let snapshot = ConfigSnapshot::build(&file, &app.security, |key| std::env::var(key).ok(), 1)?;

        tracing::info!(
            path = %app.gateway_file.display(),
            routes = snapshot.routes.len(),
            services_with_secrets = snapshot.credentials.secrets().len(),
            "Gateway configuration loaded"
        );

        Ok(Self {
            current: ArcSwap::from_pointee(snapshot),
            source: Some(app.gateway_file.clone()),
            security: app.security.clone(),
        })
    }

    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.current.load_full()
    }

    /// Install a new snapshot; in-flight requests keep the one they loaded.
    pub fn install(&self, snapshot: ConfigSnapshot) -> Arc<ConfigSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.current.store(Arc::clone(&snapshot));
        snapshot
    }

    /// Re-read the source file. On error the active snapshot is left untouched.
    pub fn reload(&self) -> Result<Arc<ConfigSnapshot>, ConfigError> {
        let path = self.source.as_ref().ok_or(ConfigError::NoSource)?;
        let file = GatewayFile::from_path(path)?;
        let next_version = self.current.load().version + 1;
        let snapshot = ConfigSnapshot::build(&file, &self.security, |key| std::env::var(key).ok(), next_version)?;

        let installed = self.install(snapshot);
        tracing::info!(
            version = installed.version,
            routes = installed.routes.len(),
            "Gateway configuration reloaded"
        );
        Ok(installed)
    }
}
