use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use axum::http::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::auth::SecretTable;
use crate::gateway::route_table::{RouteError, RoutePattern, RouteRule, RouteTable};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse gateway file: {0}")]
    Parse(String),

    #[error("route '{route}' references unknown service '{service}'")]
    UnknownService { route: String, service: String },

    #[error("service '{service}' has an invalid base_url: {reason}")]
    InvalidBaseUrl { service: String, reason: String },

    #[error("route '{route}' lists invalid method '{method}'")]
    InvalidMethod { route: String, method: String },

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("JWT_SECRET is not configured")]
    MissingJwtSecret,

    #[error("gateway has no file source to reload from")]
    NoSource,
}

/// On-disk route/secret definition (YAML, or JSON by extension)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayFile {
    #[serde(default)]
    pub services: BTreeMap<String, ServiceEntry>,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub base_url: String,
    /// Shared secret other services present to call this one
    #[serde(default, skip_serializing)]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEntry {
    pub path: String,
    pub service: String,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default = "default_requires_auth")]
    pub requires_auth: bool,
}

fn default_requires_auth() -> bool {
    true
}

impl GatewayFile {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate and build the route table.
    pub fn route_table(&self) -> Result<RouteTable, ConfigError> {
        let mut bases: BTreeMap<String, Url> = BTreeMap::new();
        for (name, service) in &self.services {
            bases.insert(name.to_ascii_lowercase(), parse_base_url(name, &service.base_url)?);
        }

        let mut rules = Vec::with_capacity(self.routes.len());
        for entry in &self.routes {
            let service = entry.service.to_ascii_lowercase();
            let upstream = bases
                .get(&service)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownService {
                    route: entry.path.clone(),
                    service: entry.service.clone(),
                })?;

            let methods = entry
                .methods
                .iter()
                .map(|m| parse_method(&entry.path, m))
                .collect::<Result<Vec<_>, _>>()?;

            rules.push(RouteRule {
                pattern: RoutePattern::parse(&entry.path)?,
                methods,
                service,
                upstream,
                requires_auth: entry.requires_auth,
            });
        }

        Ok(RouteTable::new(rules)?)
    }

    /// Collect service secrets; `SERVICE_SECRET_<NAME>` values from `lookup` override the file.
    pub fn secret_table<F>(&self, lookup: F) -> SecretTable
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut secrets = SecretTable::new();
        for (name, service) in &self.services {
            let from_env = lookup(&secret_env_key(name));
            let secret = from_env.or_else(|| service.secret.clone());
            match secret {
                Some(secret) if !secret.is_empty() => secrets.insert(name, secret),
                _ => {}
            }
        }
        secrets
    }
}

/// `exam-service` -> `SERVICE_SECRET_EXAM_SERVICE`
pub fn secret_env_key(service: &str) -> String {
    let name: String = service
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("SERVICE_SECRET_{}", name)
}

fn parse_base_url(service: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidBaseUrl {
        service: service.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidBaseUrl {
            service: service.to_string(),
            reason: "expected an absolute http(s) URL".to_string(),
        });
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidBaseUrl {
            service: service.to_string(),
            reason: "base_url must not carry a query or fragment".to_string(),
        });
    }

    Ok(url)
}

fn parse_method(route: &str, raw: &str) -> Result<Method, ConfigError> {
    let upper = raw.trim().to_ascii_uppercase();
    let invalid = || ConfigError::InvalidMethod {
        route: route.to_string(),
        method: raw.to_string(),
    };

    match upper.as_str() {
        "GET" | "POST" | "PUT" | "PATCH" | "DELETE" | "HEAD" | "OPTIONS" => {
            Method::from_bytes(upper.as_bytes()).map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}
