// Process settings come from the environment (APP_ENV picks a profile of
// defaults, individual variables override). Routes and service secrets come
// from the gateway file and are held as an immutable snapshot.

pub mod file;
pub mod store;

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub use file::{ConfigError, GatewayFile, RouteEntry, ServiceEntry};
pub use store::{ConfigSnapshot, ConfigStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub language: LanguageConfig,
    pub security: SecurityConfig,
    pub gateway_file: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Bounded wait for an upstream response before answering 504
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub pool_max_idle_per_host: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub header: String,
    pub default_language: String,
    pub supported: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing, default)]
    pub jwt_secret: String,
    pub jwt_leeway_secs: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub enable_request_logging: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("GATEWAY_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("GATEWAY_PORT").or_else(|| lookup("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Upstream overrides
        if let Some(v) = lookup("UPSTREAM_TIMEOUT_SECS") {
            self.upstream.timeout_secs = v.parse().unwrap_or(self.upstream.timeout_secs);
        }
        if let Some(v) = lookup("UPSTREAM_CONNECT_TIMEOUT_SECS") {
            self.upstream.connect_timeout_secs = v.parse().unwrap_or(self.upstream.connect_timeout_secs);
        }
        if let Some(v) = lookup("UPSTREAM_POOL_MAX_IDLE_PER_HOST") {
            self.upstream.pool_max_idle_per_host = v.parse().unwrap_or(self.upstream.pool_max_idle_per_host);
        }

        // Language overrides
        if let Some(v) = lookup("LANGUAGE_HEADER") {
            self.language.header = v;
        }
        if let Some(v) = lookup("DEFAULT_LANGUAGE") {
            self.language.default_language = v.trim().to_ascii_lowercase();
        }
        if let Some(v) = lookup("SUPPORTED_LANGUAGES") {
            self.language.supported = split_list(&v)
                .into_iter()
                .map(|s| s.to_ascii_lowercase())
                .collect();
        }

        // Security overrides
        if let Some(v) = lookup("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("JWT_LEEWAY_SECS") {
            self.security.jwt_leeway_secs = v.parse().unwrap_or(self.security.jwt_leeway_secs);
        }
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.security.enable_request_logging = v.parse().unwrap_or(self.security.enable_request_logging);
        }

        if let Some(v) = lookup("GATEWAY_CONFIG") {
            self.gateway_file = PathBuf::from(v);
        }

        self
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            upstream: UpstreamConfig {
                timeout_secs: 30,
                connect_timeout_secs: 5,
                pool_max_idle_per_host: 10,
            },
            language: LanguageConfig::default(),
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_leeway_secs: 30,
                enable_cors: true,
                cors_origins: vec!["*".to_string()],
                enable_request_logging: true,
            },
            gateway_file: PathBuf::from("gateway.yaml"),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            upstream: UpstreamConfig {
                timeout_secs: 30,
                connect_timeout_secs: 5,
                pool_max_idle_per_host: 20,
            },
            language: LanguageConfig::default(),
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_leeway_secs: 10,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                enable_request_logging: true,
            },
            gateway_file: PathBuf::from("gateway.yaml"),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            upstream: UpstreamConfig {
                timeout_secs: 20,
                connect_timeout_secs: 3,
                pool_max_idle_per_host: 50,
            },
            language: LanguageConfig::default(),
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_leeway_secs: 0,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                enable_request_logging: false,
            },
            gateway_file: PathBuf::from("/etc/exam-gateway/gateway.yaml"),
        }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            header: "X-Language".to_string(),
            default_language: "en".to_string(),
            supported: ["en", "hi", "ta", "gu"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
