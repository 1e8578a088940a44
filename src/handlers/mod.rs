pub mod health;
pub mod proxy;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderName, HeaderValue},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, ConfigStore, SecurityConfig};
use crate::gateway::{Dispatcher, HttpUpstream, UpstreamClient};
use crate::pipeline::Pipeline;

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConfigStore>,
    pub pipeline: Arc<Pipeline>,
    pub dispatcher: Arc<Dispatcher>,
    pub language_header: HeaderName,
}

impl AppState {
    /// State with the given upstream transport.
    pub fn new(app: &AppConfig, config: Arc<ConfigStore>, upstream: Arc<dyn UpstreamClient>) -> anyhow::Result<Self> {
        let language_header = HeaderName::from_bytes(app.language.header.to_ascii_lowercase().as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid language header name '{}': {}", app.language.header, e))?;

        let dispatcher = Dispatcher::new(
            upstream,
            Duration::from_secs(app.upstream.timeout_secs),
            language_header.clone(),
        );

        Ok(Self {
            config,
            pipeline: Arc::new(Pipeline::standard(app.language.clone())),
            dispatcher: Arc::new(dispatcher),
            language_header,
        })
    }

    /// State forwarding over pooled HTTP connections.
    pub fn with_http_upstream(app: &AppConfig, config: Arc<ConfigStore>) -> anyhow::Result<Self> {
        let upstream = HttpUpstream::new(&app.upstream)?;
        Self::new(app, config, Arc::new(upstream))
    }
}

pub fn router(state: AppState, security: &SecurityConfig) -> Router {
    let mut router = Router::new()
        // GET is served locally and skips the pipeline; other methods fall through to it
        .route("/", get(health::root).fallback(proxy::proxy))
        .route("/health", get(health::health).fallback(proxy::proxy))
        // Everything else goes through the pipeline
        .fallback(proxy::proxy)
        .with_state(state);

    if security.enable_cors {
        router = router.layer(cors_layer(&security.cors_origins));
    }
    if security.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
