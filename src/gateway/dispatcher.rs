// Upstream dispatch
//
// Builds the upstream request from a classified context, forwards it with a
// bounded wait, and relays the upstream response (status, end-to-end headers,
// streamed body). No automatic retries.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    body::{Body, HttpBody},
    extract::ConnectInfo,
    http::{request::Parts, HeaderName, Request, Response},
};
use futures::TryStreamExt;
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::error::GatewayError;
use crate::gateway::headers::{forward_request_headers, strip_hop_by_hop, ForwardingHeaders};
use crate::gateway::route_table::RouteRule;
use crate::pipeline::context::{RequestContext, ResolvedIdentity};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("connection failed: {0}")]
    Unavailable(String),

    #[error("upstream timed out")]
    Timeout,
}

/// Transport used to reach upstream services.
///
/// Takes a request with an absolute URI and returns the raw upstream response.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn execute(&self, request: Request<Body>) -> Result<Response<Body>, UpstreamError>;
}

/// `reqwest`-backed transport with pooled keep-alive connections
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        // Responses are relayed byte for byte, so no transparent decompression
        // and no redirect following.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::none())
            .no_gzip()
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn execute(&self, request: Request<Body>) -> Result<Response<Body>, UpstreamError> {
        let (parts, body) = request.into_parts();

        let mut outbound = self
            .client
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers);

        if !body.is_end_stream() {
            outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let upstream = outbound.send().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout
            } else {
                UpstreamError::Unavailable(e.to_string())
            }
        })?;

        let status = upstream.status();
        let headers = upstream.headers().clone();
        let stream = upstream.bytes_stream().map_err(std::io::Error::other);

        let mut response = Response::new(Body::from_stream(stream));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

pub struct Dispatcher {
    upstream: Arc<dyn UpstreamClient>,
    timeout: Duration,
    language_header: HeaderName,
}

impl Dispatcher {
    pub fn new(upstream: Arc<dyn UpstreamClient>, timeout: Duration, language_header: HeaderName) -> Self {
        Self {
            upstream,
            timeout,
            language_header,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Upstream request for a context that passed the pipeline.
    pub fn build_request(&self, ctx: &RequestContext, parts: &Parts, body: Body) -> Result<Request<Body>, GatewayError> {
        let rule = dispatchable_route(ctx)?;
        let path = ctx
            .normalized_path
            .as_deref()
            .ok_or_else(|| GatewayError::Internal("request reached dispatch without a normalised path".to_string()))?;
        let language = ctx
            .normalized_language
            .as_deref()
            .ok_or_else(|| GatewayError::Internal("request reached dispatch without a language".to_string()))?;

        let url = rule.upstream_url(path, parts.uri.query());
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        let headers = forward_request_headers(
            &parts.headers,
            &ForwardingHeaders {
                language_header: &self.language_header,
                language,
                request_id: &ctx.request_id,
                peer,
                scheme: parts.uri.scheme_str().unwrap_or("http"),
            },
        );

        let mut request = Request::builder()
            .method(parts.method.clone())
            .uri(url.as_str())
            .body(body)
            .map_err(|e| GatewayError::Internal(format!("failed to build upstream request: {}", e)))?;
        *request.headers_mut() = headers;
        Ok(request)
    }

    /// Forward and relay. Connection failures become 502, an expired wait 504.
    pub async fn dispatch(&self, ctx: &RequestContext, parts: &Parts, body: Body) -> Result<Response<Body>, GatewayError> {
        let request = self.build_request(ctx, parts, body)?;
        let service = dispatchable_route(ctx)?.service.clone();
        let target = request.uri().to_string();
        let start = Instant::now();

        let result = tokio::time::timeout(self.timeout, self.upstream.execute(request)).await;

        let upstream = match result {
            Ok(Ok(response)) => response,
            Ok(Err(UpstreamError::Timeout)) | Err(_) => {
                tracing::error!(
                    request_id = %ctx.request_id,
                    service = %service,
                    target = %target,
                    timeout = ?self.timeout,
                    "Upstream did not respond in time"
                );
                return Err(GatewayError::UpstreamTimeout { service });
            }
            Ok(Err(UpstreamError::Unavailable(reason))) => {
                tracing::error!(
                    request_id = %ctx.request_id,
                    service = %service,
                    target = %target,
                    error = %reason,
                    "Failed to forward request to service"
                );
                return Err(GatewayError::UpstreamUnavailable { service, reason });
            }
        };

        tracing::debug!(
            request_id = %ctx.request_id,
            service = %service,
            target = %target,
            status = upstream.status().as_u16(),
            elapsed = ?start.elapsed(),
            "Upstream responded"
        );

        let (mut head, body) = upstream.into_parts();
        head.headers = strip_hop_by_hop(&head.headers);
        Ok(Response::from_parts(head, body))
    }
}

/// The route plus a check that the identity is one dispatch may act on.
fn dispatchable_route(ctx: &RequestContext) -> Result<&Arc<RouteRule>, GatewayError> {
    let rule = ctx
        .route
        .as_ref()
        .ok_or_else(|| GatewayError::Internal("request reached dispatch without a route".to_string()))?;

    match (&ctx.identity, rule.requires_auth) {
        (ResolvedIdentity::User(_), _) | (ResolvedIdentity::Service(_), _) => Ok(rule),
        (ResolvedIdentity::Anonymous, false) => Ok(rule),
        (ResolvedIdentity::Anonymous, true) => Err(GatewayError::Internal(
            "anonymous request reached dispatch on a protected route".to_string(),
        )),
        (ResolvedIdentity::Unclassified, _) => Err(GatewayError::Internal(
            "request reached dispatch unclassified".to_string(),
        )),
    }
}
