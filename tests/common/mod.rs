#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use exam_gateway::auth::UserSessionClaim;
use exam_gateway::config::{AppConfig, ConfigSnapshot, ConfigStore, GatewayFile};
use exam_gateway::handlers::{self, AppState};

pub const JWT_SECRET: &str = "integration-signing-secret";
pub const EXAM_SECRET: &str = "exam-shared-secret";
pub const ADMIN_SECRET: &str = "admin-shared-secret";

/// Upstream that answers every request with a JSON description of what it received.
///
/// `x-echo-status` picks the response status, `x-echo-delay-ms` delays the reply.
pub struct EchoUpstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl EchoUpstream {
    pub async fn spawn() -> Result<Self> {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new().fallback(echo).with_state(Arc::clone(&hits));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind echo upstream")?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, hits })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn echo(State(hits): State<Arc<AtomicUsize>>, request: Request) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);

    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap_or_default();

    if let Some(ms) = header_u64(&parts.headers, "x-echo-delay-ms") {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
    let status = header_u64(&parts.headers, "x-echo-status")
        .and_then(|s| StatusCode::from_u16(s as u16).ok())
        .unwrap_or(StatusCode::OK);

    let headers: BTreeMap<String, String> = parts
        .headers
        .iter()
        .map(|(k, v)| (k.to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect();

    let payload = json!({
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "query": parts.uri.query(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    });

    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .header("x-upstream", "echo")
        .header("connection", "keep-alive")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.parse().ok()
}

/// An address nothing listens on
pub fn closed_addr() -> Result<SocketAddr> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Route file: auth and exam on the echo upstream, admin under a base path,
/// GET-only reports on `reports_base` (typically a closed port).
pub fn gateway_yaml(echo_base: &str, reports_base: &str) -> String {
    format!(
        r#"
services:
  auth:
    base_url: "{echo}"
  exam:
    base_url: "{echo}"
    secret: "{exam_secret}"
  admin:
    base_url: "{echo}/admin-svc"
    secret: "{admin_secret}"
  reports:
    base_url: "{reports}"
routes:
  - {{ path: "/api/auth/*", service: auth, requires_auth: false }}
  - {{ path: "/api/exams/*", service: exam }}
  - {{ path: "/api/admin/*", service: admin }}
  - {{ path: "/api/reports/*", service: reports, methods: [GET] }}
"#,
        echo = echo_base,
        reports = reports_base,
        exam_secret = EXAM_SECRET,
        admin_secret = ADMIN_SECRET,
    )
}

pub fn app_config(timeout_secs: u64) -> AppConfig {
    let timeout = timeout_secs.to_string();
    AppConfig::from_lookup(move |key| match key {
        "JWT_SECRET" => Some(JWT_SECRET.to_string()),
        "JWT_LEEWAY_SECS" => Some("0".to_string()),
        "UPSTREAM_TIMEOUT_SECS" => Some(timeout.clone()),
        "UPSTREAM_CONNECT_TIMEOUT_SECS" => Some("2".to_string()),
        _ => None,
    })
}

/// Full gateway router over the given route file
pub fn gateway(yaml: &str, timeout_secs: u64) -> Result<(Router, Arc<ConfigStore>)> {
    let app = app_config(timeout_secs);
    let file = GatewayFile::from_yaml(yaml)?;
    let snapshot = ConfigSnapshot::build(&file, &app.security, |_| None, 1)?;
    let store = Arc::new(ConfigStore::from_snapshot(snapshot, app.security.clone()));

    let state = AppState::with_http_upstream(&app, Arc::clone(&store))?;
    Ok((handlers::router(state, &app.security), store))
}

/// Echo upstream plus a gateway routed at it
pub async fn setup() -> Result<(Router, EchoUpstream)> {
    let echo = EchoUpstream::spawn().await?;
    let reports = format!("http://{}", closed_addr()?);
    let (router, _) = gateway(&gateway_yaml(&echo.base_url(), &reports), 5)?;
    Ok((router, echo))
}

pub fn user_token(user_id: i64, role: &str, ttl_secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let mut claim = UserSessionClaim::new(user_id, role, now + ttl_secs);
    claim.iat = Some(now);
    encode(&Header::default(), &claim, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Header as seen by the echo upstream
    pub fn upstream_header(&self, name: &str) -> Option<&str> {
        self.body["headers"][name].as_str()
    }
}

pub async fn send(router: &Router, request: axum::http::Request<Body>) -> Result<TestResponse> {
    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    Ok(TestResponse { status, headers, body })
}

pub fn get(uri: &str) -> axum::http::request::Builder {
    axum::http::Request::builder().method("GET").uri(uri)
}
