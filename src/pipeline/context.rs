use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap, HeaderName, Method};
use uuid::Uuid;

use crate::auth::{AuthOutcome, UserSessionClaim};
use crate::gateway::route_table::RouteRule;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Who the gateway decided the caller is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedIdentity {
    /// Auth stage has not run
    Unclassified,
    Anonymous,
    User(UserSessionClaim),
    Service(String),
}

impl ResolvedIdentity {
    pub fn kind(&self) -> &'static str {
        match self {
            ResolvedIdentity::Unclassified => "unclassified",
            ResolvedIdentity::Anonymous => "anonymous",
            ResolvedIdentity::User(_) => "user",
            ResolvedIdentity::Service(_) => "service",
        }
    }
}

impl TryFrom<AuthOutcome> for ResolvedIdentity {
    type Error = crate::auth::Rejection;

    fn try_from(outcome: AuthOutcome) -> Result<Self, Self::Error> {
        match outcome {
            AuthOutcome::Anonymous => Ok(ResolvedIdentity::Anonymous),
            AuthOutcome::User(claim) => Ok(ResolvedIdentity::User(claim)),
            AuthOutcome::Service(name) => Ok(ResolvedIdentity::Service(name)),
            AuthOutcome::Rejected(rejection) => Err(rejection),
        }
    }
}

/// Per-request state, owned by the handling task for the life of one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub method: Method,
    pub path: String,
    pub raw_authorization: Option<String>,
    pub raw_language: Option<String>,

    // Filled in by stages
    pub normalized_language: Option<String>,
    pub normalized_path: Option<String>,
    pub route: Option<Arc<RouteRule>>,
    pub identity: ResolvedIdentity,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            method,
            path: path.into(),
            raw_authorization: None,
            raw_language: None,
            normalized_language: None,
            normalized_path: None,
            route: None,
            identity: ResolvedIdentity::Unclassified,
        }
    }

    /// Capture what the stages need from the inbound request head.
    pub fn from_parts(parts: &Parts, language_header: &HeaderName) -> Self {
        let mut ctx = Self::new(parts.method.clone(), parts.uri.path());
        ctx.raw_authorization = header_string(&parts.headers, &AUTHORIZATION);
        ctx.raw_language = header_string(&parts.headers, language_header);

        if let Some(id) = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty() && v.len() <= 128)
        {
            ctx.request_id = id.to_string();
        }

        ctx
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.raw_authorization = Some(value.into());
        self
    }

    pub fn with_language(mut self, value: impl Into<String>) -> Self {
        self.raw_language = Some(value.into());
        self
    }

    pub fn service(&self) -> Option<&str> {
        self.route.as_ref().map(|r| r.service.as_str())
    }
}

// Non-UTF-8 values are kept lossily so they still fail validation instead of
// looking absent.
fn header_string(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}
