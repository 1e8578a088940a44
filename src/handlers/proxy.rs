// Proxy fallback
//
// Every request that is not a local endpoint lands here: one config snapshot
// is loaded, the pipeline classifies the request, and the dispatcher forwards
// it. Rejections are answered locally with the JSON error envelope.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};

use super::AppState;
use crate::pipeline::context::{RequestContext, REQUEST_ID_HEADER};

pub async fn proxy(State(state): State<AppState>, request: Request) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let snapshot = state.config.snapshot();

    let ctx = RequestContext::from_parts(&parts, &state.language_header);

    let ctx = match state.pipeline.run(ctx, &snapshot) {
        Ok(ctx) => ctx,
        Err(halted) => {
            tracing::info!(
                request_id = %halted.context.request_id,
                method = %halted.context.method,
                path = %halted.context.path,
                stage = halted.stage,
                status = halted.error.status_code().as_u16(),
                error = halted.error.error_code(),
                latency = ?start.elapsed(),
                "Request refused"
            );
            let response = halted.error.into_response();
            return decorate(response, &halted.context, &state.language_header);
        }
    };

    let response = match state.dispatcher.dispatch(&ctx, &parts, body).await {
        Ok(response) => response,
        Err(error) => error.into_response(),
    };

    tracing::info!(
        request_id = %ctx.request_id,
        method = %ctx.method,
        path = %ctx.path,
        route = ctx.route.as_ref().map(|r| r.pattern.as_str()).unwrap_or("-"),
        service = ctx.service().unwrap_or("-"),
        identity = ctx.identity.kind(),
        status = response.status().as_u16(),
        latency = ?start.elapsed(),
        config_version = snapshot.version,
        "Request proxied"
    );

    decorate(response, &ctx, &state.language_header)
}

/// Echo the request id and the normalised language on the way out.
fn decorate(mut response: Response, ctx: &RequestContext, language_header: &HeaderName) -> Response {
    let headers = response.headers_mut();

    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    if let Some(language) = ctx.normalized_language.as_deref() {
        if let Ok(value) = HeaderValue::from_str(language) {
            headers.insert(language_header.clone(), value);
        }
    }

    response
}
