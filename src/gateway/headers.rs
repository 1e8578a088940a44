// Header rules for forwarding in both directions.

use std::net::SocketAddr;

use axum::http::{
    header::{AUTHORIZATION, CONNECTION, HOST, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING, UPGRADE},
    HeaderMap, HeaderName, HeaderValue,
};

use crate::pipeline::context::REQUEST_ID_HEADER;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");

const HOP_BY_HOP: [HeaderName; 8] = [
    CONNECTION,
    KEEP_ALIVE,
    PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION,
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
];

/// Headers named in `Connection` are hop-by-hop for this message too
fn connection_listed(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().to_ascii_lowercase().as_bytes()).ok())
        .collect()
}

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Copy of `headers` without hop-by-hop entries
pub fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let listed = connection_listed(headers);
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name) || listed.contains(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// What the dispatcher adds or replaces on the way upstream
pub struct ForwardingHeaders<'a> {
    pub language_header: &'a HeaderName,
    pub language: &'a str,
    pub request_id: &'a str,
    pub peer: Option<SocketAddr>,
    pub scheme: &'a str,
}

/// Build upstream request headers.
///
/// Everything end-to-end is copied as is, Authorization included. `Host` is
/// dropped so the client sets the upstream authority; the language header is
/// replaced by its normalised value.
///
/// Authorization survives even when the client names it in `Connection`.
pub fn forward_request_headers(inbound: &HeaderMap, extra: &ForwardingHeaders<'_>) -> HeaderMap {
    let mut headers = strip_hop_by_hop(inbound);
    headers.remove(HOST);

    headers.remove(AUTHORIZATION);
    for value in inbound.get_all(AUTHORIZATION) {
        headers.append(AUTHORIZATION, value.clone());
    }

    if let Ok(value) = HeaderValue::from_str(extra.language) {
        headers.insert(extra.language_header.clone(), value);
    }
    if let Ok(value) = HeaderValue::from_str(extra.request_id) {
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    if let Some(host) = inbound.get(HOST) {
        if !headers.contains_key(&X_FORWARDED_HOST) {
            headers.insert(X_FORWARDED_HOST, host.clone());
        }
    }
    if !headers.contains_key(&X_FORWARDED_PROTO) {
        if let Ok(value) = HeaderValue::from_str(extra.scheme) {
            headers.insert(X_FORWARDED_PROTO, value);
        }
    }

    if let Some(peer) = extra.peer {
        let prior: Vec<&str> = inbound
            .get_all(&X_FORWARDED_FOR)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        let chain = if prior.is_empty() {
            peer.ip().to_string()
        } else {
            format!("{}, {}", prior.join(", "), peer.ip())
        };
        if let Ok(value) = HeaderValue::from_str(&chain) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }

    headers
}
