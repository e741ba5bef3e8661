//! Forwarding handler: everything under `/api` goes to the backend.

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

use crate::app::AppState;
use crate::rewrite::{backend_base, rewrite_target};

/// Upper bound on buffered request bodies. The dashboard's payloads are
/// small JSON documents; anything larger is rejected.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Connection-scoped headers that must not be forwarded in either direction.
const HOP_BY_HOP: [&str; 7] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn strip_hop_headers(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Proxy an inbound `/api/*` request to its rewritten backend target,
/// preserving method, headers (bearer credential included), body, and query
/// string. Upstream failures surface as 502 — a transport failure to the
/// caller, same as any other network error.
pub async fn proxy_api(State(state): State<AppState>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_owned);

    let Some(target) = rewrite_target(&backend_base(), &path, query.as_deref()) else {
        // Not backend-bound; nothing else is served under this router.
        return StatusCode::NOT_FOUND.into_response();
    };

    let (parts, body) = request.into_parts();
    let body_bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(%error, %path, "failed to read request body");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let mut headers = parts.headers;
    // The upstream connection gets its own host header.
    headers.remove(header::HOST);
    strip_hop_headers(&mut headers);

    let upstream = state
        .http
        .request(parts.method, &target)
        .headers(headers)
        .body(body_bytes)
        .send()
        .await;

    let upstream = match upstream {
        Ok(upstream) => upstream,
        Err(error) => {
            error!(%error, %target, "backend unreachable");
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let status = upstream.status();
    let mut response_headers = upstream.headers().clone();
    strip_hop_headers(&mut response_headers);

    match upstream.bytes().await {
        Ok(bytes) => {
            let mut response = (status, bytes).into_response();
            *response.headers_mut() = response_headers;
            response
        }
        Err(error) => {
            error!(%error, %target, "failed to read backend response");
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}
