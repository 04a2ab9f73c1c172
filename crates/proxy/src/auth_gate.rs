//! Optional API-key gate (§6). A plain axum middleware function rather than a `tower::Layer` —
//! this system has exactly one check to make, not a composable pipeline of them.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use crate::state::AppState;

const PUBLIC_PATHS: &[&str] = &["/", "/health"];

/// Runs before every route handler. No-op when no API key is configured. Otherwise: loopback
/// callers and [`PUBLIC_PATHS`] bypass the check; everyone else must present the key via
/// `Authorization: Bearer`, `x-api-key`, or `api-key`.
pub async fn require_api_key(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(request).await;
    };

    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    if is_loopback(&request) {
        return next.run(request).await;
    }

    if presented_key(&request).as_deref() == Some(expected) {
        return next.run(request).await;
    }

    unauthorized()
}

fn is_loopback(request: &Request) -> bool {
    // `ConnectInfo` is the real TCP peer address and is authoritative whenever it's present
    // (every production listener is bound via `into_make_service_with_connect_info`). Only
    // fall back to the (attacker-controlled) `Host` header when it's genuinely absent, e.g. a
    // router under test driven directly with `ServiceExt::oneshot`.
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().is_loopback();
    }

    request
        .headers()
        .get(axum::http::header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(|host| {
            let host = host.split(':').next().unwrap_or(host);
            host == "localhost"
                || host.parse::<Ipv4Addr>().map(|ip| IpAddr::V4(ip).is_loopback()).unwrap_or(false)
                || host.parse::<Ipv6Addr>().map(|ip| IpAddr::V6(ip).is_loopback()).unwrap_or(false)
        })
        .unwrap_or(false)
}

fn presented_key(request: &Request) -> Option<String> {
    let headers = request.headers();

    if let Some(value) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.to_owned());
            }
        }
    }

    for name in ["x-api-key", "api-key"] {
        if let Some(value) = headers.get(name) {
            if let Ok(value) = value.to_str() {
                return Some(value.to_owned());
            }
        }
    }

    None
}

fn unauthorized() -> Response {
    #[derive(Serialize)]
    struct Body {
        error: &'static str,
    }

    (StatusCode::UNAUTHORIZED, Json(Body { error: "missing or invalid API key" })).into_response()
}
