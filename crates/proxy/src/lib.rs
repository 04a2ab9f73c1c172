//! The HTTP surface (C5): wires the credential manager and upstream client to axum routes for
//! the three chat-completion dialects, the model list, and health/liveness.

mod auth_gate;
mod error;
mod handlers;
mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;

pub use error::{ApiError, Envelope};
pub use state::AppState;

/// Assembles the router. Middleware order, outside-in: request logging, then the optional
/// API-key gate, then the route handler.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(handlers::chat_completions))
        .route("/v1/messages", post(handlers::messages))
        .route("/v1/responses", post(handlers::responses))
        .route("/v1/models", get(handlers::models))
        .route("/health", get(handlers::health))
        .route("/", get(handlers::root))
        .layer(axum::middleware::from_fn_with_state(state.clone(), auth_gate::require_api_key))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::timeout::TimeoutLayer::new(Duration::from_secs(130)))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode};
    use std::net::SocketAddr;
    use tower::ServiceExt as _;

    fn test_state() -> Arc<AppState> {
        let dir = tempfile::tempdir().unwrap();
        Arc::new(AppState {
            credentials: Arc::new(credentials::CredentialManager::new(dir.path())),
            upstream: Arc::new(upstream::UpstreamClient::new(Arc::new(credentials::CredentialManager::new(
                dir.path(),
            )))),
            api_key: None,
            version: "test",
        })
    }

    #[tokio::test]
    async fn health_reports_unauthenticated_with_no_credentials() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn root_is_reachable_without_api_key() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_route_rejects_missing_key_from_non_loopback() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(AppState {
            credentials: Arc::new(credentials::CredentialManager::new(dir.path())),
            upstream: Arc::new(upstream::UpstreamClient::new(Arc::new(credentials::CredentialManager::new(
                dir.path(),
            )))),
            api_key: Some("secret".to_owned()),
            version: "test",
        });
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/models")
                    .header("host", "proxy.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    /// A spoofed `Host: localhost` header must not bypass the gate once a real, non-loopback
    /// peer address is known via `ConnectInfo`.
    #[tokio::test]
    async fn protected_route_rejects_remote_peer_spoofing_localhost_host_header() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(AppState {
            credentials: Arc::new(credentials::CredentialManager::new(dir.path())),
            upstream: Arc::new(upstream::UpstreamClient::new(Arc::new(credentials::CredentialManager::new(
                dir.path(),
            )))),
            api_key: Some("secret".to_owned()),
            version: "test",
        });
        let app = build_router(state);

        let remote: SocketAddr = "203.0.113.7:54321".parse().unwrap();
        let mut request = Request::builder()
            .uri("/v1/models")
            .header("host", "localhost")
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(ConnectInfo(remote));

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
