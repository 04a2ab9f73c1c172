//! Shared state handed to every route handler.

use std::sync::Arc;

use credentials::CredentialManager;
use upstream::UpstreamClient;

/// Bundles the two live collaborators every route needs, plus the optional API key checked by
/// the auth gate. Cheap to clone: every field is already behind an `Arc`.
pub struct AppState {
    /// Owns the grant/bearer pair.
    pub credentials: Arc<CredentialManager>,
    /// Talks to the upstream Copilot backend.
    pub upstream: Arc<UpstreamClient>,
    /// When set, non-loopback callers must present this key (see [`crate::auth_gate`]).
    pub api_key: Option<String>,
    /// Reported on `GET /health`.
    pub version: &'static str,
}
