/// Errors raised by the credential manager.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No grant token is stored on disk (or in memory); the caller must log in first.
    #[error("not authenticated; run `login` first")]
    NotAuthenticated,

    /// The upstream bearer mint rejected the grant token (HTTP 401).
    #[error("GitHub token is invalid or expired; re-login required")]
    GrantRevoked,

    /// The upstream bearer mint reports no active Copilot subscription (HTTP 403).
    #[error("GitHub Copilot is not enabled for this account")]
    SubscriptionMissing,

    /// The bearer mint endpoint returned an unexpected status code.
    #[error("upstream token exchange failed with status {status}: {message}")]
    Upstream {
        /// HTTP status code returned by the upstream.
        status: u16,
        /// Upstream-provided (or synthesized) error message.
        message: String,
    },

    /// The device-code flow reported a terminal error (`expired_token`, `access_denied`, ...).
    #[error("device code login failed: {0}")]
    DeviceFlow(String),

    /// The device-code flow exceeded its deadline without a terminal outcome.
    #[error("device code login timed out")]
    DeviceFlowTimeout,

    /// A transport-level failure talking to GitHub/Copilot.
    #[error("request to {0} failed: {1}")]
    Request(&'static str, #[source] reqwest::Error),

    /// Credentials could not be persisted to disk. Non-fatal: the in-memory record is
    /// still used for the remainder of the session.
    #[error("failed to persist credentials: {0}")]
    Persistence(#[source] std::io::Error),
}
