/// Errors raised talking to the upstream Copilot API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Credential resolution failed (not authenticated, revoked grant, ...).
    #[error(transparent)]
    Credentials(#[from] credentials::Error),

    /// A transport-level failure reaching the upstream.
    #[error("request to {0} failed: {1}")]
    Request(&'static str, #[source] reqwest::Error),

    /// The upstream responded with a non-2xx status.
    #[error("upstream returned status {status}: {message}")]
    Status {
        /// HTTP status code returned by the upstream.
        status: u16,
        /// Upstream-provided (or synthesized) error body.
        message: String,
    },

    /// The upstream's JSON body did not parse as expected.
    #[error("failed to decode upstream response: {0}")]
    Decode(#[source] reqwest::Error),

    /// The upstream connection failed (or a line exceeded the codec's buffer) while streaming.
    #[error("upstream stream failed: {0}")]
    Stream(#[source] std::io::Error),
}
