//! The process-wide HTTP session used for every call to the upstream.

use std::time::Duration;

use reqwest::Client;

/// Builds the shared client. One instance lives for the life of the process (owned by
/// [`crate::UpstreamClient`]) so pooled connections to the upstream survive between requests.
pub(crate) fn build() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .pool_idle_timeout(Some(Duration::from_secs(5)))
        .tcp_nodelay(true)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .build()
        .expect("failed to build upstream HTTP client")
}
