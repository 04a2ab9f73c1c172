//! Upstream Copilot API configuration.

use serde::Deserialize;

/// Upstream Copilot API configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Overrides the compiled-in fallback base URL (`https://api.githubcopilot.com`).
    pub base_url: Option<String>,
}
