//! Credential storage configuration.

use serde::Deserialize;

/// Credential storage configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Overrides the default `~/.copilotx` directory.
    pub dir: Option<String>,
}
