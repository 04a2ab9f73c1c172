//! HTTP server configuration.

use serde::Deserialize;

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    24680
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the proxy listens on.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port the proxy listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Optional API key. When set, non-loopback callers must present it (see the auth gate).
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
        }
    }
}
