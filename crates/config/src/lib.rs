//! Configuration structures for the proxy's `config.toml`.

#![deny(missing_docs)]

mod credentials;
mod loader;
mod server;
mod upstream;

use std::path::Path;

pub use credentials::CredentialsConfig;
use serde::Deserialize;
pub use server::ServerConfig;
pub use upstream::UpstreamConfig;

/// Top-level configuration for the proxy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Credential storage configuration.
    pub credentials: CredentialsConfig,
    /// Upstream Copilot API configuration.
    pub upstream: UpstreamConfig,
    /// `log`/`logforth` filter string, e.g. `"info"` or `"proxy=debug,credentials=debug"`.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "info".to_owned()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            credentials: CredentialsConfig::default(),
            upstream: UpstreamConfig::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_debug_snapshot;

    use crate::Config;

    #[test]
    fn defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_debug_snapshot!(&config, @r#"
        Config {
            server: ServerConfig {
                host: "127.0.0.1",
                port: 24680,
                api_key: None,
            },
            credentials: CredentialsConfig {
                dir: None,
            },
            upstream: UpstreamConfig {
                base_url: None,
            },
            log_filter: "info",
        }
        "#);
    }
}
