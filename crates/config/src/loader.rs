use std::path::Path;

use crate::Config;

pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|err| anyhow::anyhow!("failed to read config file at {}: {err}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .map_err(|err| anyhow::anyhow!("failed to parse config file at {}: {err}", path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::Config;

    #[test]
    fn load_overrides_server_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000
            api_key = "secret"

            [upstream]
            base_url = "https://example.test"

            log_filter = "debug"
            "#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.api_key.as_deref(), Some("secret"));
        assert_eq!(config.upstream.base_url.as_deref(), Some("https://example.test"));
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn rejects_unknown_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "unknown_top_level_field = true").unwrap();

        let result = Config::load(file.path());

        assert!(result.is_err());
    }
}
