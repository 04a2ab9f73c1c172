//! Subcommand implementations.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use credentials::CredentialManager;
use serde::Serialize;

/// Default credentials directory, `~/.copilotx`, used when no override is given.
pub fn default_credentials_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".copilotx")
}

fn credentials_dir(override_dir: Option<&Path>, config_dir: Option<&str>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_owned();
    }
    if let Some(dir) = config_dir {
        return PathBuf::from(dir);
    }
    default_credentials_dir()
}

pub async fn login(token: Option<String>, dir: PathBuf) -> anyhow::Result<()> {
    let manager = CredentialManager::new(&dir);

    let github_token = match token {
        Some(token) => {
            log::info!("using provided GitHub token");
            token
        }
        None => device_flow_login().await?,
    };

    manager.save_grant(github_token).await?;
    manager.ensure_bearer().await?;

    let status = manager.status().await;
    println!("Authenticated with GitHub Copilot.");
    println!("Credentials saved to {}", dir.join("auth.json").display());
    if let Some(expires_in) = status.expires_in {
        println!("Copilot token expires in {}m", expires_in / 60);
    }
    Ok(())
}

async fn device_flow_login() -> anyhow::Result<String> {
    let http = reqwest::Client::new();
    let device = credentials::request_device_code(&http).await?;

    println!("First, copy your one-time code: {}", device.user_code);
    println!("Then open {} in your browser to authorize.", device.verification_uri);
    println!("Waiting for authorization...");

    let token = credentials::poll_for_grant_token(&http, &device).await?;
    Ok(token)
}

pub async fn logout(dir: PathBuf) -> anyhow::Result<()> {
    let manager = CredentialManager::new(&dir);
    if manager.logout().await? {
        println!("Credentials removed.");
    } else {
        println!("No credentials found.");
    }
    Ok(())
}

pub async fn status(dir: PathBuf) -> anyhow::Result<()> {
    let manager = CredentialManager::new(&dir);
    manager.load().await;
    let status = manager.status().await;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

/// Arguments accepted by `serve`, already merged with configuration file defaults.
pub struct ServeArgs {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    pub credentials_dir: PathBuf,
}

pub fn resolve_serve_args(
    config: &config::Config,
    host: Option<String>,
    port: Option<u16>,
    api_key: Option<String>,
    override_dir: Option<PathBuf>,
) -> ServeArgs {
    ServeArgs {
        host: host.unwrap_or_else(|| config.server.host.clone()),
        port: port.unwrap_or(config.server.port),
        api_key: api_key.or_else(|| config.server.api_key.clone()),
        credentials_dir: credentials_dir(override_dir.as_deref(), config.credentials.dir.as_deref()),
    }
}

/// Server-discovery file, written on startup and removed on clean shutdown (§6).
#[derive(Serialize)]
struct ServerInfo<'a> {
    host: &'a str,
    port: u16,
    pid: u32,
    started_at: String,
    base_url: String,
}

pub async fn serve(args: ServeArgs, version: &'static str) -> anyhow::Result<()> {
    let manager = Arc::new(CredentialManager::new(&args.credentials_dir));
    if !manager.load().await {
        anyhow::bail!("not authenticated; run `copilotx login` first");
    }
    manager.ensure_bearer().await?;

    let upstream = Arc::new(upstream::UpstreamClient::new(manager.clone()));
    let state = Arc::new(proxy::AppState {
        credentials: manager,
        upstream,
        api_key: args.api_key,
        version,
    });

    let router = proxy::build_router(state);
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let server_info_path = write_server_info(&args.credentials_dir, &args.host, bound_addr.port())?;

    log::info!("copilotx {version} listening on http://{bound_addr}");
    println!("copilotx proxy listening on http://{bound_addr}");

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await?;

    let _ = std::fs::remove_file(&server_info_path);
    Ok(())
}

fn write_server_info(dir: &Path, host: &str, port: u16) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join("server.json");

    let info = ServerInfo {
        host,
        port,
        pid: std::process::id(),
        started_at: jiff::Zoned::now().with_time_zone(jiff::tz::TimeZone::UTC).strftime("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
        base_url: format!("http://{host}:{port}"),
    };
    std::fs::write(&path, serde_json::to_string_pretty(&info)? + "\n")?;
    Ok(path)
}
