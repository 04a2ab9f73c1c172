//! Command-line arguments for the `copilotx` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Local HTTP proxy that exposes OpenAI and Anthropic chat-completion dialects over a GitHub
/// Copilot subscription.
#[derive(Debug, Parser)]
#[command(name = "copilotx", version)]
pub struct Args {
    /// Log filter string, e.g. `"info"` or `"proxy=debug,credentials=debug"`.
    #[arg(long, env = "RUST_LOG")]
    pub log_filter: Option<String>,

    /// Overrides the default `~/.copilotx` credentials directory.
    #[arg(long, global = true)]
    pub credentials_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authenticate with GitHub Copilot via the device authorization grant.
    Login {
        /// Skip the OAuth flow and store this grant token directly.
        #[arg(long, short = 't')]
        token: Option<String>,
    },
    /// Remove stored credentials.
    Logout,
    /// Print the current authentication status as JSON.
    Status,
    /// Start the local proxy server.
    Serve {
        /// Bind address.
        #[arg(long, short = 'H')]
        host: Option<String>,
        /// Bind port.
        #[arg(long, short = 'p')]
        port: Option<u16>,
        /// Require this key from non-loopback callers.
        #[arg(long, env = "COPILOTX_API_KEY")]
        api_key: Option<String>,
        /// Path to a `config.toml` file. Defaults are used if absent.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}
