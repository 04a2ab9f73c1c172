mod args;
mod commands;
mod logger;

use clap::Parser;

use args::{Args, Command};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Args { log_filter, credentials_dir, command } = Args::parse();

    match command {
        Command::Serve { host, port, api_key, config } => {
            let config = match config {
                Some(path) => config::Config::load(&path)?,
                None => config::Config::default(),
            };
            logger::init(log_filter.as_deref().unwrap_or(&config.log_filter));

            let serve_args = commands::resolve_serve_args(&config, host, port, api_key, credentials_dir);
            commands::serve(serve_args, VERSION).await
        }
        other => {
            logger::init(log_filter.as_deref().unwrap_or("info"));
            let dir = credentials_dir.unwrap_or_else(commands::default_credentials_dir);

            match other {
                Command::Login { token } => commands::login(token, dir).await,
                Command::Logout => commands::logout(dir).await,
                Command::Status => commands::status(dir).await,
                Command::Serve { .. } => unreachable!("handled above"),
            }
        }
    }
}
