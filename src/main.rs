//! mini-httpd
//!
//! A small HTTP/1.1 server answering one request per connection.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ net::listener ──▶ net::connection ──▶ http::request
//!                (worker cap)       (read one frame)     (parse)
//!                                                          │
//!                                                          ▼
//!     Client ◀── http::response ◀── http::encoding ◀── routing
//!                (format bytes)     (gzip if accepted)   (home, echo,
//!                                                         user-agent, files)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use mini_httpd::config::{load_config, validate_config, ServerConfig};
use mini_httpd::lifecycle;
use mini_httpd::observability::logging;

#[derive(Parser)]
#[command(name = "mini-httpd")]
#[command(about = "Minimal HTTP/1.1 server with echo, user-agent and file routes", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory served and written by `/files/`.
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:4221.
    #[arg(short, long)]
    bind: Option<String>,

    /// Maximum connections served at once.
    #[arg(long)]
    max_connections: Option<usize>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServerConfig::default(),
        };

        if let Some(directory) = self.directory {
            config.files.directory = Some(directory);
        }
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(max_connections) = self.max_connections {
            config.listener.max_connections = max_connections;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }

        validate_config(&config).map_err(|errors| {
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        })?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("mini-httpd: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability.log_level, config.observability.log_json);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "mini-httpd starting");

    match lifecycle::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}
