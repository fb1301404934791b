mod config;
mod error;
mod llm;
mod service;
#[cfg(test)]
mod testing;
mod web;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::service::ServiceLayer;

const DEFAULT_CONFIG_PATH: &str = "config/service.toml";

fn print_help() {
    println!(
        "\
service-layer v{}

A 3-tier demo service: a web form whose queries are answered by a hosted LLM.

USAGE:
    service-layer [OPTIONS] [CONFIG_PATH]

ARGUMENTS:
    CONFIG_PATH    Path to TOML configuration file [default: {DEFAULT_CONFIG_PATH}]

OPTIONS:
    -h, --help       Print this help message and exit
    -V, --version    Print version and exit

ENVIRONMENT VARIABLES:
    Variables are referenced in the config file via ${{VAR_NAME}} syntax.

    RUST_LOG          Log level filter for tracing
                      (e.g. debug, service_layer=debug,warn)
    GEMINI_API_KEY    API key for Google Gemini models
                      (from https://aistudio.google.com/)

EXAMPLES:
    service-layer                               # uses {DEFAULT_CONFIG_PATH}
    service-layer /etc/service-layer.toml       # custom config path
    RUST_LOG=debug service-layer                # with debug logging",
        env!("CARGO_PKG_VERSION"),
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --help / --version before anything else
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("service-layer v{}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {}
        }
    }

    // Initialize logging (RUST_LOG=debug for debug mode)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("service_layer=info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    info!("Loading configuration from {config_path}");
    let config = Config::load(&config_path)?;

    let llm = llm::build_client(&config.llm)?;
    info!("LLM: {}", llm.description());

    let app = web::router(ServiceLayer::new(llm));

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received, exiting");
        })
        .await?;

    Ok(())
}
