//! Pilet development gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                 PILET GATEWAY                │
//!     Browser           │  ┌────────┐    ┌─────────┐    ┌───────────┐  │
//!     ──────────────────┼─▶│  http  │───▶│ routing │───▶│ websocket │──┼──▶ Feed (ws)
//!                       │  │ server │    │ Router  │    │   relay   │  │
//!                       │  └────────┘    └────┬────┘    └───────────┘  │
//!                       │                     │         ┌───────────┐  │
//!                       │                     ├────────▶│   proxy   │──┼──▶ Feed (http)
//!                       │                     │         └───────────┘  │
//!                       │                     │         ┌───────────┐  │
//!                       │                     ├────────▶│  static   │──┼──▶ dist/, app/
//!                       │                     │         └───────────┘  │
//!                       │                     │         ┌───────────┐  │
//!                       │                     └────────▶│ fallback  │──┼──▶ app/index.html
//!                       │                               └───────────┘  │
//!                       │  config · instance · feed supervisor ·       │
//!                       │  observability · lifecycle                   │
//!                       └──────────────────────────────────────────────┘
//! ```

use clap::Parser;

use pilet_gateway::cli::Cli;
use pilet_gateway::lifecycle;
use pilet_gateway::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let prepared = match lifecycle::prepare_from_env(&cli) {
        Ok(prepared) => prepared,
        Err(e) => {
            // Logging is configured from the loaded config; fall back to the CLI level.
            logging::init_logging(cli.log_level.as_deref().unwrap_or("info"));
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    logging::init_logging(&prepared.config.observability.log_level);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %prepared.config.listener.bind_address,
        environment = %prepared.config.environment,
        request_timeout_secs = prepared.config.timeouts.request_secs,
        "Configuration loaded"
    );

    lifecycle::run(prepared).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
