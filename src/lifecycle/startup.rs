//! Startup orchestration.
//!
//! # Order
//! 1. Load and validate configuration (defaults, TOML, settings JSON, CLI)
//! 2. Resolve the project layout and the Piral instance
//! 3. Allocate the feed port and start the feed
//! 4. Wait (bounded) for the feed
//! 5. Bind the listener and serve
//!
//! Any failure before step 5 is fatal; nothing is served partially.

use std::path::Path;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::cli::Cli;
use crate::config::{self, ConfigError, GatewayConfig};
use crate::feed::{FeedError, FeedProcess};
use crate::http::{HttpServer, SitePaths};
use crate::instance::{find_piral_instance, InstanceError, PiralInstance, ProjectLayout};
use crate::lifecycle::{signals, Drain, Shutdown};
use crate::net::allocate_port;
use crate::observability::metrics;

/// Error type for startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Instance(#[from] InstanceError),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("Failed to determine working directory: {0}")]
    WorkingDirectory(std::io::Error),
    #[error("Failed to allocate feed port: {0}")]
    Port(std::io::Error),
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

/// Everything resolved before any process or socket is opened.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub config: GatewayConfig,
    pub layout: ProjectLayout,
    pub instance: PiralInstance,
}

/// Build the effective configuration from all layers.
pub fn load_configuration(cli: &Cli, layout: &ProjectLayout) -> Result<GatewayConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => GatewayConfig::default(),
    };

    let settings_path = cli.settings.clone().unwrap_or_else(|| layout.settings_file());
    if let Some(settings) = config::load_settings(&settings_path)? {
        config::apply_settings(&mut config, settings);
    }

    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(environment) = &cli.environment {
        config.environment = environment.clone();
    }
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }

    config::validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Resolve configuration, layout, and instance relative to `cwd`.
pub fn prepare(cli: &Cli, cwd: &Path) -> Result<Prepared, StartupError> {
    let layout = ProjectLayout::new(&cli.application_path, &cli.out_dir, cwd);
    let config = load_configuration(cli, &layout)?;
    let instance = find_piral_instance(&layout.pilet_json(), &layout.package_json())?;

    Ok(Prepared {
        config,
        layout,
        instance,
    })
}

/// Resolve everything relative to the current working directory.
pub fn prepare_from_env(cli: &Cli) -> Result<Prepared, StartupError> {
    let cwd = std::env::current_dir().map_err(StartupError::WorkingDirectory)?;
    prepare(cli, &cwd)
}

fn log_banner(prepared: &Prepared, feed_url: &str) {
    let Prepared {
        config,
        layout,
        instance,
    } = prepared;

    tracing::info!(
        application_path = %layout.application_path.display(),
        forwarded_paths = %config.forwarded_paths.join(", "),
        remote_feed_url = config.feed.remote_feed_url.as_deref().unwrap_or(""),
        piral_instance = %instance,
        pilet_dir = %layout.pilet_dir.display(),
        out_path = %layout.out_path.display(),
        app_id = %layout.app_id,
        static_assets = %layout.static_assets_manifest.display(),
        feed = %feed_url,
        "Starting pilet gateway"
    );
}

/// Start the feed and serve until a shutdown signal arrives.
pub async fn run(prepared: Prepared) -> Result<(), StartupError> {
    let port = allocate_port().map_err(StartupError::Port)?;
    let mut feed = FeedProcess::spawn(&prepared.config.feed, port, &prepared.layout.pilet_dir)?;
    log_banner(&prepared, &feed.endpoint().base_url);

    let Prepared {
        config,
        layout,
        instance,
    } = prepared;

    let endpoint = feed
        .wait_ready(Duration::from_secs(config.feed.ready_timeout_secs))
        .await;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "Listening for connections");
    }

    let paths = SitePaths {
        dist_dir: layout.dist_dir(),
        app_dir: layout.app_dir(&instance),
        app_shell_manifest: layout.app_shell_root(&instance).join("package.json"),
    };
    let drain_deadline = Duration::from_secs(config.timeouts.shutdown_secs);
    let server = HttpServer::new(config, &instance, paths, endpoint);

    let shutdown = Shutdown::new();
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    signals::wait_for_shutdown_signal().await;
    let drained = shutdown
        .drain(server_task, drain_deadline, signals::wait_for_shutdown_signal())
        .await;

    feed.shutdown().await;

    match drained {
        Drain::Completed(result) => result.map_err(StartupError::Serve),
        Drain::DeadlineExceeded | Drain::Forced => Ok(()),
        Drain::Failed => Err(StartupError::Serve(std::io::Error::other(
            "server task failed",
        ))),
    }
}
