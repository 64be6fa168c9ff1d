//! CLI entry point for the sack dev server.
//!
//! This binary renders the showcase pages from `config.yaml`, serves them,
//! and pushes live-reload notifications to open browser tabs whenever the
//! project changes.
//!
//! # Usage
//!
//! ```bash
//! sack [OPTIONS] <COMMAND>
//!
//! # Render pages and serve them with live reload on port 7536
//! sack start
//!
//! # Serve on another port without watching
//! sack start --port 8080 --no-watch
//!
//! # Append five placeholder pages to config.yaml
//! sack generate --batch 5
//!
//! # Append one page, answering prompts
//! sack generate
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;
use std::net::SocketAddr;

use axum::middleware::from_fn_with_state;
use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use sack_core::{DEFAULT_PORT, DevServerConfig, SiteConfig};
use sack_reload::{
    BroadcastLoop, ReloadScript, SubscriberRegistry, inject_reload_script, notification_router,
};
use sack_site::{PageTemplate, append_entry, batch_entries, generate_pages, prompt_entry, site_router};
use sack_watcher::{IgnoreRules, Watcher};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Development server for a static 3D model showcase with live reload.
#[derive(Debug, Parser)]
#[command(name = "sack", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Render pages and start the development server.
    Start {
        /// Port to listen on.
        #[arg(
            short,
            long,
            env = "SACK_PORT",
            default_value_t = DEFAULT_PORT,
            value_parser = clap::value_parser!(u16).range(1..)
        )]
        port: u16,

        /// Serve without watching files or injecting the reload script.
        #[arg(long)]
        no_watch: bool,
    },

    /// Append page entries to config.yaml.
    ///
    /// Without `--batch`, prompts for each field of a single new page.
    Generate {
        /// Append this many placeholder pages (1-1024).
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..=1024))]
        batch: Option<u16>,
    },
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
/// Noisy crates like `hyper` and `mio` are filtered to `warn` level.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},hyper=warn,mio=warn,notify=warn"))
    });

    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(filter)
        .init();
}

/// Builds the server configuration from CLI arguments.
fn build_config(port: u16, no_watch: bool) -> color_eyre::Result<DevServerConfig> {
    let mut config = DevServerConfig {
        port,
        ..DevServerConfig::default()
    };
    config.watch.enabled = !no_watch;
    config.validate()?;
    Ok(config)
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Renders every page, then serves the site until interrupted.
///
/// With watching enabled, the reload endpoint is mounted, HTML responses get
/// the reload script, and file changes are broadcast to connected tabs.
async fn run_start(config: DevServerConfig) -> color_eyre::Result<()> {
    let layout = &config.layout;

    let site = SiteConfig::read(&layout.config_path).wrap_err("Error reading config file")?;
    let template =
        PageTemplate::load(&layout.template_path).wrap_err("Error loading page template")?;
    generate_pages(&site, &template, layout).wrap_err("Error generating pages")?;

    let mut app = site_router(&site, layout)?;
    let registry = SubscriberRegistry::new();

    let reload = if config.watch.enabled {
        let rules = IgnoreRules::load_or_empty(&config.ignore_file);
        let (watcher, streams) = Watcher::from_config(&config.watch)
            .await
            .wrap_err("Failed to start file watcher")?;
        let handle = BroadcastLoop::new(streams, rules, registry.clone()).spawn();

        app = app
            .layer(from_fn_with_state(
                ReloadScript::from_config(&config),
                inject_reload_script,
            ))
            .merge(notification_router(registry.clone(), &config.reload_path));
        Some((watcher, handle))
    } else {
        info!("File watching disabled");
        None
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "Starting server on :{}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(registry))
        .await
        .wrap_err("Server error")?;

    if let Some((watcher, handle)) = reload {
        watcher.close().await?;
        let stats = handle.await?;
        info!(
            events = stats.events_seen,
            reloads = stats.broadcasts,
            "Live reload stopped"
        );
    }

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C (or SIGTERM on Unix), then disconnects every
/// live-reload client so that graceful shutdown does not wait on them.
async fn shutdown_signal(registry: SubscriberRegistry) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }

    registry.close_all();
}

/// Appends page entries to the page collection and saves it.
fn run_generate(config: &DevServerConfig, batch: Option<u16>) -> color_eyre::Result<()> {
    let path = &config.layout.config_path;
    let mut site = SiteConfig::read(path).wrap_err("Error reading config file")?;

    let added = match batch {
        Some(count) => batch_entries(&mut site, usize::from(count))
            .wrap_err("Error reading config file or no existing pages to reference")?,
        None => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            let page = prompt_entry(&mut stdin.lock(), &mut stdout.lock())?;
            vec![append_entry(&mut site, page)]
        }
    };

    site.write(path).wrap_err("Error writing config file")?;
    info!(path = %path, added = added.len(), "Config updated");

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    for key in &added {
        writeln!(handle, "Added {key}")?;
    }

    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Route to the command
    match cli.command {
        Commands::Start { port, no_watch } => {
            let config = build_config(port, no_watch)?;
            run_start(config).await
        }
        Commands::Generate { batch } => run_generate(&DevServerConfig::default(), batch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_start_defaults() {
        let cli = Cli::try_parse_from(["sack", "start"]).unwrap();
        match cli.command {
            Commands::Start { port, no_watch } => {
                assert_eq!(port, DEFAULT_PORT);
                assert!(!no_watch);
            }
            Commands::Generate { .. } => panic!("expected start"),
        }
    }

    #[test]
    fn test_port_range() {
        assert!(Cli::try_parse_from(["sack", "start", "--port", "0"]).is_err());
        assert!(Cli::try_parse_from(["sack", "start", "--port", "65536"]).is_err());
        assert!(Cli::try_parse_from(["sack", "start", "--port", "65535"]).is_ok());
    }

    #[test]
    fn test_batch_range() {
        assert!(Cli::try_parse_from(["sack", "generate", "--batch", "0"]).is_err());
        assert!(Cli::try_parse_from(["sack", "generate", "--batch", "1025"]).is_err());

        let cli = Cli::try_parse_from(["sack", "generate", "--batch", "1024"]).unwrap();
        assert!(matches!(cli.command, Commands::Generate { batch: Some(1024) }));
    }

    #[test]
    fn test_generate_without_batch_is_interactive() {
        let cli = Cli::try_parse_from(["sack", "generate"]).unwrap();
        assert!(matches!(cli.command, Commands::Generate { batch: None }));
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["sack", "start", "--verbose", "--no-color"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.no_color);
    }

    #[test]
    fn test_build_config() {
        let config = build_config(8080, true).unwrap();
        assert_eq!(config.port, 8080);
        assert!(!config.watch.enabled);
    }
}
