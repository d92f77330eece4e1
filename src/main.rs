use std::path::PathBuf;

use beekeeper::{AppState, build_app, config::BeekeeperConfig, db, observability};
use clap::Parser;

/// CLI arguments for the Beekeeper API
#[derive(Parser, Debug)]
#[command(version, about = "Beekeeper housekeeping query API", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file. Without one, built-in defaults are used.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Start the API server (default)
    Serve,
    /// Run database migrations and exit
    ///
    /// Useful for Kubernetes init containers or CI/CD pipelines.
    Migrate,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = load_config(args.config.as_deref());

    if let Err(e) = observability::init_tracing(&config.observability) {
        eprintln!("Failed to initialize tracing: {}", e);
        std::process::exit(1);
    }

    match args.command {
        Some(Command::Migrate) => run_migrate(config).await,
        Some(Command::Serve) | None => run_server(config).await,
    }
}

fn load_config(path: Option<&std::path::Path>) -> BeekeeperConfig {
    let Some(path) = path else {
        return BeekeeperConfig::default();
    };

    match BeekeeperConfig::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

async fn run_migrate(config: BeekeeperConfig) {
    if config.database.is_none() {
        eprintln!("Error: Database is not configured. Nothing to migrate.");
        std::process::exit(1);
    }

    tracing::info!("Running database migrations");

    let pool = match db::DbPool::from_config(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        }
    };

    if let Err(e) = pool.run_migrations().await {
        tracing::error!(error = %e, backend = pool.backend(), "Migration failed");
        std::process::exit(1);
    }

    tracing::info!(backend = pool.backend(), "Migrations complete");
}

async fn run_server(config: BeekeeperConfig) {
    let state = match AppState::new(config.clone()).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize record store");
            std::process::exit(1);
        }
    };

    let app = build_app(&config, state);

    let bind_addr = std::net::SocketAddr::new(config.server.host, config.server.port);
    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %bind_addr, error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on http://{}", bind_addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests");
}
