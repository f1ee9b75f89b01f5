use std::fs;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use prestock::config::ServerConfig;
use prestock::server::{AppState, create_router};
use prestock::store::{MIGRATIONS, SqliteStore, Store};

const SESSION_PURGE_INTERVAL_SECS: u64 = 3600;

#[derive(Parser)]
#[command(name = "prestock")]
#[command(about = "A preorder dashboard server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Apply pending schema migrations (run before serving traffic)
    Migrate {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
}

fn run_migrate(data_dir: String) -> anyhow::Result<()> {
    let data_path: std::path::PathBuf = data_dir.into();
    fs::create_dir_all(&data_path)?;

    let store = SqliteStore::new(data_path.join("prestock.db"))?;
    let before = store.schema_version()?;
    store.migrate()?;
    let after = store.schema_version()?;

    if before == after {
        println!("Database is up to date (schema v{after})");
    } else {
        println!("Migrated database from v{before} to v{after}");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("prestock=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Migrate { data_dir } => {
                run_migrate(data_dir)?;
            }
        },
        Commands::Serve {
            host,
            port,
            data_dir,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
            };

            let store = SqliteStore::new(config.db_path())?;
            if store.schema_version()? < MIGRATIONS.len() as i64 {
                bail!(
                    "Database schema is out of date. Run 'prestock admin migrate' before serving traffic."
                );
            }

            let state = Arc::new(AppState {
                store: Arc::new(store),
            });

            // Expired sessions are already invisible to reads; this keeps
            // the table from growing without bound
            let purge_store = state.store.clone();
            tokio::spawn(async move {
                let mut interval =
                    tokio::time::interval(Duration::from_secs(SESSION_PURGE_INTERVAL_SECS));
                loop {
                    interval.tick().await;
                    match purge_store.purge_expired_sessions(Utc::now()) {
                        Ok(0) => {}
                        Ok(count) => info!("purged {count} expired sessions"),
                        Err(e) => tracing::warn!("session purge failed: {e}"),
                    }
                }
            });

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
