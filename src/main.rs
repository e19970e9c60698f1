mod config;
mod database;
mod entities;
mod http_server;
mod logging;
mod services;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};

use crate::{
    config::Config, database::Database, http_server::app::HttpServerConfig,
    logging::init_tracing,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "PLAYLIST_SERVER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `playlist_server=debug,tower_http=debug`
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: String,

    /// OTLP gRPC endpoint to export traces to
    #[arg(long, global = true, env = "OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// The port to run the server on (overrides the config file)
        #[arg(short, long, env = "PLAYLIST_SERVER_PORT")]
        port: Option<u16>,

        /// Directory for uploaded and static files (overrides the config file)
        #[arg(short, long, env = "PLAYLIST_SERVER_STATIC_DIR")]
        static_dir: Option<PathBuf>,
    },
    /// Apply pending database migrations
    Migrate,
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let tracer_provider = init_tracing(
        logging::SERVICE_NAME,
        args.otlp_endpoint.as_deref(),
        &args.log_level,
    )?;

    let result = run(args).await;

    if let Some(provider) = tracer_provider
        && let Err(e) = provider.shutdown()
    {
        log::warn!("Failed to flush traces: {}", e);
    }

    result
}

async fn run(args: Args) -> Result<()> {
    log::debug!("Loading configuration");
    let mut config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .wrap_err("Failed to load playlist-server config")?;

    match args.command {
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                let path = Config::create_default()?;
                log::info!("Default config written to {}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
        Commands::Migrate => {
            let database = Database::open(&config.database_path()).await?;
            database.migrate().await?;
            log::info!("Database is up to date");
        }
        Commands::Serve { port, static_dir } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(static_dir) = static_dir {
                config.set_static_dir(&static_dir);
            }

            log::debug!("Opening database at: {}", config.database_path().display());
            let database = Database::open(&config.database_path()).await?;

            let pending = database.pending_migrations().await?;
            if pending > 0 {
                return Err(eyre!(
                    "{} pending migration(s); run `playlist-server migrate` first",
                    pending
                ));
            }

            log::info!("Starting HTTP server on port: {}", config.port);
            http_server::app::start(HttpServerConfig {
                port: config.port,
                database: Arc::new(database),
                static_dir: config.static_dir(),
                max_upload_bytes: config.max_upload_bytes,
            })
            .await?;
        }
    }

    Ok(())
}
