use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use atelier::{
    Config, assets,
    catalog::{CatalogStore, JsonCatalog},
    create_app, startup_checks, storage,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web server (default if no command specified)
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,

        /// Automatically quit after specified number of seconds (useful for testing)
        #[arg(long)]
        quit_after: Option<u64>,
    },

    /// Inspect and maintain the asset catalog
    #[command(subcommand)]
    Asset(AssetCommands),
}

#[derive(Subcommand, Debug)]
enum AssetCommands {
    /// List assets, optionally restricted to one category
    List {
        #[arg(short = 'C', long)]
        category: Option<String>,
    },
    /// List folders with per-category asset counts
    Categories,
    /// Remove one asset, deleting its backing object first
    Remove {
        /// Asset id to remove
        id: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set up logging first
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Some(Commands::Asset(asset_cmd)) => handle_asset_command(cli.config, asset_cmd).await,
        Some(Commands::Serve {
            port,
            host,
            quit_after,
        }) => run_server(cli.config, port, host, quit_after).await,
        None => {
            // Default to serve command if no subcommand specified
            run_server(cli.config, None, None, None).await
        }
    }
}

fn load_config(config_path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
    if config_path.exists() {
        let config_content = std::fs::read_to_string(config_path)?;
        Ok(toml_edit::de::from_str::<Config>(&config_content)?)
    } else {
        info!("Config file not found at {:?}, using defaults", config_path);
        Ok(Config::default())
    }
}

async fn handle_asset_command(
    config_path: PathBuf,
    cmd: AssetCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path)?;
    let catalog: atelier::catalog::SharedCatalog =
        std::sync::Arc::new(JsonCatalog::load_or_create(&config.catalog.file).await?);

    match cmd {
        AssetCommands::List { category } => {
            let mut rows = catalog.all_assets().await?;
            if let Some(category) = &category {
                rows.retain(|a| a.in_category(category));
            }
            if rows.is_empty() {
                println!("No assets found");
                return Ok(());
            }
            rows.sort_by(atelier::catalog::compare_catalog_order);
            for asset in rows {
                println!(
                    "  {:>6}  {:<16}  {:<6}  {}",
                    asset.id,
                    asset.display_category(),
                    asset
                        .sort_order
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    asset.title.as_deref().unwrap_or(&asset.media_url),
                );
            }
        }
        AssetCommands::Categories => {
            let snapshot = catalog.all_assets().await?;
            let vocabulary: Vec<&str> = config
                .library
                .known_categories
                .iter()
                .map(|c| c.as_str())
                .collect();
            for folder in assets::folder_index(&snapshot, &vocabulary) {
                println!("  {:<20} {}", folder.name, folder.count);
            }
        }
        AssetCommands::Remove { id } => {
            let gateway =
                storage::create_gateway(&config.storage, config.app.base_url.as_deref());
            let library = assets::AssetLibrary::new(
                gateway,
                catalog,
                config.library.clone(),
                config.storage.public_prefix.clone(),
            );
            match library.delete_asset(id).await {
                Ok(()) => println!("Removed asset {}", id),
                Err(e) => {
                    eprintln!("Error: failed to remove asset {}: {}", id, e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

async fn run_server(
    config_path: PathBuf,
    port: Option<u16>,
    host: Option<String>,
    quit_after: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path)?;

    let host = host.unwrap_or(config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info!("Starting {} server", config.app.name);
    info!("Configuration loaded from: {:?}", config_path);
    info!("Storage root directory: {:?}", config.storage.root_directory);
    info!("Catalog file: {:?}", config.catalog.file);

    // Perform startup checks
    match startup_checks::perform_startup_checks(&config).await {
        Ok(()) => info!("All startup checks passed"),
        Err(errors) => {
            for error in &errors {
                tracing::error!("Startup check failed: {}", error);
            }
            if startup_checks::has_critical_error(&errors) {
                tracing::error!("Critical startup check failed, exiting");
                return Err("Critical startup check failed".into());
            }
        }
    }

    let app = create_app(config).await?;

    let addr = SocketAddr::from((host.parse::<std::net::IpAddr>()?, port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Add ConnectInfo layer to track client IPs
    let app = app.into_make_service_with_connect_info::<SocketAddr>();

    // Set up graceful shutdown
    let server = axum::serve(listener, app);
    let graceful = server.with_graceful_shutdown(shutdown_signal(quit_after));

    if let Err(e) = graceful.await {
        tracing::error!("Server error: {}", e);
    }

    info!("Shutting down");
    Ok(())
}

async fn shutdown_signal(quit_after: Option<u64>) {
    use tokio::signal;
    use tokio::time::{Duration, sleep};

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let quit_timer = async {
        if let Some(seconds) = quit_after {
            info!(
                "Server will automatically shut down after {} seconds",
                seconds
            );
            sleep(Duration::from_secs(seconds)).await;
            info!("Quit timer expired, shutting down");
        } else {
            std::future::pending::<()>().await
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        },
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        },
        _ = quit_timer => {},
    }
}
