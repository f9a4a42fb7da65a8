use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use shelfwise_api::{AuthConfig, RestApi, ACCESS_TOKEN_EXPIRE_MINUTES};
use shelfwise_core::{CategoryScheme, RecommenderConfig, DEFAULT_NEIGHBORS};
use shelfwise_storage::{CatalogManager, StoreConfig};

const DEV_SECRET_KEY: &str = "shelfwise-dev-secret";

/// Book catalog service with category-based recommendations
#[derive(Parser, Debug)]
#[command(name = "shelfwise")]
#[command(about = "Book catalog and recommendation service", long_about = None)]
struct Args {
    /// Path to the catalog JSON file
    #[arg(short, long, env = "SHELFWISE_CATALOG", default_value = "./books.json")]
    catalog: PathBuf,

    /// Persist the fitted index here and reuse it on restart
    #[arg(long, env = "SHELFWISE_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Category table: flat or grouped
    #[arg(long, default_value = "flat")]
    category_scheme: CategoryScheme,

    /// Neighbor count the index is fitted for; also the minimum number of
    /// books with a known category needed to start the recommender
    #[arg(long, default_value_t = DEFAULT_NEIGHBORS)]
    neighbors: usize,

    /// HTTP API port
    #[arg(long, default_value_t = 8000)]
    http_port: u16,

    /// Secret used to sign access tokens
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// Access token lifetime in minutes
    #[arg(long, default_value_t = ACCESS_TOKEN_EXPIRE_MINUTES)]
    token_ttl_minutes: i64,

    #[arg(long, env = "SHELFWISE_ADMIN_USER", default_value = "admin")]
    admin_username: String,

    #[arg(long, env = "SHELFWISE_ADMIN_PASSWORD", default_value = "admin123", hide_env_values = true)]
    admin_password: String,

    /// Seconds a client has to send the request head
    #[arg(long, default_value_t = 5)]
    request_timeout_secs: u64,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting shelfwise v{}", env!("CARGO_PKG_VERSION"));
    info!("Catalog: {:?}", args.catalog);
    info!("Category scheme: {}", args.category_scheme);
    info!("HTTP API port: {}", args.http_port);

    let secret = match args.secret_key {
        Some(secret) => secret,
        None => {
            warn!("SECRET_KEY not set, signing tokens with the development secret");
            DEV_SECRET_KEY.to_string()
        }
    };
    let auth = Arc::new(AuthConfig::new(
        &secret,
        args.token_ttl_minutes,
        args.admin_username,
        args.admin_password,
    )?);

    let config = StoreConfig {
        catalog_path: args.catalog,
        snapshot_path: args.snapshot,
        scheme: args.category_scheme,
        recommender: RecommenderConfig {
            n_neighbors: args.neighbors,
            ..RecommenderConfig::default()
        },
    };
    let manager = Arc::new(CatalogManager::open(&config));
    info!(
        "Catalog loaded: {} books, recommender {}",
        manager.catalog().len(),
        if manager.is_recommender_ready() { "ready" } else { "unavailable" }
    );

    let http_port = args.http_port;
    let request_timeout = Duration::from_secs(args.request_timeout_secs);
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(manager, auth, http_port, request_timeout).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("shelfwise started successfully");
    info!("HTTP API: http://localhost:{}/api/v1/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
