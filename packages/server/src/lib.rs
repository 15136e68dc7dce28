#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the EcoPulse map.
//!
//! Loads the score CSV files into memory at startup, serves the score
//! API the map frontend fetches from, computes complete map views
//! server-side, and serves the static frontend files.

mod handlers;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use ecopulse_dataset::DatasetCache;
use ecopulse_geography::CityRegistry;
use ecopulse_ingest::{ScoreStore, paths};
use ecopulse_score_models::FORECAST_YEAR;
use ecopulse_session::Engine;

/// Environment variable naming the static frontend directory.
pub const FRONTEND_DIR_ENV: &str = "ECOPULSE_FRONTEND_DIR";

/// City boundaries file inside the frontend directory.
pub const CITIES_FILE: &str = "tr-cities.json";

/// Server settings, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: String,
    /// Port to listen on.
    pub port: u16,
    /// Directory holding the score CSV files.
    pub data_dir: PathBuf,
    /// Directory the static frontend is served from.
    pub frontend_dir: PathBuf,
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT`, `ECOPULSE_DATA_DIR` and
    /// `ECOPULSE_FRONTEND_DIR`, falling back to `127.0.0.1:8080`, `data/`
    /// and `frontend/`.
    #[must_use]
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let frontend_dir = std::env::var_os(FRONTEND_DIR_ENV)
            .map_or_else(|| PathBuf::from("frontend"), PathBuf::from);

        Self {
            bind_addr,
            port,
            data_dir: paths::data_dir(),
            frontend_dir,
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Raw score records, for the score and daily endpoints.
    pub store: Arc<ScoreStore>,
    /// View computation over the same records.
    pub engine: Arc<Engine>,
    /// Directory the frontend is served from.
    pub frontend_dir: PathBuf,
}

impl AppState {
    /// Builds the state around a loaded store. The store also backs the
    /// engine's dataset cache.
    #[must_use]
    pub fn new(store: ScoreStore, registry: Option<CityRegistry>, frontend_dir: PathBuf) -> Self {
        let store = Arc::new(store);
        let baseline = store.yearly_averages();
        let forecast = store.dataset_for_year(FORECAST_YEAR);
        let cache = Arc::new(DatasetCache::new(Arc::clone(&store) as _));

        Self {
            engine: Arc::new(Engine::new(cache, baseline, forecast, registry)),
            store,
            frontend_dir,
        }
    }
}

/// Registers the `/api` routes.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/scores/yearly", web::get().to(handlers::yearly_scores))
            .route("/scores/{year}", web::get().to(handlers::year_scores))
            .route("/daily/{city}", web::get().to(handlers::daily_today))
            .route("/view", web::get().to(handlers::view)),
    );
}

/// Starts the EcoPulse API server.
///
/// Loads the score files, the city registry, and starts the Actix-Web
/// HTTP server. The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();

    log::info!("Loading score data from {}...", config.data_dir.display());
    let store = ScoreStore::load(&config.data_dir);
    let registry = load_registry(&config.frontend_dir);

    let state = web::Data::new(AppState::new(store, registry, config.frontend_dir.clone()));
    let frontend_dir = config.frontend_dir;

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api)
            .service(Files::new("/frontend", frontend_dir.clone()))
            .route("/", web::get().to(handlers::index))
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}

/// The map's city registry, or `None` (views then list only cities with
/// data) if the boundaries file cannot be loaded.
fn load_registry(frontend_dir: &Path) -> Option<CityRegistry> {
    let path = frontend_dir.join(CITIES_FILE);
    match CityRegistry::from_path(&path) {
        Ok(registry) => {
            log::info!("Loaded {} cities from {}", registry.len(), path.display());
            Some(registry)
        }
        Err(e) => {
            log::warn!("No city registry ({}): {e}", path.display());
            None
        }
    }
}
