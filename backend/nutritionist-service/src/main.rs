use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use db_pool::create_pool;
use nutritionist_service::db::PgRecordStore;
use nutritionist_service::handlers;
use nutritionist_service::services::CdnImageResolver;
use nutritionist_service::{AppState, Config};
use std::io;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Nutritionist Service
///
/// # Routes
///
/// - `GET /home/topNu` - Top-rated nutritionists
/// - `GET /nutritionists?page&userid` - Paginated directory
/// - `GET /nutritionist?nutritionistid&userid` - Profile
/// - `GET /health`, `GET /metrics`
///
/// Runs on port 8090 by default (NUTRITIONIST_SERVICE_PORT).
#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting nutritionist-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    config.database.log_config();
    let pool = match create_pool(config.database.clone()).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Connected to database via db-pool crate");

    let store = Arc::new(PgRecordStore::new(pool));
    let images = Arc::new(CdnImageResolver::new(config.images.base_url.clone()));
    let state = web::Data::new(AppState::new(store, images, &config.ranking));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let cors_config = config.cors.clone();
    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in cors_config.origins() {
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allowed_methods(vec!["GET"]).allow_any_header().max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(TracingLogger::default())
            .route("/health", web::get().to(health))
            .route(
                "/metrics",
                web::get().to(nutritionist_service::metrics::serve_metrics),
            )
            .configure(handlers::register_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
