use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use scholar_match::config::{CacheSettings, LoggingSettings, Settings};
use scholar_match::error::{handle_json_payload_error, handle_query_payload_error};
use scholar_match::routes::{self, AppState};
use scholar_match::services::{
    CacheManager, IdentityVerifier, ListingCatalog, Mailer, PostgresClient, ProcessExtractor, ReminderWorker,
    TokenService,
};

fn init_tracing(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "full" => subscriber.init(),
        _ => subscriber.compact().init(),
    }
}

async fn build_cache(settings: &CacheSettings) -> CacheManager {
    let ttl = settings.ttl_secs.unwrap_or(300);
    let l1_size = settings.l1_cache_size.unwrap_or(64);

    let Some(redis_url) = settings.redis_url.as_deref().filter(|u| !u.is_empty()) else {
        info!("No Redis configured, caching listings in memory (L1: {} entries, TTL: {}s)", l1_size, ttl);
        return CacheManager::memory_only(l1_size, ttl);
    };

    match CacheManager::connect(redis_url, l1_size, ttl).await {
        Ok(cache) => {
            info!("Cache manager initialized (L1: {} entries, TTL: {}s)", l1_size, ttl);
            cache
        }
        Err(e) => {
            warn!("Failed to connect to Redis ({}), caching listings in memory only", e);
            CacheManager::memory_only(l1_size, ttl)
        }
    }
}

fn build_cors(frontend_url: Option<&str>) -> Cors {
    match frontend_url.filter(|u| !u.is_empty()) {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
            .supports_credentials(),
        None => Cors::permissive(),
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(io::Error::other(e.to_string()));
        }
    };

    init_tracing(&settings.logging);
    info!("Starting Scholar Match service...");

    let cache = Arc::new(build_cache(&settings.cache).await);

    let postgres = Arc::new(
        PostgresClient::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .map_err(|e| {
            error!("Failed to connect to PostgreSQL: {}", e);
            io::Error::other(e.to_string())
        })?,
    );

    info!("PostgreSQL client initialized");

    let tokens = Arc::new(TokenService::new(
        &settings.auth.jwt_secret,
        settings.auth.token_ttl_hours,
        settings.auth.bcrypt_cost,
    ));
    if settings.auth.jwt_secret == "devsecret" {
        warn!("Using the development JWT secret; set JWT_SECRET in production");
    }

    let identity = Arc::new(
        IdentityVerifier::new(settings.firebase.project_id.clone(), settings.firebase.jwks_url.clone())
            .map_err(|e| io::Error::other(e.to_string()))?,
    );
    if !identity.is_configured() {
        warn!("Firebase project not configured; Google sign-in is disabled");
    }

    let mailer = Arc::new(Mailer::from_settings(&settings.mail).unwrap_or_else(|e| {
        warn!("Invalid mail settings ({}), eligibility emails are disabled", e);
        Mailer::disabled()
    }));

    let extractor = Arc::new(
        ProcessExtractor::from_settings(&settings.extractor).map_err(|e| io::Error::other(e.to_string()))?,
    );

    if settings.notifications.reminders_enabled {
        ReminderWorker::new(
            postgres.clone(),
            Duration::from_secs(settings.notifications.reminder_interval_secs),
            settings.notifications.reminder_window_days,
        )
        .spawn();
    }

    // Build application state
    let app_state = AppState {
        catalog: Arc::new(ListingCatalog::new(postgres.clone(), cache)),
        postgres,
        tokens,
        identity,
        mailer,
        extractor,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);
    let frontend_url = settings.server.frontend_url.clone();

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(build_cors(frontend_url.as_deref()))
            .wrap(routes::default_headers())
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
