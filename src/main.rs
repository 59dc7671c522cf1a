use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;
use travalpass_match::config::{Settings, SourceKind};
use travalpass_match::core::Matcher;
use travalpass_match::routes::{self, itineraries::AppState};
use travalpass_match::services::{CacheManager, CandidateSource, FirestoreClient, PostgresClient};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

fn startup_error(message: String) -> std::io::Error {
    error!("{}", message);
    std::io::Error::new(std::io::ErrorKind::Other, message)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();

    // LOG_LEVEL / LOG_FORMAT win over the config file
    let logging = settings.as_ref().map(|s| s.logging.clone()).unwrap_or_default();
    let log_level = std::env::var("LOG_LEVEL").unwrap_or(logging.level);
    let log_format = std::env::var("LOG_FORMAT").unwrap_or(logging.format);
    init_tracing(&log_level, &log_format);

    info!("Starting TravalPass match service...");

    let settings = settings.map_err(|e| startup_error(format!("Failed to load configuration: {}", e)))?;

    info!("Configuration loaded successfully");

    let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);
    let l1_ttl = settings.cache.l1_ttl_secs.unwrap_or(10);

    let cache = CacheManager::new(&settings.cache.redis_url, l1_cache_size, l1_ttl, cache_ttl)
        .await
        .map_err(|e| startup_error(format!("Failed to connect to Redis: {}", e)))?;

    info!(
        "Cache manager initialized (L1: {} entries, {}s; L2 TTL: {}s)",
        l1_cache_size, l1_ttl, cache_ttl
    );

    let db_max_conn = settings.database.max_connections.unwrap_or(10);

    let postgres = Arc::new(
        PostgresClient::from_settings(
            &settings.database.url,
            Some(db_max_conn),
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .map_err(|e| startup_error(format!("Failed to connect to PostgreSQL: {}", e)))?,
    );

    info!("PostgreSQL client initialized (max: {} connections)", db_max_conn);

    let source = match settings.matching.candidate_source {
        SourceKind::Postgres => CandidateSource::Postgres(postgres.clone()),
        SourceKind::Firestore => {
            let firestore = settings.firestore.clone().ok_or_else(|| {
                startup_error("candidate_source is firestore but [firestore] is not configured".to_string())
            })?;

            let client = FirestoreClient::new(
                firestore.base_url,
                firestore.project_id,
                firestore.database_id,
                firestore.collection,
                firestore.access_token,
                Duration::from_secs(firestore.timeout_secs.unwrap_or(30)),
            )
            .map_err(|e| startup_error(format!("Failed to create Firestore client: {}", e)))?;

            CandidateSource::Firestore(Arc::new(client))
        }
    };

    info!("Candidate source: {}", source.name());

    let matcher = Matcher::new(settings.matching.max_limit as usize);

    let app_state = AppState {
        postgres,
        cache: Arc::new(cache),
        source,
        matcher,
        default_limit: settings.matching.default_limit as usize,
        fetch_limit: settings.matching.fetch_limit,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
