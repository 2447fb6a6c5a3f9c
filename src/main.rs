use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use lifedrops::config::{LoggingSettings, Settings, StoreBackend};
use lifedrops::core::{DonorMatcher, EligibilityPolicy};
use lifedrops::routes::{self, AppState};
use lifedrops::services::{
    CandidateCache, DonorStore, FirestoreClient, FirestoreCollections, FirestoreOptions,
    MemoryStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn build_store(settings: &Settings) -> std::io::Result<Arc<dyn DonorStore>> {
    match settings.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory donor store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Firestore => {
            let fs = &settings.firestore;
            if fs.project_id.is_empty() {
                error!("firestore.project_id is required for the firestore backend");
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "missing firestore.project_id",
                ));
            }

            let client = FirestoreClient::new(FirestoreOptions {
                endpoint: fs.endpoint.clone(),
                project_id: fs.project_id.clone(),
                database_id: fs.database_id.clone(),
                api_key: fs.api_key.clone(),
                bearer_token: fs.bearer_token.clone(),
                request_timeout: Duration::from_secs(fs.request_timeout_secs),
                collections: FirestoreCollections {
                    users: fs.users_collection.clone(),
                    requests: fs.requests_collection.clone(),
                },
            })
            .map_err(|e| {
                error!("Failed to create Firestore client: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;

            info!("Firestore client initialized for project {}", fs.project_id);
            Ok(Arc::new(client))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging);
    info!("Starting LifeDrops matching service...");

    let store = build_store(&settings)?;

    let cache = if settings.cache.enabled {
        info!(
            "Candidate cache enabled ({} entries, TTL: {}s)",
            settings.cache.max_entries, settings.cache.ttl_secs
        );
        Some(Arc::new(CandidateCache::new(
            settings.cache.max_entries,
            settings.cache.ttl_secs,
        )))
    } else {
        None
    };

    let policy = EligibilityPolicy::new(settings.matching.eligibility_window_days);
    let mut matcher = DonorMatcher::new(policy);
    if let Some(max_results) = settings.matching.max_results {
        matcher = matcher.with_max_results(max_results);
    }

    info!("Matcher initialized with policy: {:?}", policy);

    let app_state = AppState {
        store,
        cache,
        matcher,
        query_timeout: Duration::from_secs(settings.store.query_timeout_secs),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .configure(routes::configure_extractors)
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
