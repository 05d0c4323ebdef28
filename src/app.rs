use crate::cache::ResponseCache;
use crate::config::{Config, CorsOrigins};
use crate::omdb::{OmdbApi, OmdbClient};
use crate::store::{MemoryStore, PgStore, Store};
use crate::tmdb::{TmdbApi, TmdbClient};
use crate::{catalog, users, watchlists};
use anyhow::Result;
use axum::{
    extract::State,
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

const MAX_BODY_BYTES: usize = 1024 * 1024; // 1MB safety cap

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tmdb: Arc<dyn TmdbApi>,
    pub omdb: Arc<dyn OmdbApi>,
    /// Region used for streaming availability when a request names none.
    pub watch_region: String,
}

pub async fn run_server(config: Config) -> Result<()> {
    let cache = ResponseCache::new();
    let tmdb = TmdbClient::new(config.tmdb_api_key.clone(), config.tmdb_base_url.clone(), cache.clone())?;
    let omdb = OmdbClient::new(config.omdb_api_key.clone(), config.omdb_base_url.clone(), cache)?;
    if !tmdb.is_configured() {
        warn!("TMDB_API_KEY not set; catalog endpoints will return defaults");
    }
    if !omdb.is_configured() {
        warn!("OMDB_API_KEY not set; ratings will be empty");
    }

    let store: Arc<dyn Store> = match config.database_url.as_deref() {
        Some(url) => Arc::new(PgStore::connect(url, config.db_name.as_deref()).await?),
        None => {
            warn!("DATABASE_URL not set; using in-memory store (data is lost on restart)");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState {
        store,
        tmdb: Arc::new(tmdb),
        omdb: Arc::new(omdb),
        watch_region: config.watch_region.clone(),
    };

    let app = build_router(state).layer(cors_layer(&config.cors_origins));

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/users", users::router())
        .nest("/watchlists", watchlists::router())
        .nest("/catalog", catalog::router())
        .nest("/tmdb", catalog::router())
        .route("/ratings/:imdb_id", get(catalog::get_ratings))
        .route("/omdb/:imdb_id", get(catalog::get_ratings));

    Router::new()
        .nest("/api", api)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    match origins {
        CorsOrigins::Any => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsOrigins::List(list) => {
            let parsed: Vec<HeaderValue> = list
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(v) => Some(v),
                    Err(_) => {
                        warn!("Ignoring invalid CORS origin {:?}", o);
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parsed))
                .allow_methods(AllowMethods::list([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ]))
                .allow_headers(AllowHeaders::mirror_request())
                .allow_credentials(true)
        }
    }
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "CineVault API", "version": env!("CARGO_PKG_VERSION") }))
}

fn configured(flag: bool) -> &'static str {
    if flag {
        "configured"
    } else {
        "not_configured"
    }
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "tmdb_api": configured(state.tmdb.is_configured()),
        "omdb_api": configured(state.omdb.is_configured()),
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
