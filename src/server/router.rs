use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::{files, index};
use crate::config::ServerConfig;
use crate::delivery::Resolver;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub resolver: Resolver,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: &ServerConfig) -> Self {
        Self {
            resolver: Resolver::new(Arc::clone(&store), &config.internal_prefix),
            store,
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/projects", get(index::list_projects))
        .route("/api/v1/projects/{slug}", get(index::get_project))
        .route("/api/v1/platforms", get(index::list_platforms))
        .route(
            "/files/{project}/{platform}/{version}/{filename}",
            get(files::download),
        )
        .route(
            "/files/{project}/{platform}/{version}/{filename}/stats",
            get(files::stats),
        )
        .route(
            "/files/{project}/{platform}/{version}/{filename}/stats/json",
            get(files::stats_json),
        )
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
