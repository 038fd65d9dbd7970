use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::IntoResponse,
};

use crate::delivery::{CacheDirectives, Delivery, content_disposition};
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};
use crate::types::ArtifactKey;

static X_ACCEL_REDIRECT: HeaderName = HeaderName::from_static("x-accel-redirect");
static CONTENT_TRANSFER_ENCODING: HeaderName =
    HeaderName::from_static("content-transfer-encoding");

/// Counts the download and answers with headers only; the front web server
/// picks up `X-Accel-Redirect` and streams the bytes.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(key): Path<ArtifactKey>,
) -> impl IntoResponse {
    let delivery = state
        .resolver
        .resolve_and_deliver(&key)
        .or_not_found("File not found")?;

    let headers = delivery_headers(&delivery)?;
    Ok::<_, ApiError>((StatusCode::OK, headers))
}

pub async fn stats_json(
    State(state): State<Arc<AppState>>,
    Path(key): Path<ArtifactKey>,
) -> impl IntoResponse {
    let info = state.resolver.info(&key).or_not_found("File not found")?;

    Ok::<_, ApiError>((
        cache_headers(&CacheDirectives::default()),
        Json(ApiResponse::success(info)),
    ))
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    Path(key): Path<ArtifactKey>,
) -> impl IntoResponse {
    let info = state.resolver.info(&key).or_not_found("File not found")?;

    let body = format!(
        "{}{}\ndownloads: {}\nsha256: {}\n",
        info.path, info.filename, info.downloads, info.sha256
    );
    Ok::<_, ApiError>((
        cache_headers(&CacheDirectives::default()),
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    ))
}

fn cache_headers(cache: &CacheDirectives) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache.cache_control),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static(cache.pragma));
    headers.insert(header::EXPIRES, HeaderValue::from_static(cache.expires));
    headers
}

fn delivery_headers(delivery: &Delivery) -> Result<HeaderMap, ApiError> {
    let mut headers = cache_headers(&delivery.cache);

    let content_type = HeaderValue::from_str(&delivery.content_type).map_err(|_| {
        tracing::error!("Stored content type is not a valid header: {:?}", delivery.content_type);
        ApiError::internal("Invalid content type")
    })?;
    headers.insert(header::CONTENT_TYPE, content_type);

    let disposition = content_disposition(delivery.disposition, &delivery.filename);
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|_| ApiError::internal("Invalid filename"))?;
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    if delivery.binary {
        headers.insert(
            CONTENT_TRANSFER_ENCODING.clone(),
            HeaderValue::from_static("Binary"),
        );
    }

    let target = HeaderValue::from_str(&encode_target(&delivery.delegation_target))
        .map_err(|_| ApiError::internal("Invalid delegation target"))?;
    headers.insert(X_ACCEL_REDIRECT.clone(), target);

    Ok(headers)
}

/// Percent-encodes each path segment so the target is a valid URI.
fn encode_target(target: &str) -> String {
    target
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
