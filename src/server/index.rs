use std::cmp::Ordering;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use semver::Version;

use crate::server::AppState;
use crate::server::dto::{ProjectDetail, ReleaseWithFiles};
use crate::server::response::{ApiError, ApiResponse, FailOpenExt, StoreOptionExt};
use crate::types::Release;

pub async fn list_projects(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let projects = state.store.list_projects().or_logged_default("list projects");

    Json(ApiResponse::success(projects))
}

pub async fn list_platforms(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let platforms = state
        .store
        .list_platforms()
        .or_logged_default("list platforms");

    Json(ApiResponse::success(platforms))
}

pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    let project = state
        .store
        .get_project_by_slug(&slug)
        .or_logged_default("look up project")
        .or_not_found("Project not found")?;

    let mut releases = state
        .store
        .list_public_releases_by_project_slug(&slug)
        .or_logged_default("list releases");
    sort_by_semver_desc(&mut releases);

    let files = state
        .store
        .list_files_by_project(project.id)
        .or_logged_default("list files");

    let releases = releases
        .into_iter()
        .map(|release| ReleaseWithFiles {
            files: files
                .iter()
                .filter(|f| f.file.release_id == release.id)
                .cloned()
                .collect(),
            release,
        })
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(ProjectDetail { project, releases })))
}

/// Parses a release's `semver` field, accepting a leading `v` and short
/// `1` / `1.2` forms.
fn parse_lenient(raw: &str) -> Option<Version> {
    let raw = raw.trim();
    let raw = raw.strip_prefix(['v', 'V']).unwrap_or(raw);
    if let Ok(v) = Version::parse(raw) {
        return Some(v);
    }

    let split = raw.find(['-', '+']).unwrap_or(raw.len());
    let (core, suffix) = raw.split_at(split);
    let padded = match core.split('.').count() {
        1 => format!("{core}.0.0{suffix}"),
        2 => format!("{core}.0{suffix}"),
        _ => return None,
    };
    Version::parse(&padded).ok()
}

/// Newest version first. Versions that cannot be parsed go last and keep
/// their incoming (release date) order.
fn sort_by_semver_desc(releases: &mut [Release]) {
    releases.sort_by(|a, b| {
        match (parse_lenient(&a.semver), parse_lenient(&b.semver)) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}
