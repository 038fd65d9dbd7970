use std::sync::Arc;

use serde::Serialize;

use super::negotiate::{CacheDirectives, Disposition, negotiate};
use crate::store::Store;
use crate::types::{ArtifactKey, ResolvedFile};

/// Everything the HTTP layer needs to hand an artifact to the accelerated
/// file server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub content_type: String,
    pub disposition: Disposition,
    pub filename: String,
    /// Whether `Content-Transfer-Encoding: Binary` applies.
    pub binary: bool,
    pub delegation_target: String,
    pub cache: CacheDirectives,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactInfo {
    /// `project/platform/version/`, the directory part of the artifact path.
    pub path: String,
    pub filename: String,
    pub downloads: i64,
    pub project: String,
    pub platform: String,
    pub version: String,
    pub sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Resolves natural keys to artifacts and decides how they are delivered.
///
/// Reads that fail are reported as not found and a failed counter update
/// never blocks delivery; both are logged.
pub struct Resolver {
    store: Arc<dyn Store>,
    internal_prefix: String,
}

impl Resolver {
    pub fn new(store: Arc<dyn Store>, internal_prefix: &str) -> Self {
        Self {
            store,
            internal_prefix: normalize_prefix(internal_prefix),
        }
    }

    pub fn internal_prefix(&self) -> &str {
        &self.internal_prefix
    }

    /// Looks the artifact up, counts the download and returns how to deliver
    /// it. `None` means no such artifact.
    pub fn resolve_and_deliver(&self, key: &ArtifactKey) -> Option<Delivery> {
        let resolved = self.lookup(key)?;

        match self.store.increment_file_downloads(resolved.file.id) {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                "Download count not recorded for file {}: row vanished",
                resolved.file.id
            ),
            Err(e) => tracing::warn!(
                "Failed to record download for file {}: {e}",
                resolved.file.id
            ),
        }

        let negotiated = negotiate(resolved.file.content_type.as_deref());

        Some(Delivery {
            content_type: negotiated.content_type,
            disposition: negotiated.disposition,
            delegation_target: self.delegation_target(&resolved),
            filename: resolved.file.filename,
            binary: negotiated.binary,
            cache: CacheDirectives::default(),
        })
    }

    /// Read-only counterpart of [`Resolver::resolve_and_deliver`]; the counter
    /// is left untouched.
    pub fn info(&self, key: &ArtifactKey) -> Option<ArtifactInfo> {
        let resolved = self.lookup(key)?;

        Some(ArtifactInfo {
            path: format!(
                "{}/{}/{}/",
                resolved.project_slug, resolved.platform_slug, resolved.version
            ),
            filename: resolved.file.filename,
            downloads: resolved.file.downloads,
            project: resolved.project_slug,
            platform: resolved.platform_slug,
            version: resolved.version,
            sha256: resolved.file.sha256,
            content_type: resolved.file.content_type,
        })
    }

    fn lookup(&self, key: &ArtifactKey) -> Option<ResolvedFile> {
        match self.store.get_file_by_key(key) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(
                    "Artifact lookup failed for {}/{}/{}/{}: {e}",
                    key.project,
                    key.platform,
                    key.version,
                    key.filename
                );
                None
            }
        }
    }

    fn delegation_target(&self, resolved: &ResolvedFile) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.internal_prefix,
            resolved.project_slug,
            resolved.platform_slug,
            resolved.version,
            resolved.file.filename
        )
    }
}

/// `internal/`, `/internal/` and `/internal` all become `/internal`.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
