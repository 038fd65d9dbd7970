mod schema;
mod sqlite;

pub use schema::SCHEMA_VERSION;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the registry interface over projects, releases, platforms
/// and files.
///
/// Lookups return `Ok(None)` when nothing matches. Adds return the new
/// surrogate id, or `Error::AlreadyExists` when a unique key collides.
pub trait Store: Send + Sync {
    /// Brings the schema up to [`SCHEMA_VERSION`]. A no-op when already there.
    fn initialize(&self) -> Result<()>;
    fn schema_version(&self) -> Result<u32>;

    // Project operations
    fn create_project(&self, project: &NewProject) -> Result<i64>;
    fn get_project(&self, id: i64) -> Result<Option<Project>>;
    fn get_project_by_slug(&self, slug: &str) -> Result<Option<Project>>;
    fn list_projects(&self) -> Result<Vec<ProjectSummary>>;

    // Release operations
    fn create_release(&self, release: &NewRelease) -> Result<i64>;
    fn get_release(&self, id: i64) -> Result<Option<Release>>;
    fn get_release_by_project_slug_and_version(
        &self,
        project_slug: &str,
        version: &str,
    ) -> Result<Option<Release>>;
    fn list_public_releases_by_project_slug(&self, project_slug: &str) -> Result<Vec<Release>>;

    // Platform operations
    fn create_platform(&self, platform: &NewPlatform) -> Result<i64>;
    fn get_platform(&self, id: i64) -> Result<Option<Platform>>;
    fn get_platform_by_slug(&self, slug: &str) -> Result<Option<Platform>>;
    fn list_platforms(&self) -> Result<Vec<Platform>>;

    // File operations
    fn create_file(&self, file: &NewFile) -> Result<i64>;
    fn get_file(&self, id: i64) -> Result<Option<File>>;
    fn get_file_by_key(&self, key: &ArtifactKey) -> Result<Option<ResolvedFile>>;
    fn list_files_by_project(&self, project_id: i64) -> Result<Vec<FileListing>>;

    /// Adds one to a file's download counter in place. Returns false when no
    /// row has that id.
    fn increment_file_downloads(&self, id: i64) -> Result<bool>;

    fn close(&self) -> Result<()>;
}
