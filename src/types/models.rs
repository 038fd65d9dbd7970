use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A project with counters derived from its releases and files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    pub release_count: i64,
    pub total_downloads: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: i64,
    pub project_id: i64,
    pub version: String,
    pub semver: String,
    pub release_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discussion_url: Option<String>,
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub id: i64,
    pub project_id: i64,
    pub release_id: i64,
    pub platform_id: i64,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub sha256: String,
    pub downloads: i64,
}

/// A file row with its platform joined in, for per-project listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileListing {
    #[serde(flatten)]
    pub file: File,
    pub platform_name: String,
    pub platform_slug: String,
}

/// A file row resolved through its natural key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedFile {
    #[serde(flatten)]
    pub file: File,
    pub project_slug: String,
    pub platform_slug: String,
    pub version: String,
}

/// The human-facing address of an artifact: `project/platform/version/filename`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct ArtifactKey {
    pub project: String,
    pub platform: String,
    pub version: String,
    pub filename: String,
}

impl ArtifactKey {
    pub fn new(
        project: impl Into<String>,
        platform: impl Into<String>,
        version: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            platform: platform.into(),
            version: version.into(),
            filename: filename.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub slug: String,
    pub vcs_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewRelease {
    pub project_id: i64,
    pub version: String,
    pub semver: String,
    pub release_date: NaiveDate,
    pub vcs_tag: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub changelog: Option<String>,
    pub discussion_url: Option<String>,
    pub public: bool,
}

#[derive(Debug, Clone)]
pub struct NewPlatform {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone)]
pub struct NewFile {
    pub project_id: i64,
    pub release_id: i64,
    pub platform_id: i64,
    pub filename: String,
    pub content_type: Option<String>,
    pub sha256: String,
}
