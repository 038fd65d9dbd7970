use serde::Serialize;

use crate::types::{FileListing, Project, Release};

#[derive(Debug, Serialize)]
pub struct ReleaseWithFiles {
    #[serde(flatten)]
    pub release: Release,
    pub files: Vec<FileListing>,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    pub project: Project,
    pub releases: Vec<ReleaseWithFiles>,
}
