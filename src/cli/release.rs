use chrono::{NaiveDate, Utc};

use crate::server::validation::validate_version;
use crate::store::Store;
use crate::types::NewRelease;

use super::init_store;

pub struct ReleaseArgs {
    pub project: String,
    pub version: String,
    pub semver: Option<String>,
    pub date: Option<String>,
    pub vcs_tag: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub changelog: Option<String>,
    pub discussion_url: Option<String>,
    pub private: bool,
}

pub fn run_release_add(data_dir: String, args: ReleaseArgs) -> anyhow::Result<()> {
    validate_version(&args.version).map_err(anyhow::Error::msg)?;

    let release_date = match args.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("Invalid --date '{raw}' (expected YYYY-MM-DD): {e}"))?,
        None => Utc::now().date_naive(),
    };

    let store = init_store(&data_dir)?;
    let project = store
        .get_project_by_slug(&args.project)?
        .ok_or_else(|| anyhow::anyhow!("Project not found: {}", args.project))?;

    let id = store.create_release(&NewRelease {
        project_id: project.id,
        semver: args.semver.unwrap_or_else(|| args.version.clone()),
        version: args.version.clone(),
        release_date,
        vcs_tag: args.vcs_tag,
        title: args.title,
        summary: args.summary,
        changelog: args.changelog,
        discussion_url: args.discussion_url,
        public: !args.private,
    })?;

    println!(
        "Created release {} of \"{}\" (id {id})",
        args.version, project.slug
    );
    Ok(())
}
