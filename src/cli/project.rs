use crate::server::validation::validate_project_slug;
use crate::store::Store;
use crate::types::NewProject;

use super::init_store;

pub fn run_project_add(
    data_dir: String,
    name: String,
    slug: String,
    vcs_url: Option<String>,
    description: Option<String>,
) -> anyhow::Result<()> {
    validate_project_slug(&slug).map_err(anyhow::Error::msg)?;
    if name.trim().is_empty() {
        anyhow::bail!("Project name cannot be empty");
    }

    let store = init_store(&data_dir)?;
    let id = store.create_project(&NewProject {
        name,
        slug: slug.clone(),
        vcs_url,
        description,
    })?;

    println!("Created project \"{slug}\" (id {id})");
    Ok(())
}

pub fn run_project_list(data_dir: String, json: bool) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let projects = store.list_projects()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
        return Ok(());
    }

    if projects.is_empty() {
        println!("No projects.");
        return Ok(());
    }

    for summary in &projects {
        println!(
            "{:<24} {:>4} releases {:>8} downloads  {}",
            summary.project.slug,
            summary.release_count,
            summary.total_downloads,
            summary.project.name
        );
    }
    Ok(())
}
