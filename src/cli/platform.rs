use crate::server::validation::validate_platform_slug;
use crate::store::Store;
use crate::types::NewPlatform;

use super::init_store;

pub fn run_platform_add(data_dir: String, name: String, slug: String) -> anyhow::Result<()> {
    validate_platform_slug(&slug).map_err(anyhow::Error::msg)?;
    if name.trim().is_empty() {
        anyhow::bail!("Platform name cannot be empty");
    }

    let store = init_store(&data_dir)?;
    let id = store.create_platform(&NewPlatform {
        name,
        slug: slug.clone(),
    })?;

    println!("Created platform \"{slug}\" (id {id})");
    Ok(())
}
