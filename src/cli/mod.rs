mod commands;
mod file;
mod platform;
mod project;
mod release;

pub use commands::{AdminCommands, FileCommands, PlatformCommands, ProjectCommands, ReleaseCommands};
pub use file::{FileArgs, run_file_add};
pub use platform::run_platform_add;
pub use project::{run_project_add, run_project_list};
pub use release::{ReleaseArgs, run_release_add};

use std::path::Path;

use crate::store::{SqliteStore, Store};

/// Opens the store in `data_dir`, checking it exists
pub fn init_store(data_dir: &str) -> anyhow::Result<SqliteStore> {
    let db_path = Path::new(data_dir).join("relstore.db");

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'relstore migrate' first.",
            db_path.display()
        );
    }

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;
    Ok(store)
}
