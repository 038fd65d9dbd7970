use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::config::{ConfigFile, ServerConfig};
use crate::server::validation::{validate_content_type, validate_filename};
use crate::store::Store;
use crate::types::NewFile;

use super::init_store;

pub struct FileArgs {
    pub config: Option<PathBuf>,
    pub project: String,
    pub release: String,
    pub platform: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub sha256: Option<String>,
}

pub fn run_file_add(data_dir: String, args: FileArgs) -> anyhow::Result<()> {
    validate_filename(&args.filename).map_err(anyhow::Error::msg)?;
    let content_type = args
        .content_type
        .map(|ct| ct.trim().to_string())
        .filter(|ct| !ct.is_empty());
    if let Some(ct) = &content_type {
        validate_content_type(ct).map_err(anyhow::Error::msg)?;
    }

    let store = init_store(&data_dir)?;
    let project = store
        .get_project_by_slug(&args.project)?
        .ok_or_else(|| anyhow::anyhow!("Project not found: {}", args.project))?;
    let release = store
        .get_release_by_project_slug_and_version(&project.slug, &args.release)?
        .ok_or_else(|| {
            anyhow::anyhow!("Release {} not found for \"{}\"", args.release, project.slug)
        })?;
    let platform = store
        .get_platform_by_slug(&args.platform)?
        .ok_or_else(|| anyhow::anyhow!("Platform not found: {}", args.platform))?;

    let sha256 = match args.sha256 {
        Some(digest) => normalize_digest(&digest)?,
        None => {
            let file = ConfigFile::discover(Path::new(&data_dir), args.config.as_deref())?;
            let config = ServerConfig::from_file(PathBuf::from(&data_dir), file);
            let path = config.artifact_path(
                &project.slug,
                &platform.slug,
                &release.version,
                &args.filename,
            );
            sha256_file(&path)
                .map_err(|e| anyhow::anyhow!("Cannot hash {}: {e}", path.display()))?
        }
    };

    let id = store.create_file(&NewFile {
        project_id: project.id,
        release_id: release.id,
        platform_id: platform.id,
        filename: args.filename.clone(),
        content_type,
        sha256,
    })?;

    println!(
        "Added {}/{}/{}/{} (id {id})",
        project.slug, platform.slug, release.version, args.filename
    );
    Ok(())
}

fn normalize_digest(digest: &str) -> anyhow::Result<String> {
    let digest = digest.trim().to_ascii_lowercase();
    match hex::decode(&digest) {
        Ok(bytes) if bytes.len() == 32 => Ok(digest),
        _ => anyhow::bail!("--sha256 must be 64 hex characters"),
    }
}

fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
