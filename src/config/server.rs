use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Looked up inside the data directory when no explicit path is given.
pub const CONFIG_FILE_NAME: &str = "relstore.toml";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Prefix of the internal location the front web server maps to the
    /// files on disk (e.g. nginx `location /internal/ { internal; }`).
    pub internal_prefix: String,
    /// Directory holding the release files, laid out as
    /// `<project>/<platform>/<version>/<filename>`.
    pub files_root: PathBuf,
}

/// Optional on-disk settings. Every field may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub internal_prefix: Option<String>,
    pub files_root: Option<PathBuf>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Loads `path` when given, otherwise `<data_dir>/relstore.toml` if it
    /// exists. A missing implicit file is not an error.
    pub fn discover(data_dir: &Path, path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let implicit = data_dir.join(CONFIG_FILE_NAME);
                if implicit.exists() {
                    Self::load(&implicit)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid listen address: {e}")))
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("relstore.db")
    }

    /// Layers the file's values over the defaults for `data_dir`.
    #[must_use]
    pub fn from_file(data_dir: PathBuf, file: ConfigFile) -> Self {
        let defaults = Self {
            data_dir,
            ..Self::default()
        };
        Self {
            host: file.host.unwrap_or(defaults.host),
            port: file.port.unwrap_or(defaults.port),
            internal_prefix: file.internal_prefix.unwrap_or(defaults.internal_prefix),
            files_root: file.files_root.unwrap_or(defaults.files_root),
            data_dir: defaults.data_dir,
        }
    }

    /// On-disk location of an artifact below `files_root`.
    #[must_use]
    pub fn artifact_path(&self, project: &str, platform: &str, version: &str, filename: &str) -> PathBuf {
        self.files_root
            .join(project)
            .join(platform)
            .join(version)
            .join(filename)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            internal_prefix: "/internal".to_string(),
            files_root: PathBuf::from("./files"),
        }
    }
}
