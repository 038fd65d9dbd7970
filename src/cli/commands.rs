use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Manage platforms
    Platform {
        #[command(subcommand)]
        command: PlatformCommands,
    },

    /// Manage releases
    Release {
        #[command(subcommand)]
        command: ReleaseCommands,
    },

    /// Manage release files
    File {
        #[command(subcommand)]
        command: FileCommands,
    },

    /// List projects with release and download counts
    List {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Add a new project
    Add {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// URL-safe identifier used in download paths
        #[arg(long)]
        slug: String,

        /// Source repository URL
        #[arg(long)]
        vcs_url: Option<String>,

        /// Short description
        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PlatformCommands {
    /// Add a new platform
    Add {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// URL-safe identifier used in download paths
        #[arg(long)]
        slug: String,
    },
}

#[derive(Subcommand)]
pub enum ReleaseCommands {
    /// Add a release to a project
    Add {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Project slug
        #[arg(long)]
        project: String,

        /// Version as shown in download paths
        #[arg(long)]
        version: String,

        /// Normalized version used for ordering (defaults to --version)
        #[arg(long)]
        semver: Option<String>,

        /// Release date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Tag in the source repository
        #[arg(long)]
        vcs_tag: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        summary: Option<String>,

        /// Changelog text
        #[arg(long)]
        changelog: Option<String>,

        /// Link to a discussion thread
        #[arg(long)]
        discussion_url: Option<String>,

        /// Hide the release from public listings
        #[arg(long)]
        private: bool,
    },
}

#[derive(Subcommand)]
pub enum FileCommands {
    /// Register a file for a release
    Add {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Config file (defaults to relstore.toml in the data directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Project slug
        #[arg(long)]
        project: String,

        /// Release version
        #[arg(long)]
        release: String,

        /// Platform slug
        #[arg(long)]
        platform: String,

        #[arg(long)]
        filename: String,

        /// MIME type; omit to serve as application/octet-stream
        #[arg(long)]
        content_type: Option<String>,

        /// SHA-256 digest; computed from the file under files_root if omitted
        #[arg(long)]
        sha256: Option<String>,
    },
}
