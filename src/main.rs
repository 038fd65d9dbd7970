use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use relstore::cli::{
    AdminCommands, FileArgs, FileCommands, PlatformCommands, ProjectCommands, ReleaseArgs,
    ReleaseCommands, run_file_add, run_platform_add, run_project_add, run_project_list,
    run_release_add,
};
use relstore::config::{ConfigFile, ServerConfig};
use relstore::server::{AppState, create_router};
use relstore::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "relstore")]
#[command(about = "A release registry with download counting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Create the database or upgrade its schema
    Migrate {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },

    /// Start the server
    Serve {
        /// Host to bind to [default: 127.0.0.1]
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to [default: 8080]
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Config file (defaults to relstore.toml in the data directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Prefix of the front server's internal file location [default: /internal]
        #[arg(long)]
        internal_prefix: Option<String>,
    },
}

fn run_migrate(data_dir: String) -> anyhow::Result<()> {
    let data_path = PathBuf::from(data_dir);
    fs::create_dir_all(&data_path)?;

    let config = ServerConfig {
        data_dir: data_path,
        ..ServerConfig::default()
    };
    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    println!(
        "Database at {} is at schema version {}",
        config.db_path().display(),
        store.schema_version()?
    );
    Ok(())
}

async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    data_dir: String,
    config_path: Option<PathBuf>,
    internal_prefix: Option<String>,
) -> anyhow::Result<()> {
    let data_path = PathBuf::from(data_dir);
    fs::create_dir_all(&data_path)?;

    let file = ConfigFile::discover(&data_path, config_path.as_deref())?;
    let mut config = ServerConfig::from_file(data_path, file);
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(prefix) = internal_prefix {
        config.internal_prefix = prefix;
    }

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;
    info!(
        "Opened {} (schema version {})",
        config.db_path().display(),
        store.schema_version()?
    );

    let store: Arc<dyn Store> = Arc::new(store);
    let state = Arc::new(AppState::new(Arc::clone(&store), &config));

    let addr = config.socket_addr()?;

    info!(
        "Starting server on {} (delegating to {})",
        addr,
        state.resolver.internal_prefix()
    );

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close()?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

fn run_admin(command: AdminCommands) -> anyhow::Result<()> {
    match command {
        AdminCommands::Project { command } => match command {
            ProjectCommands::Add {
                data_dir,
                name,
                slug,
                vcs_url,
                description,
            } => run_project_add(data_dir, name, slug, vcs_url, description),
        },
        AdminCommands::Platform { command } => match command {
            PlatformCommands::Add {
                data_dir,
                name,
                slug,
            } => run_platform_add(data_dir, name, slug),
        },
        AdminCommands::Release { command } => match command {
            ReleaseCommands::Add {
                data_dir,
                project,
                version,
                semver,
                date,
                vcs_tag,
                title,
                summary,
                changelog,
                discussion_url,
                private,
            } => run_release_add(
                data_dir,
                ReleaseArgs {
                    project,
                    version,
                    semver,
                    date,
                    vcs_tag,
                    title,
                    summary,
                    changelog,
                    discussion_url,
                    private,
                },
            ),
        },
        AdminCommands::File { command } => match command {
            FileCommands::Add {
                data_dir,
                config,
                project,
                release,
                platform,
                filename,
                content_type,
                sha256,
            } => run_file_add(
                data_dir,
                FileArgs {
                    config,
                    project,
                    release,
                    platform,
                    filename,
                    content_type,
                    sha256,
                },
            ),
        },
        AdminCommands::List { data_dir, json } => run_project_list(data_dir, json),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("relstore=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => run_admin(command)?,
        Commands::Migrate { data_dir } => run_migrate(data_dir)?,
        Commands::Serve {
            host,
            port,
            data_dir,
            config,
            internal_prefix,
        } => run_serve(host, port, data_dir, config, internal_prefix).await?,
    }

    Ok(())
}
