use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use syncremote::config::{RepositoryConfig, default_config_path};
use syncremote::i18n::ResourceBundle;
use syncremote::plugins::{LocalConnection, PluginRegistry};
use syncremote::transfer::{BoxedTransferManager, RemoteFile};

/// syncremote - inspect and drive a sync repository's remote storage
#[derive(Parser, Debug)]
#[command(name = "syncremote")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Repository config file (default: ~/.syncremote/repository.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Language for labels and descriptions
    #[arg(long, global = true, default_value = "en")]
    lang: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available storage plugins
    Plugins,

    /// Show the configured connection
    Show,

    /// List remote files
    Ls {
        /// Only files whose name starts with this prefix
        #[arg(long, default_value = "")]
        prefix: String,
    },

    /// Upload a file (existing remote files are kept)
    Put {
        local: PathBuf,
        /// Remote name (default: the local file name)
        name: Option<String>,
    },

    /// Download a remote file
    Get { name: String, local: PathBuf },

    /// Delete a remote file
    Rm { name: String },

    /// Remove leftovers of interrupted uploads
    Clean,

    /// Write a config that uses a local folder as repository
    InitLocal { folder: PathBuf },
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("syncremote=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => default_config_path().context("cannot determine home directory"),
    }
}

fn load_config(path: &Path, registry: &PluginRegistry) -> Result<RepositoryConfig> {
    RepositoryConfig::read_file(path, registry)
        .with_context(|| format!("failed to load {}", path.display()))
}

fn transfer_manager(path: &Path, registry: &PluginRegistry) -> Result<BoxedTransferManager> {
    let config = load_config(path, registry)?;
    Ok(config.connection().create_transfer_manager()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let registry = PluginRegistry::with_builtin_plugins();
    let bundle = ResourceBundle::load(&cli.lang)?;

    match &cli.command {
        Commands::Plugins => {
            for info in registry.iter() {
                println!(
                    "{:<8} {:<16} v{:<6} {}",
                    info.id(),
                    info.name(),
                    info.version().to_string(),
                    info.description(&bundle)
                );
            }
        }
        Commands::Show => {
            let path = config_path(&cli)?;
            let config = load_config(&path, &registry)?;
            println!("{}", config.connection().display(&bundle));
            println!("chunksize: {} KiB", config.chunk_size_kb());
        }
        Commands::Ls { prefix } => {
            let manager = transfer_manager(&config_path(&cli)?, &registry)?;
            for file in manager.list_prefix(prefix).await?.values() {
                let size = file.size.map(|s| s.to_string()).unwrap_or_default();
                let modified = file
                    .last_modified
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!("{:>12}  {:<16}  {}", size, modified, file.name);
            }
        }
        Commands::Put { local, name } => {
            let name = match name {
                Some(name) => name.clone(),
                None => match local.file_name() {
                    Some(n) => n.to_string_lossy().into_owned(),
                    None => bail!("cannot derive a remote name from {}", local.display()),
                },
            };
            let manager = transfer_manager(&config_path(&cli)?, &registry)?;
            manager.upload(local, &RemoteFile::new(name.clone())).await?;
            tracing::info!("Uploaded {} as {}", local.display(), name);
        }
        Commands::Get { name, local } => {
            let manager = transfer_manager(&config_path(&cli)?, &registry)?;
            manager.download(&RemoteFile::new(name.clone()), local).await?;
            tracing::info!("Downloaded {} to {}", name, local.display());
        }
        Commands::Rm { name } => {
            let manager = transfer_manager(&config_path(&cli)?, &registry)?;
            manager.delete(&RemoteFile::new(name.clone())).await?;
            tracing::info!("Deleted {}", name);
        }
        Commands::Clean => {
            let manager = transfer_manager(&config_path(&cli)?, &registry)?;
            manager.clean().await?;
        }
        Commands::InitLocal { folder } => {
            let path = config_path(&cli)?;
            if path.exists() {
                bail!("{} already exists", path.display());
            }
            let config = RepositoryConfig::new(LocalConnection::new(folder.clone()).into());
            config.connection().validate()?;
            config.write_file(&path)?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}
