//! MirrorFleet manager
//!
//! Main entry point for the manager process.

use anyhow::Context;
use clap::{Parser, Subcommand};
use mirrorfleet::config::{validate_config_result, DbType, ManagerConfig};
use mirrorfleet::{Manager, ManagerServer};
use std::path::{Path, PathBuf};
use std::process;

/// MirrorFleet - control plane for mirror-synchronization workers
#[derive(Parser, Debug)]
#[command(name = "mirrorfleet")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/mirrorfleet/manager.yaml)
    #[arg(short, long, env = "MIRRORFLEET_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the manager HTTP server
    Serve {
        /// Address to bind
        #[arg(long, env = "MIRRORFLEET_ADDR")]
        addr: Option<String>,

        /// Port to bind
        #[arg(short, long, env = "MIRRORFLEET_PORT")]
        port: Option<u16>,

        /// Storage backend (memory, sqlite)
        #[arg(long)]
        db_type: Option<DbType>,

        /// SQLite database file
        #[arg(long)]
        db_file: Option<PathBuf>,

        /// Reject status updates from workers that never registered
        #[arg(long)]
        require_registered_worker: bool,

        /// Verbose logging
        #[arg(short, long)]
        debug: bool,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate the configuration and print the effective settings
    Check,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.unwrap_or_else(ManagerConfig::default_path);

    match cli.command {
        Commands::Init { force } => handle_init(&config_path, force),
        Commands::Check => {
            let config = load_config(&config_path)?;
            validate_config_result(&config)?;
            print!("{}", serde_yaml::to_string(&config)?);
            println!("# {} is valid", config_path.display());
            Ok(())
        }
        Commands::Serve {
            addr,
            port,
            db_type,
            db_file,
            require_registered_worker,
            debug,
        } => {
            let mut config = load_config(&config_path)?;

            // CLI flags override file values
            if let Some(addr) = addr {
                config.server.addr = addr;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(db_type) = db_type {
                config.files.db_type = db_type;
            }
            if let Some(db_file) = db_file {
                config.files.db_file = db_file;
            }
            if require_registered_worker {
                config.policy.require_registered_worker_for_status = true;
            }
            if debug {
                config.debug = true;
            }

            validate_config_result(&config)?;

            if let Err(e) = mirrorfleet::logging::init(config.debug) {
                eprintln!("Failed to initialize logging: {}", e);
            }

            serve(config)
        }
    }
}

/// Load the config file, falling back to defaults when it does not exist
fn load_config(path: &Path) -> anyhow::Result<ManagerConfig> {
    if !path.exists() {
        return Ok(ManagerConfig::default());
    }
    ManagerConfig::load(path).with_context(|| format!("failed to load {}", path.display()))
}

fn handle_init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    ManagerConfig::default().save(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn serve(config: ManagerConfig) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;

    runtime.block_on(async move {
        let addr = config.server.bind_address();
        let manager = Manager::from_config(config).context("failed to open storage")?;
        ManagerServer::new(manager)
            .run(&addr)
            .await
            .with_context(|| format!("manager server on {} failed", addr))
    })
}
