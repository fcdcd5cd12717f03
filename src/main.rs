//! Fee Indexer CLI
//!
//! Entry point for the indexer binary. Provides subcommands for:
//! - `run` - start every enabled chain's worker and block until shutdown
//! - `migrate` - apply pending database migrations
//! - `add`/`start`/`stop`/`update`/`delete`/`status` - control-plane operations

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use fee_indexer::chain::AlloyChainClientPool;
use fee_indexer::config::Settings;
use fee_indexer::control::{AddChainRequest, ControlPlane, NoopCacheInvalidator, UpdateChainRequest};
use fee_indexer::indexer::{ProcessorTuning, WorkerSupervisor};
use fee_indexer::ports::SystemClock;
use fee_indexer::store::PostgresStore;
use fee_indexer::types::primitives::ChainId;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};

/// Fee Indexer: multi-chain LI.FI `FeesCollected` event indexer.
#[derive(Parser, Debug)]
#[command(name = "fee-indexer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path, relative to `config/`
    #[arg(short, long, default_value = "default")]
    config: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the indexer: start every enabled chain's worker and block until shutdown
    Run,

    /// Apply pending database migrations
    Migrate,

    /// Register a new chain
    Add {
        /// EIP-155 chain id
        chain_id: u64,
        /// Display name
        #[arg(long)]
        name: String,
        /// HTTP(S) JSON-RPC endpoint
        #[arg(long)]
        rpc_url: String,
        /// Fee-collector contract address
        #[arg(long)]
        contract_address: String,
        /// Block to start scanning from
        #[arg(long)]
        starting_block: Option<u64>,
    },

    /// Start a registered chain's worker
    Start {
        /// EIP-155 chain id
        chain_id: u64,
    },

    /// Stop a running chain's worker
    Stop {
        /// EIP-155 chain id
        chain_id: u64,
    },

    /// Update a registered chain's configuration
    Update {
        /// EIP-155 chain id
        chain_id: u64,
        /// New RPC endpoint
        #[arg(long)]
        rpc_url: Option<String>,
        /// New scan interval, in milliseconds
        #[arg(long)]
        scan_interval_ms: Option<u64>,
        /// New maximum block range per `eth_getLogs` call
        #[arg(long)]
        max_block_range: Option<u64>,
    },

    /// Remove a registered chain
    Delete {
        /// EIP-155 chain id
        chain_id: u64,
    },

    /// Show the status of one chain, or every chain if omitted
    Status {
        /// EIP-155 chain id
        chain_id: Option<u64>,
    },
}

fn init_logging(settings: &fee_indexer::config::LoggingSettings) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.level));

    if settings.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn build_store(settings: &Settings) -> fee_indexer::error::Result<PostgresStore> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .min_connections(settings.database.min_connections)
        .acquire_timeout(settings.database.connect_timeout())
        .idle_timeout(settings.database.idle_timeout())
        .connect(&settings.database.url)
        .await
        .map_err(fee_indexer::error::InfraError::Database)?;
    Ok(PostgresStore::new(pool))
}

fn build_control_plane(
    settings: &Settings,
    store: Arc<PostgresStore>,
) -> (Arc<ControlPlane>, Arc<WorkerSupervisor>) {
    let chain_pool = Arc::new(AlloyChainClientPool::new(
        settings.indexer.rpc_probe_timeout(),
        settings.indexer.retry_base_delay(),
    ));
    let supervisor = Arc::new(WorkerSupervisor::new(
        store.clone(),
        store.clone(),
        chain_pool.clone(),
        Arc::new(SystemClock),
        ProcessorTuning {
            timestamp_batch_size: settings.indexer.timestamp_batch_size,
            timestamp_batch_delay: settings.indexer.timestamp_batch_delay(),
            max_decode_error_ratio: settings.indexer.max_decode_error_ratio,
        },
        settings.indexer.graceful_shutdown(),
    ));
    let control = Arc::new(ControlPlane::new(
        store,
        chain_pool,
        supervisor.clone(),
        Arc::new(NoopCacheInvalidator),
    ));
    (control, supervisor)
}

async fn run(settings: Settings) -> fee_indexer::error::Result<()> {
    let store = Arc::new(build_store(&settings).await?);
    store.run_migrations().await?;
    let (control, supervisor) = build_control_plane(&settings, store);

    for status in control.list_status().await? {
        if status.config.is_enabled {
            supervisor.start_worker(status.config.chain_id).await?;
        }
    }

    info!("indexer running, press ctrl-c to stop");
    tokio::signal::ctrl_c()
        .await
        .map_err(|err| fee_indexer::error::AppError::Initialization(err.to_string()))?;

    info!("shutting down");
    supervisor.stop_all().await;
    Ok(())
}

async fn dispatch(cli: Cli, settings: Settings) -> fee_indexer::error::Result<()> {
    match cli.command {
        Commands::Run => run(settings).await,
        Commands::Migrate => {
            let store = build_store(&settings).await?;
            store.run_migrations().await?;
            info!("migrations applied");
            Ok(())
        }
        Commands::Add {
            chain_id,
            name,
            rpc_url,
            contract_address,
            starting_block,
        } => {
            let store = Arc::new(build_store(&settings).await?);
            let (control, _supervisor) = build_control_plane(&settings, store);
            let config = control
                .add_chain(AddChainRequest {
                    chain_id,
                    name,
                    rpc_url,
                    contract_address,
                    starting_block,
                    scan_interval_ms: None,
                    max_block_range: None,
                    retry_attempts: None,
                })
                .await?;
            println!("added chain {} ({})", config.chain_id, config.name);
            Ok(())
        }
        Commands::Start { chain_id } => {
            let store = Arc::new(build_store(&settings).await?);
            let (control, _supervisor) = build_control_plane(&settings, store);
            control.start_chain(ChainId::new(chain_id)?).await?;
            println!("started chain {chain_id}");
            Ok(())
        }
        Commands::Stop { chain_id } => {
            let store = Arc::new(build_store(&settings).await?);
            let (control, _supervisor) = build_control_plane(&settings, store);
            control.stop_chain(ChainId::new(chain_id)?).await?;
            println!("stopped chain {chain_id}");
            Ok(())
        }
        Commands::Update {
            chain_id,
            rpc_url,
            scan_interval_ms,
            max_block_range,
        } => {
            let store = Arc::new(build_store(&settings).await?);
            let (control, _supervisor) = build_control_plane(&settings, store);
            control
                .update_chain(
                    ChainId::new(chain_id)?,
                    UpdateChainRequest {
                        rpc_url,
                        scan_interval_ms,
                        max_block_range,
                        ..Default::default()
                    },
                )
                .await?;
            println!("updated chain {chain_id}");
            Ok(())
        }
        Commands::Delete { chain_id } => {
            let store = Arc::new(build_store(&settings).await?);
            let (control, _supervisor) = build_control_plane(&settings, store);
            control.delete_chain(ChainId::new(chain_id)?).await?;
            println!("deleted chain {chain_id}");
            Ok(())
        }
        Commands::Status { chain_id } => {
            let store = Arc::new(build_store(&settings).await?);
            let (control, _supervisor) = build_control_plane(&settings, store);
            let statuses = match chain_id {
                Some(id) => vec![control.chain_status(ChainId::new(id)?).await?],
                None => control.list_status().await?,
            };
            for status in statuses {
                println!(
                    "{:>12} {:<20} {:<10} last_processed={}",
                    status.config.chain_id,
                    status.config.name,
                    status.config.worker_status,
                    status
                        .cursor
                        .map_or_else(|| "-".to_string(), |c| c.last_processed_block.to_string())
                );
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let settings = match Settings::load(&cli.config) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(errors) = settings.validate() {
        eprintln!("invalid configuration:");
        for error in errors {
            eprintln!("  - {error}");
        }
        return ExitCode::FAILURE;
    }

    init_logging(&settings.logging);
    info!(version = fee_indexer::VERSION, "starting fee-indexer");

    match dispatch(cli, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "command failed");
            ExitCode::FAILURE
        }
    }
}
