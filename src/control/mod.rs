//! Control Plane: runtime management of configured chains.
//!
//! The only caller that mutates [`ChainConfig`]. A proposed `rpcUrl` is
//! probed for reachability before any mutation that changes it is
//! committed (`spec.md` §4.5's probe gate). After a successful mutation,
//! the optional [`CacheInvalidator`] hook is called so an external cache
//! this crate doesn't own can drop its stale entry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument};

use crate::error::{DomainError, Result};
use crate::indexer::WorkerSupervisor;
use crate::ports::{ChainClientPool, ChainRegistry};
use crate::types::entities::ChainConfig;
use crate::types::enums::WorkerStatus;
use crate::types::primitives::{ChainId, EthAddress, RpcUrl};

/// Hook invoked after a chain mutation so an external cache can invalidate
/// its entry. Default is a no-op; this crate does not implement a cache.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    /// Called after `add`, `update`, or `delete` commits.
    async fn invalidate(&self, chain_id: ChainId);
}

/// A [`CacheInvalidator`] that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCacheInvalidator;

#[async_trait]
impl CacheInvalidator for NoopCacheInvalidator {
    async fn invalidate(&self, _chain_id: ChainId) {}
}

/// Fields an operator may supply when adding a chain. Unset numeric fields
/// fall back to `ChainConfig`'s defaults.
#[derive(Debug, Clone)]
pub struct AddChainRequest {
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Operator-supplied display name.
    pub name: String,
    /// HTTP(S) JSON-RPC endpoint.
    pub rpc_url: String,
    /// Address of the deployed fee-collector contract.
    pub contract_address: String,
    /// Block to start scanning from. Defaults to `ChainConfig::DEFAULT_STARTING_BLOCK`.
    pub starting_block: Option<u64>,
    /// Milliseconds between scan ticks. Defaults to `ChainConfig::DEFAULT_SCAN_INTERVAL_MS`.
    pub scan_interval_ms: Option<u64>,
    /// Maximum blocks per `eth_getLogs` call. Defaults to `ChainConfig::DEFAULT_MAX_BLOCK_RANGE`.
    pub max_block_range: Option<u64>,
    /// Retries on a transient RPC failure. Defaults to `ChainConfig::DEFAULT_RETRY_ATTEMPTS`.
    pub retry_attempts: Option<u32>,
}

/// Fields an operator may update on an existing chain. `None` leaves the
/// field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateChainRequest {
    /// New display name.
    pub name: Option<String>,
    /// New RPC endpoint. Gated by the probe before being committed.
    pub rpc_url: Option<String>,
    /// New contract address.
    pub contract_address: Option<String>,
    /// New scan interval.
    pub scan_interval_ms: Option<u64>,
    /// New maximum block range.
    pub max_block_range: Option<u64>,
    /// New retry attempt count.
    pub retry_attempts: Option<u32>,
}

/// A chain's configuration alongside its live cursor, for `status`.
#[derive(Debug, Clone)]
pub struct ChainStatus {
    /// The chain's configuration.
    pub config: ChainConfig,
    /// The chain's persisted cursor, if it has ever been scanned.
    pub cursor: Option<crate::types::entities::ScanCursor>,
}

/// Runtime chain management: `add`/`start`/`stop`/`update`/`delete`/`status`.
///
/// `Send + Sync`, constructor-injected.
pub struct ControlPlane {
    registry: Arc<dyn ChainRegistry>,
    chain_pool: Arc<dyn ChainClientPool>,
    supervisor: Arc<WorkerSupervisor>,
    cache: Arc<dyn CacheInvalidator>,
}

impl ControlPlane {
    /// Build a control plane with an explicit cache-invalidation hook. The
    /// RPC probe's own timeout lives on `chain_pool`, not here.
    #[must_use]
    pub fn new(
        registry: Arc<dyn ChainRegistry>,
        chain_pool: Arc<dyn ChainClientPool>,
        supervisor: Arc<WorkerSupervisor>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self {
            registry,
            chain_pool,
            supervisor,
            cache,
        }
    }

    /// Register a new chain. Probes `rpc_url` before committing, persists
    /// the initial `ScanCursor`, and always starts the worker. If the start
    /// itself fails, the chain stays registered with `worker_status=error`
    /// rather than losing the config (`spec.md` §4.5 `add` row).
    ///
    /// # Errors
    /// Returns `AppError::Domain(DomainError::ChainAlreadyExists(_))` if the
    /// chain id is already registered, a validation error if any field is
    /// malformed, or `AppError::RpcUnavailable` if the probe fails.
    #[instrument(skip(self, request), fields(chain_id = request.chain_id))]
    pub async fn add_chain(&self, request: AddChainRequest) -> Result<ChainConfig> {
        let chain_id = ChainId::new(request.chain_id)?;

        if self.registry.get_chain(chain_id).await?.is_some() {
            return Err(DomainError::ChainAlreadyExists(request.chain_id).into());
        }

        let contract_address = EthAddress::from_hex(&request.contract_address)?;
        let _validated_url = RpcUrl::parse(&request.rpc_url)?;

        self.chain_pool.probe_url(&request.rpc_url).await?;

        let now = Utc::now();
        let starting_block = crate::types::primitives::BlockNumber::new(
            request
                .starting_block
                .unwrap_or(ChainConfig::DEFAULT_STARTING_BLOCK),
        );
        let mut config = ChainConfig {
            chain_id,
            name: request.name,
            rpc_url: request.rpc_url,
            contract_address,
            starting_block,
            scan_interval_ms: request
                .scan_interval_ms
                .unwrap_or(ChainConfig::DEFAULT_SCAN_INTERVAL_MS),
            max_block_range: request
                .max_block_range
                .unwrap_or(ChainConfig::DEFAULT_MAX_BLOCK_RANGE),
            retry_attempts: request
                .retry_attempts
                .unwrap_or(ChainConfig::DEFAULT_RETRY_ATTEMPTS),
            is_enabled: true,
            worker_status: WorkerStatus::Starting,
            last_worker_start: None,
            last_worker_error: None,
            created_at: now,
            updated_at: now,
        };

        self.registry.upsert_chain(&config).await?;
        self.registry
            .upsert_cursor(&crate::types::entities::ScanCursor::initial(chain_id, starting_block))
            .await?;
        self.cache.invalidate(chain_id).await;

        if let Err(err) = self.supervisor.start_worker(chain_id).await {
            config.worker_status = WorkerStatus::Error;
            config.last_worker_error = Some(err.to_string());
            config.updated_at = Utc::now();
            self.registry.upsert_chain(&config).await?;
            self.cache.invalidate(chain_id).await;
            return Ok(config);
        }

        info!(chain_id = request.chain_id, "chain added");
        Ok(config)
    }

    /// Start the worker for a chain. A no-op if it's already running.
    ///
    /// # Errors
    /// Returns `AppError::Domain(DomainError::ChainNotFound(_))` if the
    /// chain isn't registered.
    #[instrument(skip(self), fields(chain_id = chain_id.get()))]
    pub async fn start_chain(&self, chain_id: ChainId) -> Result<()> {
        let config = self
            .registry
            .get_chain(chain_id)
            .await?
            .ok_or(DomainError::ChainNotFound(chain_id.get()))?;

        self.supervisor.start_worker(chain_id).await?;

        let mut config = config;
        config.is_enabled = true;
        config.updated_at = Utc::now();
        self.registry.upsert_chain(&config).await?;
        self.cache.invalidate(chain_id).await;

        Ok(())
    }

    /// Stop the worker for a chain.
    ///
    /// # Errors
    /// Returns `AppError::Domain(DomainError::ChainNotFound(_))` if the
    /// chain isn't registered or has no running worker.
    #[instrument(skip(self), fields(chain_id = chain_id.get()))]
    pub async fn stop_chain(&self, chain_id: ChainId) -> Result<()> {
        let config = self
            .registry
            .get_chain(chain_id)
            .await?
            .ok_or(DomainError::ChainNotFound(chain_id.get()))?;

        self.supervisor.stop_worker(chain_id).await?;

        let mut config = config;
        config.is_enabled = false;
        config.updated_at = Utc::now();
        self.registry.upsert_chain(&config).await?;
        self.cache.invalidate(chain_id).await;

        Ok(())
    }

    /// Update a chain's configuration. Any RPC endpoint change is probed
    /// before being committed. A running worker's scan interval is pushed
    /// live; other changes take effect the next time the worker restarts.
    ///
    /// # Errors
    /// Returns `AppError::Domain(DomainError::ChainNotFound(_))` if the
    /// chain isn't registered, a validation error if a supplied field is
    /// malformed, or `AppError::RpcUnavailable` if a new RPC url fails its
    /// probe.
    #[instrument(skip(self, request), fields(chain_id = chain_id.get()))]
    pub async fn update_chain(
        &self,
        chain_id: ChainId,
        request: UpdateChainRequest,
    ) -> Result<ChainConfig> {
        let mut config = self
            .registry
            .get_chain(chain_id)
            .await?
            .ok_or(DomainError::ChainNotFound(chain_id.get()))?;

        let mut client_pool_stale = false;

        if let Some(rpc_url) = request.rpc_url {
            let _validated = RpcUrl::parse(&rpc_url)?;
            self.chain_pool.probe_url(&rpc_url).await?;
            config.rpc_url = rpc_url;
            client_pool_stale = true;
        }
        if let Some(contract_address) = request.contract_address {
            config.contract_address = EthAddress::from_hex(&contract_address)?;
            client_pool_stale = true;
        }
        if let Some(name) = request.name {
            config.name = name;
        }
        if let Some(scan_interval_ms) = request.scan_interval_ms {
            config.scan_interval_ms = scan_interval_ms;
            if self.supervisor.is_running(chain_id) {
                self.supervisor
                    .update_interval(chain_id, Duration::from_millis(scan_interval_ms))?;
            }
        }
        if let Some(max_block_range) = request.max_block_range {
            config.max_block_range = max_block_range;
        }
        if let Some(retry_attempts) = request.retry_attempts {
            config.retry_attempts = retry_attempts;
        }

        config.updated_at = Utc::now();
        self.registry.upsert_chain(&config).await?;

        if client_pool_stale {
            self.chain_pool.ensure(&config).await?;
        }

        self.cache.invalidate(chain_id).await;

        Ok(config)
    }

    /// Remove a chain. Stops its worker first if running.
    ///
    /// # Errors
    /// Returns `AppError::Domain(DomainError::ChainNotFound(_))` if the
    /// chain isn't registered.
    #[instrument(skip(self), fields(chain_id = chain_id.get()))]
    pub async fn delete_chain(&self, chain_id: ChainId) -> Result<()> {
        if self.registry.get_chain(chain_id).await?.is_none() {
            return Err(DomainError::ChainNotFound(chain_id.get()).into());
        }

        if self.supervisor.is_running(chain_id) {
            self.supervisor.stop_worker(chain_id).await?;
        }

        self.chain_pool.drop_chain(chain_id);
        self.registry.delete_cursor(chain_id).await?;
        self.registry.delete_chain(chain_id).await?;
        self.cache.invalidate(chain_id).await;

        info!(chain_id = chain_id.get(), "chain deleted");
        Ok(())
    }

    /// Fetch a chain's configuration and cursor.
    ///
    /// # Errors
    /// Returns `AppError::Domain(DomainError::ChainNotFound(_))` if the
    /// chain isn't registered.
    pub async fn chain_status(&self, chain_id: ChainId) -> Result<ChainStatus> {
        let config = self
            .registry
            .get_chain(chain_id)
            .await?
            .ok_or(DomainError::ChainNotFound(chain_id.get()))?;
        let cursor = self.registry.get_cursor(chain_id).await?;
        Ok(ChainStatus { config, cursor })
    }

    /// List every configured chain with its cursor.
    ///
    /// # Errors
    /// Returns an error if the underlying store fails.
    pub async fn list_status(&self) -> Result<Vec<ChainStatus>> {
        let configs = self.registry.list_chains().await?;
        let mut statuses = Vec::with_capacity(configs.len());
        for config in configs {
            let cursor = self.registry.get_cursor(config.chain_id).await?;
            statuses.push(ChainStatus { config, cursor });
        }
        Ok(statuses)
    }
}
