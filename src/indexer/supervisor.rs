//! Worker Supervisor: one independent tick loop per chain.
//!
//! State machine: `Starting -> Running -> (Error <-> Running) -> Stopped`.
//!
//! - A tick that finds the worker still busy with the previous tick is
//!   **skipped**, not coalesced (`spec.md`'s Open Question resolution).
//! - The tick interval is read from a [`watch`] channel at the top of each
//!   loop iteration, so a control-plane `update` takes effect on the next
//!   tick without racing a timer swap mid-sleep.
//! - Shutdown is cooperative via a [`CancellationToken`]: an in-flight tick
//!   always finishes; the supervisor only imposes a deadline on how long it
//!   waits for that before giving up and returning anyway.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::error::{AppError, DomainError, Result};
use crate::indexer::planner::{ScanWindow, plan_next_window};
use crate::indexer::processor::{self, ProcessorTuning};
use crate::ports::{ChainClientPool, ChainRegistry, Clock, EventStore};
use crate::types::entities::ScanCursor;
use crate::types::enums::WorkerStatus;
use crate::types::primitives::ChainId;

/// A running (or recently stopped) chain worker's control handles.
struct WorkerHandle {
    cancellation: CancellationToken,
    interval_tx: watch::Sender<Duration>,
    join: JoinHandle<()>,
}

/// Owns one tick loop per configured chain.
///
/// `Send + Sync`, constructor-injected: no global or thread-local state.
pub struct WorkerSupervisor {
    registry: Arc<dyn ChainRegistry>,
    event_store: Arc<dyn EventStore>,
    chain_pool: Arc<dyn ChainClientPool>,
    clock: Arc<dyn Clock>,
    tuning: ProcessorTuning,
    graceful_shutdown: Duration,
    handles: DashMap<ChainId, WorkerHandle>,
}

impl WorkerSupervisor {
    /// Build a supervisor with no workers running yet.
    #[must_use]
    pub fn new(
        registry: Arc<dyn ChainRegistry>,
        event_store: Arc<dyn EventStore>,
        chain_pool: Arc<dyn ChainClientPool>,
        clock: Arc<dyn Clock>,
        tuning: ProcessorTuning,
        graceful_shutdown: Duration,
    ) -> Self {
        Self {
            registry,
            event_store,
            chain_pool,
            clock,
            tuning,
            graceful_shutdown,
            handles: DashMap::new(),
        }
    }

    /// True if a worker task is currently registered for this chain
    /// (`Starting`, `Running`, or `Error` — anything but `Stopped`).
    #[must_use]
    pub fn is_running(&self, chain_id: ChainId) -> bool {
        self.handles.contains_key(&chain_id)
    }

    /// Start (or restart) the worker for a chain.
    ///
    /// Loads the persisted cursor, or creates the initial one from
    /// `config.starting_block` if the chain has never been scanned. If a
    /// worker is already running for this chain, this is a no-op (`spec.md`
    /// §4.4 `start` row: "if a handle already exists, warn and no-op").
    ///
    /// # Errors
    /// Returns `AppError::Domain(DomainError::ChainNotFound(_))` if the
    /// chain isn't registered, or `AppError::RpcUnavailable` if the client
    /// pool can't establish a client for it.
    #[instrument(skip(self), fields(chain_id = chain_id.get()))]
    pub async fn start_worker(&self, chain_id: ChainId) -> Result<()> {
        if self.handles.contains_key(&chain_id) {
            warn!(chain_id = chain_id.get(), "start requested but worker is already running, ignoring");
            return Ok(());
        }

        let config = self
            .registry
            .get_chain(chain_id)
            .await?
            .ok_or(DomainError::ChainNotFound(chain_id.get()))?;

        self.chain_pool.ensure(&config).await?;

        let cursor = match self.registry.get_cursor(chain_id).await? {
            Some(cursor) => cursor,
            None => ScanCursor::initial(chain_id, config.starting_block),
        };

        let (interval_tx, interval_rx) = watch::channel(Duration::from_millis(config.scan_interval_ms));
        let cancellation = CancellationToken::new();

        let registry = Arc::clone(&self.registry);
        let event_store = Arc::clone(&self.event_store);
        let chain_pool = Arc::clone(&self.chain_pool);
        let clock = Arc::clone(&self.clock);
        let tuning = self.tuning;
        let token = cancellation.clone();

        let join = tokio::spawn(run_worker_loop(
            chain_id,
            config.max_block_range,
            registry,
            event_store,
            chain_pool,
            clock,
            tuning,
            cursor,
            interval_rx,
            token,
        ));

        self.handles.insert(
            chain_id,
            WorkerHandle {
                cancellation,
                interval_tx,
                join,
            },
        );

        info!(chain_id = chain_id.get(), "worker started");
        Ok(())
    }

    /// Stop the worker for a chain, waiting up to the configured graceful
    /// shutdown budget for its in-flight tick (if any) to finish.
    ///
    /// # Errors
    /// Returns `AppError::Domain(DomainError::ChainNotFound(_))` if no
    /// worker is running for this chain.
    #[instrument(skip(self), fields(chain_id = chain_id.get()))]
    pub async fn stop_worker(&self, chain_id: ChainId) -> Result<()> {
        let Some((_, handle)) = self.handles.remove(&chain_id) else {
            return Err(DomainError::ChainNotFound(chain_id.get()).into());
        };

        handle.cancellation.cancel();

        match tokio::time::timeout(self.graceful_shutdown, handle.join).await {
            Ok(Ok(())) => info!(chain_id = chain_id.get(), "worker stopped"),
            Ok(Err(err)) => warn!(chain_id = chain_id.get(), %err, "worker task panicked"),
            Err(_) => warn!(
                chain_id = chain_id.get(),
                "worker did not stop within the graceful shutdown budget"
            ),
        }

        Ok(())
    }

    /// Push a new scan interval to a running worker. Takes effect on the
    /// worker's next loop iteration (never mid-sleep).
    ///
    /// # Errors
    /// Returns `AppError::Domain(DomainError::ChainNotFound(_))` if no
    /// worker is running for this chain.
    pub fn update_interval(&self, chain_id: ChainId, interval: Duration) -> Result<()> {
        let handle = self
            .handles
            .get(&chain_id)
            .ok_or(DomainError::ChainNotFound(chain_id.get()))?;
        handle
            .interval_tx
            .send(interval)
            .map_err(|_| AppError::Initialization("worker loop already exited".into()))?;
        Ok(())
    }

    /// Stop every running worker, e.g. during process shutdown.
    pub async fn stop_all(&self) {
        let chain_ids: Vec<ChainId> = self.handles.iter().map(|entry| *entry.key()).collect();
        for chain_id in chain_ids {
            if let Err(err) = self.stop_worker(chain_id).await {
                error!(chain_id = chain_id.get(), %err, "error stopping worker");
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_worker_loop(
    chain_id: ChainId,
    max_block_range: u64,
    registry: Arc<dyn ChainRegistry>,
    event_store: Arc<dyn EventStore>,
    chain_pool: Arc<dyn ChainClientPool>,
    clock: Arc<dyn Clock>,
    tuning: ProcessorTuning,
    mut cursor: ScanCursor,
    mut interval_rx: watch::Receiver<Duration>,
    cancellation: CancellationToken,
) {
    let in_flight = AtomicBool::new(false);
    cursor.worker_status = WorkerStatus::Starting;

    // Run the first tick immediately on start rather than waiting a full
    // scan interval (`spec.md` §4.4 `start` row).
    in_flight.store(true, Ordering::Release);
    run_tick(
        chain_id,
        max_block_range,
        registry.as_ref(),
        event_store.as_ref(),
        chain_pool.as_ref(),
        clock.as_ref(),
        &tuning,
        &mut cursor,
    )
    .await;
    in_flight.store(false, Ordering::Release);

    loop {
        let interval = *interval_rx.borrow();

        tokio::select! {
            () = cancellation.cancelled() => {
                cursor.worker_status = WorkerStatus::Stopped;
                cursor.is_active = false;
                if let Err(err) = registry.upsert_cursor(&cursor).await {
                    error!(chain_id = chain_id.get(), %err, "failed to persist cursor on shutdown");
                }
                break;
            }
            _ = tokio::time::sleep(interval) => {
                if in_flight.swap(true, Ordering::AcqRel) {
                    warn!(chain_id = chain_id.get(), "tick skipped: previous tick still in flight");
                    continue;
                }

                run_tick(
                    chain_id,
                    max_block_range,
                    registry.as_ref(),
                    event_store.as_ref(),
                    chain_pool.as_ref(),
                    clock.as_ref(),
                    &tuning,
                    &mut cursor,
                )
                .await;

                in_flight.store(false, Ordering::Release);
            }
        }
    }
}

#[instrument(skip_all, fields(chain_id = chain_id.get()))]
#[allow(clippy::too_many_arguments)]
async fn run_tick(
    chain_id: ChainId,
    max_block_range: u64,
    registry: &dyn ChainRegistry,
    event_store: &dyn EventStore,
    chain_pool: &dyn ChainClientPool,
    clock: &dyn Clock,
    tuning: &ProcessorTuning,
    cursor: &mut ScanCursor,
) {
    cursor.is_active = true;

    let result = tick_once(
        chain_id,
        max_block_range,
        chain_pool,
        event_store,
        clock,
        tuning,
        cursor,
    )
    .await;

    cursor.last_run_at = Some(clock.now());
    cursor.is_active = false;

    match result {
        Ok(()) => {
            cursor.error_count = 0;
            cursor.last_error = None;
            cursor.worker_status = WorkerStatus::Running;
            cursor.last_worker_error = None;
        }
        Err(err) => {
            cursor.error_count = cursor.error_count.saturating_add(1);
            cursor.last_error = Some(err.to_string());
            cursor.worker_status = WorkerStatus::Error;
            cursor.last_worker_error = cursor.last_error.clone();
            warn!(chain_id = chain_id.get(), %err, "tick failed");
        }
    }

    if let Err(err) = registry.upsert_cursor(cursor).await {
        error!(chain_id = chain_id.get(), %err, "failed to persist cursor");
    }

    // ScanCursor.worker_status/last_worker_error mirror ChainConfig's fields
    // (`spec.md` §7 propagation policy) — without this, `status` keeps
    // showing whatever worker_status was set at add/start time forever.
    match registry.get_chain(chain_id).await {
        Ok(Some(mut config)) => {
            config.worker_status = cursor.worker_status;
            config.last_worker_error = cursor.last_worker_error.clone();
            config.updated_at = clock.now();
            if let Err(err) = registry.upsert_chain(&config).await {
                error!(chain_id = chain_id.get(), %err, "failed to persist chain config status");
            }
        }
        Ok(None) => warn!(chain_id = chain_id.get(), "chain config missing while persisting tick status"),
        Err(err) => error!(chain_id = chain_id.get(), %err, "failed to load chain config to persist tick status"),
    }
}

async fn tick_once(
    chain_id: ChainId,
    max_block_range: u64,
    chain_pool: &dyn ChainClientPool,
    event_store: &dyn EventStore,
    clock: &dyn Clock,
    tuning: &ProcessorTuning,
    cursor: &mut ScanCursor,
) -> Result<()> {
    let client = chain_pool
        .get(chain_id)
        .ok_or_else(|| AppError::Initialization("chain client missing from pool".into()))?;

    let latest = client.latest_block().await?;

    let ScanWindow::Scan { from, to } =
        plan_next_window(max_block_range, cursor.last_processed_block, latest)
    else {
        return Ok(());
    };

    let outcome = processor::process_window(
        chain_id,
        client.as_ref(),
        event_store,
        clock,
        tuning,
        from,
        to,
    )
    .await?;

    cursor.last_processed_block = to;

    if outcome.fetched > 0 {
        info!(
            chain_id = chain_id.get(),
            from = from.get(),
            to = to.get(),
            new_events = outcome.new_events,
            "window processed"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supervisor_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WorkerSupervisor>();
    }
}
