//! Domain entities for database persistence.
//!
//! These structs represent the application's core domain objects that are
//! persisted to the database: the operator-facing configuration of a chain,
//! the worker's private progress cursor on that chain, and the events the
//! worker has discovered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::WorkerStatus;
use super::primitives::{BlockNumber, ChainId, EthAddress, FeeAmount};

// ═══════════════════════════════════════════════════════════════════════════════
// CHAIN CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Operator-facing configuration for a single chain, as held by the Chain
/// Registry. Mutating this is the only way to change what a worker scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// EIP-155 chain id. Natural key.
    pub chain_id: ChainId,
    /// Operator-supplied display name.
    pub name: String,
    /// HTTP(S) JSON-RPC endpoint.
    pub rpc_url: String,
    /// Address of the deployed fee-collector contract on this chain.
    pub contract_address: EthAddress,
    /// Block to start scanning from when no cursor exists yet.
    pub starting_block: BlockNumber,
    /// Milliseconds between scan ticks.
    pub scan_interval_ms: u64,
    /// Maximum number of blocks requested per `eth_getLogs` call.
    pub max_block_range: u64,
    /// Number of retries the Chain Client Pool performs on a transient RPC failure.
    pub retry_attempts: u32,
    /// Whether the chain should be scanned at all.
    pub is_enabled: bool,
    /// Current lifecycle state of this chain's worker.
    pub worker_status: WorkerStatus,
    /// When the worker for this chain last transitioned into `Starting`.
    pub last_worker_start: Option<DateTime<Utc>>,
    /// Message from the worker's most recent error, if any.
    pub last_worker_error: Option<String>,
    /// When this config was first created.
    pub created_at: DateTime<Utc>,
    /// When this config was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ChainConfig {
    /// Default scan interval, in milliseconds, applied when not specified.
    pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 30_000;
    /// Minimum accepted scan interval, in milliseconds.
    pub const MIN_SCAN_INTERVAL_MS: u64 = 5_000;
    /// Maximum accepted scan interval, in milliseconds.
    pub const MAX_SCAN_INTERVAL_MS: u64 = 300_000;
    /// Default starting block applied when not specified.
    pub const DEFAULT_STARTING_BLOCK: u64 = 70_000_000;
    /// Default maximum block range applied when not specified.
    pub const DEFAULT_MAX_BLOCK_RANGE: u64 = 1_000;
    /// Minimum accepted maximum block range.
    pub const MIN_MAX_BLOCK_RANGE: u64 = 100;
    /// Maximum accepted maximum block range.
    pub const MAX_MAX_BLOCK_RANGE: u64 = 10_000;
    /// Default retry attempts applied when not specified.
    pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
    /// Minimum accepted retry attempts.
    pub const MIN_RETRY_ATTEMPTS: u32 = 1;
    /// Maximum accepted retry attempts.
    pub const MAX_RETRY_ATTEMPTS: u32 = 10;
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCAN CURSOR
// ═══════════════════════════════════════════════════════════════════════════════

/// The worker's private progress state for a chain.
///
/// Owned by the Worker Supervisor, persisted by the Event Store so it
/// survives a restart. Never read or written directly by the control plane
/// except through `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCursor {
    /// Which chain this cursor tracks.
    pub chain_id: ChainId,
    /// Highest block number fully processed so far.
    pub last_processed_block: BlockNumber,
    /// Whether the worker is currently ticking.
    pub is_active: bool,
    /// When the worker last completed a tick (success or failure).
    pub last_run_at: Option<DateTime<Utc>>,
    /// Consecutive tick failures since the last success.
    pub error_count: u32,
    /// Message from the most recent tick failure, if any.
    pub last_error: Option<String>,
    /// Mirrors `ChainConfig::worker_status` for this chain.
    pub worker_status: WorkerStatus,
    /// Mirrors `ChainConfig::last_worker_start` for this chain.
    pub last_worker_start: Option<DateTime<Utc>>,
    /// Mirrors `ChainConfig::last_worker_error` for this chain.
    pub last_worker_error: Option<String>,
}

impl ScanCursor {
    /// Build the initial cursor for a chain that has never been scanned.
    ///
    /// The stored value is `starting_block - 1` so that the Block-Range
    /// Planner's `from = cursor + 1` yields `starting_block` as the first
    /// window's lower bound.
    #[must_use]
    pub fn initial(chain_id: ChainId, starting_block: BlockNumber) -> Self {
        Self {
            chain_id,
            last_processed_block: starting_block.prev(),
            is_active: false,
            last_run_at: None,
            error_count: 0,
            last_error: None,
            worker_status: WorkerStatus::Starting,
            last_worker_start: None,
            last_worker_error: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FEE EVENT
// ═══════════════════════════════════════════════════════════════════════════════

/// A single decoded, enriched `FeesCollected` log.
///
/// Natural key is `(chain_id, transaction_hash, log_index)`; this is what
/// the Event Store deduplicates on, not a surrogate id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEvent {
    /// Chain this event was collected from.
    pub chain_id: ChainId,
    /// Block the event was included in.
    pub block_number: BlockNumber,
    /// Hash of the including block.
    pub block_hash: String,
    /// Hash of the transaction that emitted the event.
    pub transaction_hash: String,
    /// Index of the log within its transaction's receipt.
    pub log_index: u32,
    /// Collected token's contract address.
    pub token: EthAddress,
    /// Address credited as the fee's integrator.
    pub integrator: EthAddress,
    /// Fee amount credited to the integrator, in the token's smallest unit.
    pub integrator_fee: FeeAmount,
    /// Fee amount credited to the protocol, in the token's smallest unit.
    pub lifi_fee: FeeAmount,
    /// Timestamp of the including block, or the enrichment time if the
    /// block lookup failed and the processor fell back to "now".
    pub timestamp: DateTime<Utc>,
    /// When this row was first inserted.
    pub created_at: DateTime<Utc>,
}

impl FeeEvent {
    /// The natural key this event is deduplicated on.
    #[must_use]
    pub fn natural_key(&self) -> (ChainId, String, u32) {
        (self.chain_id, self.transaction_hash.clone(), self.log_index)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn initial_cursor_is_one_below_starting_block() {
        let chain_id = ChainId::new(1).unwrap();
        let cursor = ScanCursor::initial(chain_id, BlockNumber::new(70_000_000));
        assert_eq!(cursor.last_processed_block.get(), 69_999_999);
    }

    #[test]
    fn initial_cursor_at_zero_saturates() {
        let chain_id = ChainId::new(1).unwrap();
        let cursor = ScanCursor::initial(chain_id, BlockNumber::new(0));
        assert_eq!(cursor.last_processed_block.get(), 0);
    }

    #[test]
    fn natural_key_matches_fields() {
        let chain_id = ChainId::new(10).unwrap();
        let event = FeeEvent {
            chain_id,
            block_number: BlockNumber::new(1),
            block_hash: "0xblock".to_string(),
            transaction_hash: "0xtx".to_string(),
            log_index: 3,
            token: EthAddress::ZERO,
            integrator: EthAddress::ZERO,
            integrator_fee: FeeAmount::zero(),
            lifi_fee: FeeAmount::zero(),
            timestamp: Utc::now(),
            created_at: Utc::now(),
        };
        assert_eq!(event.natural_key(), (chain_id, "0xtx".to_string(), 3));
    }
}
