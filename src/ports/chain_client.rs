//! Chain Client Pool port: per-chain RPC access and log decoding.
//!
//! A `ChainClient` wraps a single chain's RPC endpoint. The pool
//! (`ChainClientPool`) owns one client per configured chain and is the only
//! thing in the system that talks to an RPC node.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::error::Result;
use crate::types::entities::ChainConfig;
use crate::types::primitives::{BlockNumber, ChainId, EthAddress, FeeAmount};

// ═══════════════════════════════════════════════════════════════════════════════
// RAW FEE LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// A decoded `FeesCollected` log, still carrying its on-chain position but
/// not yet enriched with a block timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFeeLog {
    /// Block the log was included in.
    pub block_number: BlockNumber,
    /// Hash of the including block.
    pub block_hash: String,
    /// Hash of the transaction that emitted the log.
    pub transaction_hash: String,
    /// Index of the log within its transaction's receipt.
    pub log_index: u32,
    /// Collected token's contract address.
    pub token: EthAddress,
    /// Address credited as the fee's integrator.
    pub integrator: EthAddress,
    /// Fee amount credited to the integrator.
    pub integrator_fee: FeeAmount,
    /// Fee amount credited to the protocol.
    pub lifi_fee: FeeAmount,
}

/// A single log's decode outcome: either the decoded event, or the reason
/// it couldn't be decoded. One malformed log must not fail the whole
/// `query_logs` call (`spec.md` §7 `DecodeError` policy) — decoding is a
/// fallible step per log, not an all-or-nothing step over the window.
pub type LogDecodeOutcome = std::result::Result<RawFeeLog, DecodeError>;

/// A single log could not be decoded as `FeesCollected`.
#[derive(Debug, Clone, Error)]
#[error("failed to decode log as FeesCollected: {0}")]
pub struct DecodeError(pub String);

// ═══════════════════════════════════════════════════════════════════════════════
// CHAIN CLIENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Port for talking to a single chain's RPC endpoint.
///
/// Implementations own their own retry policy (`spec.md` §4.1: `retryAttempts`
/// retries with a fixed 1s pause) — callers see either a successful result or
/// a terminal `AppError::RpcUnavailable`.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The chain this client talks to.
    fn chain_id(&self) -> ChainId;

    /// Current chain head, per `eth_blockNumber`.
    ///
    /// # Errors
    /// Returns `AppError::RpcUnavailable` if the endpoint is unreachable
    /// after retrying.
    async fn latest_block(&self) -> Result<BlockNumber>;

    /// Fetch logs in `[from, to]` (inclusive) and decode each one
    /// (`spec.md` §4.1's `decode(rawLog)` step) independently.
    ///
    /// A log that fails to decode does not fail the call: it comes back as
    /// an `Err(DecodeError)` entry in the returned vec, in log order,
    /// alongside every log that decoded cleanly. Callers decide how many
    /// per-log decode failures are tolerable.
    ///
    /// # Errors
    /// Returns `AppError::RpcUnavailable` on a transport failure fetching
    /// the logs themselves.
    async fn query_logs(&self, from: BlockNumber, to: BlockNumber) -> Result<Vec<LogDecodeOutcome>>;

    /// Timestamp of a single block, per `eth_getBlockByNumber`.
    ///
    /// # Errors
    /// Returns `AppError::RpcUnavailable` if the endpoint is unreachable
    /// after retrying, or `AppError::NotFound` if the block doesn't exist.
    async fn block_timestamp(&self, block: BlockNumber) -> Result<DateTime<Utc>>;

    /// Reachability check used by the control plane's probe gate before a
    /// `rpcUrl` change is committed. Does not consult or mutate any cursor.
    ///
    /// # Errors
    /// Returns `AppError::RpcUnavailable` if the endpoint cannot be reached.
    async fn probe(&self) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHAIN CLIENT POOL
// ═══════════════════════════════════════════════════════════════════════════════

/// Port for the pool of per-chain RPC clients.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Replace rather than mutate a chain's client when `ensure` is called
///   with a changed `rpc_url` or `contract_address`
/// - Make `get` a cheap, lock-free lookup on the common path
#[async_trait]
pub trait ChainClientPool: Send + Sync {
    /// Create (or replace, if the RPC URL/contract changed) the client for
    /// this chain and install it in the pool.
    ///
    /// # Errors
    /// Returns `AppError::RpcUnavailable` if the endpoint can't be reached
    /// while establishing the client.
    async fn ensure(&self, config: &ChainConfig) -> Result<()>;

    /// Remove a chain's client from the pool, if present.
    fn drop_chain(&self, chain_id: ChainId);

    /// Look up a chain's client.
    fn get(&self, chain_id: ChainId) -> Option<Arc<dyn ChainClient>>;

    /// Reachability probe for an RPC URL that has not (yet) been installed
    /// into the pool. Used by the control plane's probe gate.
    ///
    /// # Errors
    /// Returns `AppError::RpcUnavailable` if the endpoint cannot be reached.
    async fn probe_url(&self, rpc_url: &str) -> Result<()>;
}
