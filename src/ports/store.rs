//! Storage port traits for data persistence.
//!
//! These traits define the contract for persisting and retrieving domain
//! entities. Infrastructure adapters implement these traits using concrete
//! storage backends (e.g., PostgreSQL).

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::entities::{ChainConfig, FeeEvent, ScanCursor};
use crate::types::primitives::{ChainId, EthAddress};

// ═══════════════════════════════════════════════════════════════════════════════
// CHAIN REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Port for `ChainConfig` and `ScanCursor` persistence.
///
/// The Control Plane is the only caller that mutates `ChainConfig`; the
/// Worker Supervisor is the only caller that mutates `ScanCursor`. Both read
/// through the same trait since both rows are keyed by the same chain id.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Index on `chain_id` (the natural key) for both tables
/// - Treat `upsert_chain`/`upsert_cursor` as create-or-replace, not a merge
#[async_trait]
pub trait ChainRegistry: Send + Sync {
    /// List every configured chain, enabled or not.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn list_chains(&self) -> Result<Vec<ChainConfig>>;

    /// Get a single chain's configuration.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn get_chain(&self, chain_id: ChainId) -> Result<Option<ChainConfig>>;

    /// Create or fully replace a chain's configuration.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    async fn upsert_chain(&self, config: &ChainConfig) -> Result<()>;

    /// Delete a chain's configuration.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    async fn delete_chain(&self, chain_id: ChainId) -> Result<()>;

    /// Get a chain's scan cursor.
    ///
    /// Returns `None` if the chain has never been scanned.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn get_cursor(&self, chain_id: ChainId) -> Result<Option<ScanCursor>>;

    /// Create or fully replace a chain's scan cursor.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    async fn upsert_cursor(&self, cursor: &ScanCursor) -> Result<()>;

    /// Delete a chain's scan cursor.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    async fn delete_cursor(&self, chain_id: ChainId) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// A natural key for a `FeeEvent`: `(chain_id, transaction_hash, log_index)`.
pub type EventKey = (ChainId, String, u32);

/// Filter for querying persisted fee events.
///
/// Mirrors the read surface the (out-of-scope) API layer needs: filtering by
/// chain, integrator, and time range, with pagination.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Restrict to a single chain.
    pub chain_id: Option<ChainId>,
    /// Restrict to events crediting this integrator.
    pub integrator: Option<EthAddress>,
    /// Restrict to events with `timestamp >= from`.
    pub from: Option<DateTime<Utc>>,
    /// Restrict to events with `timestamp < to`.
    pub to: Option<DateTime<Utc>>,
    /// Maximum rows to return. `None` means the store's default page size.
    pub limit: Option<u32>,
    /// Rows to skip before collecting `limit` results.
    pub offset: u64,
}

/// Port for `FeeEvent` persistence.
///
/// The Event Processor is the only caller that mutates this store. Reads
/// (`count_by_filter`/`find_by_filter`) exist for the (out-of-scope) API
/// layer and for tests; they are not on the per-tick hot path.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Enforce a unique constraint on `(chain_id, transaction_hash, log_index)`
/// - Make `insert_many` idempotent under that constraint (insert-or-ignore)
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Return the subset of `keys` that already exist in storage.
    ///
    /// Used by the Event Processor to filter out already-seen events before
    /// inserting a new batch.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn find_existing_keys(&self, keys: &[EventKey]) -> Result<HashSet<EventKey>>;

    /// Insert a batch of events, ignoring rows whose natural key collides
    /// with one already in storage.
    ///
    /// Returns the number of rows actually inserted.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    async fn insert_many(&self, events: &[FeeEvent]) -> Result<u64>;

    /// Count events matching a filter.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn count_by_filter(&self, filter: &EventFilter) -> Result<u64>;

    /// Fetch events matching a filter, most recent first.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn find_by_filter(&self, filter: &EventFilter) -> Result<Vec<FeeEvent>>;
}
