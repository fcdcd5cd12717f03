//! PostgreSQL implementation of store ports using SQLx.
//!
//! # Type Conversions
//!
//! PostgreSQL uses signed integers for numeric columns while our domain
//! uses unsigned types. These casts are safe because:
//! - Chain ids and block numbers won't exceed i64::MAX
//! - Log indices and error counts won't exceed i32::MAX
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless,
    clippy::use_self
)]

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, postgres::PgPool};
use tracing::{debug, instrument};

use crate::error::{InfraError, Result};
use crate::ports::store::{ChainRegistry, EventFilter, EventKey, EventStore};
use crate::types::entities::{ChainConfig, FeeEvent, ScanCursor};
use crate::types::primitives::{BlockNumber, ChainId, EthAddress, FeeAmount};

// ═══════════════════════════════════════════════════════════════════════════════
// POSTGRES STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// `PostgreSQL`-based store implementation.
///
/// Implements both [`ChainRegistry`] and [`EventStore`] using `SQLx` for
/// database access.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new `PostgreSQL` store with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations.
    ///
    /// # Errors
    /// Returns an error if migrations fail.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| InfraError::Decode(format!("migration error: {e}")))?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHAIN REGISTRY IMPLEMENTATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, FromRow)]
struct ChainConfigRow {
    chain_id: i64,
    name: String,
    rpc_url: String,
    contract_address: Vec<u8>,
    starting_block: i64,
    scan_interval_ms: i64,
    max_block_range: i64,
    retry_attempts: i32,
    is_enabled: bool,
    worker_status: String,
    last_worker_start: Option<DateTime<Utc>>,
    last_worker_error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ChainConfigRow> for ChainConfig {
    type Error = InfraError;

    fn try_from(row: ChainConfigRow) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            chain_id: ChainId::new(row.chain_id as u64)
                .map_err(|e| InfraError::Decode(format!("invalid chain id in DB: {e}")))?,
            name: row.name,
            rpc_url: row.rpc_url,
            contract_address: EthAddress::from_slice(&row.contract_address)
                .map_err(|e| InfraError::Decode(format!("invalid contract address in DB: {e}")))?,
            starting_block: BlockNumber::new(row.starting_block as u64),
            scan_interval_ms: row.scan_interval_ms as u64,
            max_block_range: row.max_block_range as u64,
            retry_attempts: row.retry_attempts as u32,
            is_enabled: row.is_enabled,
            worker_status: row
                .worker_status
                .parse()
                .map_err(|e| InfraError::Decode(format!("invalid worker status in DB: {e}")))?,
            last_worker_start: row.last_worker_start,
            last_worker_error: row.last_worker_error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ScanCursorRow {
    chain_id: i64,
    last_processed_block: i64,
    is_active: bool,
    last_run_at: Option<DateTime<Utc>>,
    error_count: i32,
    last_error: Option<String>,
    worker_status: String,
    last_worker_start: Option<DateTime<Utc>>,
    last_worker_error: Option<String>,
}

impl TryFrom<ScanCursorRow> for ScanCursor {
    type Error = InfraError;

    fn try_from(row: ScanCursorRow) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            chain_id: ChainId::new(row.chain_id as u64)
                .map_err(|e| InfraError::Decode(format!("invalid chain id in DB: {e}")))?,
            last_processed_block: BlockNumber::new(row.last_processed_block as u64),
            is_active: row.is_active,
            last_run_at: row.last_run_at,
            error_count: row.error_count as u32,
            last_error: row.last_error,
            worker_status: row
                .worker_status
                .parse()
                .map_err(|e| InfraError::Decode(format!("invalid worker status in DB: {e}")))?,
            last_worker_start: row.last_worker_start,
            last_worker_error: row.last_worker_error,
        })
    }
}

#[async_trait]
impl ChainRegistry for PostgresStore {
    #[instrument(skip(self))]
    async fn list_chains(&self) -> Result<Vec<ChainConfig>> {
        let rows = sqlx::query_as::<_, ChainConfigRow>(
            r#"
            SELECT chain_id, name, rpc_url, contract_address, starting_block,
                   scan_interval_ms, max_block_range, retry_attempts, is_enabled,
                   worker_status, last_worker_start, last_worker_error,
                   created_at, updated_at
            FROM chain_configs
            ORDER BY chain_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(InfraError::Database)?;

        rows.into_iter()
            .map(|r| ChainConfig::try_from(r).map_err(Into::into))
            .collect()
    }

    #[instrument(skip(self), fields(chain_id = chain_id.get()))]
    async fn get_chain(&self, chain_id: ChainId) -> Result<Option<ChainConfig>> {
        let row = sqlx::query_as::<_, ChainConfigRow>(
            r#"
            SELECT chain_id, name, rpc_url, contract_address, starting_block,
                   scan_interval_ms, max_block_range, retry_attempts, is_enabled,
                   worker_status, last_worker_start, last_worker_error,
                   created_at, updated_at
            FROM chain_configs
            WHERE chain_id = $1
            "#,
        )
        .bind(chain_id.get() as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(InfraError::Database)?;

        row.map(ChainConfig::try_from).transpose().map_err(Into::into)
    }

    #[instrument(skip(self, config), fields(chain_id = config.chain_id.get()))]
    async fn upsert_chain(&self, config: &ChainConfig) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO chain_configs (
                chain_id, name, rpc_url, contract_address, starting_block,
                scan_interval_ms, max_block_range, retry_attempts, is_enabled,
                worker_status, last_worker_start, last_worker_error,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (chain_id) DO UPDATE SET
                name = EXCLUDED.name,
                rpc_url = EXCLUDED.rpc_url,
                contract_address = EXCLUDED.contract_address,
                starting_block = EXCLUDED.starting_block,
                scan_interval_ms = EXCLUDED.scan_interval_ms,
                max_block_range = EXCLUDED.max_block_range,
                retry_attempts = EXCLUDED.retry_attempts,
                is_enabled = EXCLUDED.is_enabled,
                worker_status = EXCLUDED.worker_status,
                last_worker_start = EXCLUDED.last_worker_start,
                last_worker_error = EXCLUDED.last_worker_error,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(config.chain_id.get() as i64)
        .bind(&config.name)
        .bind(config.rpc_url.clone())
        .bind(config.contract_address.as_bytes().as_slice())
        .bind(config.starting_block.get() as i64)
        .bind(config.scan_interval_ms as i64)
        .bind(config.max_block_range as i64)
        .bind(config.retry_attempts as i32)
        .bind(config.is_enabled)
        .bind(config.worker_status.to_string())
        .bind(config.last_worker_start)
        .bind(config.last_worker_error.clone())
        .bind(config.created_at)
        .bind(config.updated_at)
        .execute(&self.pool)
        .await
        .map_err(InfraError::Database)?;

        debug!("Chain config upserted");
        Ok(())
    }

    #[instrument(skip(self), fields(chain_id = chain_id.get()))]
    async fn delete_chain(&self, chain_id: ChainId) -> Result<()> {
        sqlx::query("DELETE FROM chain_configs WHERE chain_id = $1")
            .bind(chain_id.get() as i64)
            .execute(&self.pool)
            .await
            .map_err(InfraError::Database)?;

        debug!("Chain config deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(chain_id = chain_id.get()))]
    async fn get_cursor(&self, chain_id: ChainId) -> Result<Option<ScanCursor>> {
        let row = sqlx::query_as::<_, ScanCursorRow>(
            r#"
            SELECT chain_id, last_processed_block, is_active, last_run_at,
                   error_count, last_error, worker_status,
                   last_worker_start, last_worker_error
            FROM scan_cursors
            WHERE chain_id = $1
            "#,
        )
        .bind(chain_id.get() as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(InfraError::Database)?;

        row.map(ScanCursor::try_from).transpose().map_err(Into::into)
    }

    #[instrument(skip(self, cursor), fields(chain_id = cursor.chain_id.get()))]
    async fn upsert_cursor(&self, cursor: &ScanCursor) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO scan_cursors (
                chain_id, last_processed_block, is_active, last_run_at,
                error_count, last_error, worker_status,
                last_worker_start, last_worker_error
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (chain_id) DO UPDATE SET
                last_processed_block = EXCLUDED.last_processed_block,
                is_active = EXCLUDED.is_active,
                last_run_at = EXCLUDED.last_run_at,
                error_count = EXCLUDED.error_count,
                last_error = EXCLUDED.last_error,
                worker_status = EXCLUDED.worker_status,
                last_worker_start = EXCLUDED.last_worker_start,
                last_worker_error = EXCLUDED.last_worker_error
            "#,
        )
        .bind(cursor.chain_id.get() as i64)
        .bind(cursor.last_processed_block.get() as i64)
        .bind(cursor.is_active)
        .bind(cursor.last_run_at)
        .bind(cursor.error_count as i32)
        .bind(cursor.last_error.clone())
        .bind(cursor.worker_status.to_string())
        .bind(cursor.last_worker_start)
        .bind(cursor.last_worker_error.clone())
        .execute(&self.pool)
        .await
        .map_err(InfraError::Database)?;

        debug!("Scan cursor upserted");
        Ok(())
    }

    #[instrument(skip(self), fields(chain_id = chain_id.get()))]
    async fn delete_cursor(&self, chain_id: ChainId) -> Result<()> {
        sqlx::query("DELETE FROM scan_cursors WHERE chain_id = $1")
            .bind(chain_id.get() as i64)
            .execute(&self.pool)
            .await
            .map_err(InfraError::Database)?;

        debug!("Scan cursor deleted");
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT STORE IMPLEMENTATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, FromRow)]
struct FeeEventRow {
    chain_id: i64,
    block_number: i64,
    block_hash: String,
    transaction_hash: String,
    log_index: i32,
    token: Vec<u8>,
    integrator: Vec<u8>,
    integrator_fee: sqlx::types::BigDecimal,
    lifi_fee: sqlx::types::BigDecimal,
    timestamp: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<FeeEventRow> for FeeEvent {
    type Error = InfraError;

    fn try_from(row: FeeEventRow) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            chain_id: ChainId::new(row.chain_id as u64)
                .map_err(|e| InfraError::Decode(format!("invalid chain id in DB: {e}")))?,
            block_number: BlockNumber::new(row.block_number as u64),
            block_hash: row.block_hash,
            transaction_hash: row.transaction_hash,
            log_index: row.log_index as u32,
            token: EthAddress::from_slice(&row.token)
                .map_err(|e| InfraError::Decode(format!("invalid token address in DB: {e}")))?,
            integrator: EthAddress::from_slice(&row.integrator).map_err(|e| {
                InfraError::Decode(format!("invalid integrator address in DB: {e}"))
            })?,
            integrator_fee: FeeAmount::from_bigdecimal(&row.integrator_fee)
                .map_err(|e| InfraError::Decode(format!("invalid integrator fee in DB: {e}")))?,
            lifi_fee: FeeAmount::from_bigdecimal(&row.lifi_fee)
                .map_err(|e| InfraError::Decode(format!("invalid lifi fee in DB: {e}")))?,
            timestamp: row.timestamp,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl EventStore for PostgresStore {
    #[instrument(skip(self, keys), fields(count = keys.len()))]
    async fn find_existing_keys(&self, keys: &[EventKey]) -> Result<HashSet<EventKey>> {
        if keys.is_empty() {
            return Ok(HashSet::new());
        }

        let chain_ids: Vec<i64> = keys.iter().map(|(c, _, _)| c.get() as i64).collect();
        let tx_hashes: Vec<String> = keys.iter().map(|(_, h, _)| h.clone()).collect();
        let log_indices: Vec<i32> = keys.iter().map(|(_, _, i)| *i as i32).collect();

        let rows: Vec<(i64, String, i32)> = sqlx::query_as(
            r#"
            SELECT chain_id, transaction_hash, log_index
            FROM fee_events
            WHERE (chain_id, transaction_hash, log_index) IN (
                SELECT * FROM UNNEST($1::bigint[], $2::text[], $3::int[])
            )
            "#,
        )
        .bind(&chain_ids)
        .bind(&tx_hashes)
        .bind(&log_indices)
        .fetch_all(&self.pool)
        .await
        .map_err(InfraError::Database)?;

        rows.into_iter()
            .map(|(chain_id, tx_hash, log_index)| {
                let chain_id = ChainId::new(chain_id as u64)
                    .map_err(|e| InfraError::Decode(format!("invalid chain id in DB: {e}")))?;
                Ok((chain_id, tx_hash, log_index as u32))
            })
            .collect()
    }

    #[instrument(skip(self, events), fields(count = events.len()))]
    async fn insert_many(&self, events: &[FeeEvent]) -> Result<u64> {
        if events.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(InfraError::Database)?;
        let mut inserted = 0_u64;

        for event in events {
            let result = sqlx::query(
                r#"
                INSERT INTO fee_events (
                    chain_id, block_number, block_hash, transaction_hash, log_index,
                    token, integrator, integrator_fee, lifi_fee, timestamp, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ON CONFLICT (chain_id, transaction_hash, log_index) DO NOTHING
                "#,
            )
            .bind(event.chain_id.get() as i64)
            .bind(event.block_number.get() as i64)
            .bind(&event.block_hash)
            .bind(&event.transaction_hash)
            .bind(event.log_index as i32)
            .bind(event.token.as_bytes().as_slice())
            .bind(event.integrator.as_bytes().as_slice())
            .bind(event.integrator_fee.to_bigdecimal())
            .bind(event.lifi_fee.to_bigdecimal())
            .bind(event.timestamp)
            .bind(event.created_at)
            .execute(&mut *tx)
            .await
            .map_err(InfraError::Database)?;

            inserted += result.rows_affected();
        }

        tx.commit().await.map_err(InfraError::Database)?;

        debug!(inserted, "Fee events inserted");
        Ok(inserted)
    }

    #[instrument(skip(self, filter))]
    async fn count_by_filter(&self, filter: &EventFilter) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM fee_events
            WHERE ($1::bigint IS NULL OR chain_id = $1)
              AND ($2::bytea IS NULL OR integrator = $2)
              AND ($3::timestamptz IS NULL OR timestamp >= $3)
              AND ($4::timestamptz IS NULL OR timestamp < $4)
            "#,
        )
        .bind(filter.chain_id.map(|c| c.get() as i64))
        .bind(filter.integrator.as_ref().map(|a| a.as_bytes().to_vec()))
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(&self.pool)
        .await
        .map_err(InfraError::Database)?;

        Ok(count as u64)
    }

    #[instrument(skip(self, filter))]
    async fn find_by_filter(&self, filter: &EventFilter) -> Result<Vec<FeeEvent>> {
        let limit = i64::from(filter.limit.unwrap_or(100));

        let rows = sqlx::query_as::<_, FeeEventRow>(
            r#"
            SELECT chain_id, block_number, block_hash, transaction_hash, log_index,
                   token, integrator, integrator_fee, lifi_fee, timestamp, created_at
            FROM fee_events
            WHERE ($1::bigint IS NULL OR chain_id = $1)
              AND ($2::bytea IS NULL OR integrator = $2)
              AND ($3::timestamptz IS NULL OR timestamp >= $3)
              AND ($4::timestamptz IS NULL OR timestamp < $4)
            ORDER BY timestamp DESC
            LIMIT $5
            OFFSET $6
            "#,
        )
        .bind(filter.chain_id.map(|c| c.get() as i64))
        .bind(filter.integrator.as_ref().map(|a| a.as_bytes().to_vec()))
        .bind(filter.from)
        .bind(filter.to)
        .bind(limit)
        .bind(filter.offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(InfraError::Database)?;

        rows.into_iter()
            .map(|r| FeeEvent::try_from(r).map_err(Into::into))
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
