//! Test fixtures for integration tests.

use fee_indexer::store::PostgresStore;
use sqlx::PgPool;
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;

use super::containers::{Postgres, build_connection_string};

/// A test database instance with pool and container.
///
/// The container is kept alive as long as this struct exists. When dropped,
/// the container is automatically stopped.
pub struct TestDb {
    /// The connection pool to the test database.
    pub pool: PgPool,
    /// The `PostgresStore` wrapping the pool.
    pub store: PostgresStore,
    /// The container (kept alive for the duration of the test).
    _container: ContainerAsync<Postgres>,
}

impl TestDb {
    /// Start a fresh Postgres container, connect, and run migrations.
    ///
    /// # Panics
    /// Panics if container startup, connection, or migrations fail.
    pub async fn new() -> Self {
        let container = Postgres::default()
            .start()
            .await
            .expect("failed to start postgres container");

        let host = container.get_host().await.expect("failed to get host");
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("failed to get port");

        let connection_string = build_connection_string(&host.to_string(), port);
        let pool = connect_with_retries(&connection_string, 30)
            .await
            .expect("failed to connect to database");

        let store = PostgresStore::new(pool.clone());
        store.run_migrations().await.expect("failed to run migrations");

        Self {
            pool,
            store,
            _container: container,
        }
    }
}

/// Connect with retries; the container can take a moment to accept
/// connections even after its ready message appears.
async fn connect_with_retries(url: &str, max_attempts: u32) -> Result<PgPool, sqlx::Error> {
    let mut attempts = 0;
    loop {
        attempts += 1;
        match PgPool::connect(url).await {
            Ok(pool) => match sqlx::query("SELECT 1").execute(&pool).await {
                Ok(_) => return Ok(pool),
                Err(e) if attempts < max_attempts => {
                    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                    let _ = e;
                }
                Err(e) => return Err(e),
            },
            Err(e) if attempts < max_attempts => {
                tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                let _ = e;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Builders for `ChainConfig`/`ScanCursor`/`FeeEvent` fixtures.
pub mod chain_fixtures {
    use chrono::Utc;

    use fee_indexer::types::entities::{ChainConfig, FeeEvent, ScanCursor};
    use fee_indexer::types::enums::WorkerStatus;
    use fee_indexer::types::primitives::{BlockNumber, ChainId, EthAddress, FeeAmount};

    /// A configured chain with sane defaults, disabled by default.
    pub fn create_test_chain(chain_id: u64) -> ChainConfig {
        let now = Utc::now();
        ChainConfig {
            chain_id: ChainId::new(chain_id).expect("valid chain id"),
            name: format!("test-chain-{chain_id}"),
            rpc_url: format!("https://rpc.example.com/{chain_id}"),
            contract_address: EthAddress::ZERO,
            starting_block: BlockNumber::new(100),
            scan_interval_ms: ChainConfig::DEFAULT_SCAN_INTERVAL_MS,
            max_block_range: ChainConfig::DEFAULT_MAX_BLOCK_RANGE,
            retry_attempts: ChainConfig::DEFAULT_RETRY_ATTEMPTS,
            is_enabled: false,
            worker_status: WorkerStatus::Stopped,
            last_worker_start: None,
            last_worker_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The initial cursor for a freshly registered chain.
    pub fn create_initial_cursor(chain_id: u64, starting_block: u64) -> ScanCursor {
        ScanCursor::initial(
            ChainId::new(chain_id).expect("valid chain id"),
            BlockNumber::new(starting_block),
        )
    }

    /// A decoded fee event ready for insertion.
    pub fn create_test_event(chain_id: u64, tx_hash: &str, log_index: u32) -> FeeEvent {
        let now = Utc::now();
        FeeEvent {
            chain_id: ChainId::new(chain_id).expect("valid chain id"),
            block_number: BlockNumber::new(100),
            block_hash: "0xblock".to_string(),
            transaction_hash: tx_hash.to_string(),
            log_index,
            token: EthAddress::ZERO,
            integrator: EthAddress::ZERO,
            integrator_fee: FeeAmount::parse("1000").expect("valid amount"),
            lifi_fee: FeeAmount::parse("50").expect("valid amount"),
            timestamp: now,
            created_at: now,
        }
    }
}
