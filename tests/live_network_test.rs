//! Live network integration tests against a real EVM JSON-RPC endpoint.
//!
//! These tests validate `AlloyChainClient` against a real chain rather than
//! a mock: connecting, reading the chain head, and fetching `FeesCollected`
//! logs for LI.FI's deployed fee collector. They are ignored by default
//! since they require network access and a real contract deployment.
//!
//! # Running
//!
//! ```bash
//! # Polygon mainnet, LI.FI's diamond contract
//! export LIVE_RPC_URL=https://polygon-rpc.com
//! export LIVE_CHAIN_ID=137
//! export LIVE_CONTRACT_ADDRESS=0x1231deb6f5749ef6ce6943a275a1d3e7486f4eae
//! cargo test --test live_network_test -- --ignored --nocapture
//! ```

use std::time::Duration;

use fee_indexer::chain::AlloyChainClient;
use fee_indexer::ports::ChainClient;
use fee_indexer::types::entities::ChainConfig;
use fee_indexer::types::enums::WorkerStatus;
use fee_indexer::types::primitives::{BlockNumber, ChainId, EthAddress};
use tracing::info;

const DEFAULT_RPC_URL: &str = "https://polygon-rpc.com";
const DEFAULT_CHAIN_ID: u64 = 137;
const DEFAULT_CONTRACT_ADDRESS: &str = "0x1231deb6f5749ef6ce6943a275a1d3e7486f4eae";

fn live_rpc_url() -> String {
    std::env::var("LIVE_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string())
}

fn live_chain_id() -> u64 {
    std::env::var("LIVE_CHAIN_ID")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_CHAIN_ID)
}

fn live_contract_address() -> String {
    std::env::var("LIVE_CONTRACT_ADDRESS").unwrap_or_else(|_| DEFAULT_CONTRACT_ADDRESS.to_string())
}

fn live_chain_config() -> ChainConfig {
    let now = chrono::Utc::now();
    ChainConfig {
        chain_id: ChainId::new(live_chain_id()).expect("valid chain id"),
        name: "live-test".to_string(),
        rpc_url: live_rpc_url(),
        contract_address: EthAddress::from_hex(&live_contract_address()).expect("valid address"),
        starting_block: BlockNumber::new(0),
        scan_interval_ms: ChainConfig::DEFAULT_SCAN_INTERVAL_MS,
        max_block_range: ChainConfig::DEFAULT_MAX_BLOCK_RANGE,
        retry_attempts: ChainConfig::DEFAULT_RETRY_ATTEMPTS,
        is_enabled: true,
        worker_status: WorkerStatus::Stopped,
        last_worker_start: None,
        last_worker_error: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
#[ignore = "requires network access"]
async fn connect_reports_the_configured_chain_id() {
    tracing_subscriber::fmt::try_init().ok();

    let config = live_chain_config();
    let client = AlloyChainClient::connect(&config, Duration::from_millis(500))
        .await
        .expect("failed to connect to live RPC");

    assert_eq!(client.chain_id(), config.chain_id);
}

#[tokio::test]
#[ignore = "requires network access"]
async fn latest_block_is_positive_and_advancing() {
    tracing_subscriber::fmt::try_init().ok();

    let config = live_chain_config();
    let client = AlloyChainClient::connect(&config, Duration::from_millis(500))
        .await
        .expect("failed to connect to live RPC");

    let first = client.latest_block().await.expect("failed to get latest block");
    assert!(first.get() > 0);

    tokio::time::sleep(Duration::from_secs(5)).await;

    let second = client.latest_block().await.expect("failed to get latest block");
    assert!(
        second.get() >= first.get(),
        "chain head should not move backwards between two reads"
    );

    info!(first = first.get(), second = second.get(), "observed chain head");
}

#[tokio::test]
#[ignore = "requires network access"]
async fn query_logs_decodes_recent_fees_collected_events() {
    tracing_subscriber::fmt::try_init().ok();

    let config = live_chain_config();
    let client = AlloyChainClient::connect(&config, Duration::from_millis(500))
        .await
        .expect("failed to connect to live RPC");

    let latest = client.latest_block().await.expect("failed to get latest block");
    let from = BlockNumber::new(latest.get().saturating_sub(2_000));

    let outcomes = client
        .query_logs(from, latest)
        .await
        .expect("failed to query logs");

    info!(count = outcomes.len(), from = from.get(), to = latest.get(), "fetched logs");

    for outcome in &outcomes {
        let log = outcome.as_ref().expect("live logs should decode cleanly");
        assert_eq!(log.token.as_bytes().len(), 20);
        assert_eq!(log.integrator.as_bytes().len(), 20);
    }
}

#[tokio::test]
#[ignore = "requires network access"]
async fn probe_succeeds_against_a_reachable_endpoint() {
    tracing_subscriber::fmt::try_init().ok();

    AlloyChainClient::probe_rpc_url(&live_rpc_url(), Duration::from_secs(5))
        .await
        .expect("probe should succeed against a reachable endpoint");
}

#[tokio::test]
#[ignore = "requires network access"]
async fn probe_fails_against_an_unreachable_endpoint() {
    let result = AlloyChainClient::probe_rpc_url(
        "https://127.0.0.1:1",
        Duration::from_millis(500),
    )
    .await;

    assert!(result.is_err());
}
