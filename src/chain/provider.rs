//! `AlloyChainClient`: a [`ChainClient`] implementation backed by `alloy`'s
//! HTTP transport.
//!
//! # Example
//!
//! ```ignore
//! use fee_indexer::chain::AlloyChainClient;
//!
//! let client = AlloyChainClient::connect(chain_id, &config, retry_base_delay).await?;
//! let latest = client.latest_block().await?;
//! ```

use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::{BlockNumberOrTag, Filter};
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, instrument, warn};

use crate::abi::FeesCollected;
use crate::error::{AppError, InfraError, Result};
use crate::ports::{ChainClient, DecodeError, LogDecodeOutcome, RawFeeLog};
use crate::types::entities::ChainConfig;
use crate::types::primitives::{BlockNumber, ChainId, EthAddress, FeeAmount};

/// A [`ChainClient`] backed by a single `alloy` HTTP provider.
///
/// Retries every fallible RPC call `retry_attempts` times with a fixed
/// pause (`spec.md` §4.1), surfacing `AppError::RpcUnavailable` only once
/// retries are exhausted.
#[derive(Debug, Clone)]
pub struct AlloyChainClient {
    provider: RootProvider,
    chain_id: ChainId,
    contract_address: Address,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl AlloyChainClient {
    /// Connect to `config.rpc_url` and verify it reports `config.chain_id`.
    ///
    /// # Errors
    /// Returns `AppError::RpcUnavailable` if the endpoint is unreachable or
    /// reports a different chain id than configured.
    pub async fn connect(config: &ChainConfig, retry_delay: Duration) -> Result<Self> {
        let url: reqwest::Url = config
            .rpc_url
            .parse()
            .map_err(|e| AppError::RpcUnavailable(format!("invalid RPC url: {e}")))?;

        let provider = ProviderBuilder::new().connect_http(url);

        let reported = provider
            .get_chain_id()
            .await
            .map_err(|e| AppError::RpcUnavailable(format!("chain id probe failed: {e}")))?;

        if reported != config.chain_id.get() {
            return Err(AppError::RpcUnavailable(format!(
                "rpcUrl reports chain id {reported}, expected {}",
                config.chain_id.get()
            )));
        }

        debug!(chain_id = config.chain_id.get(), "connected to chain");

        Ok(Self {
            provider,
            chain_id: config.chain_id,
            contract_address: Address::from(*config.contract_address.as_bytes()),
            retry_attempts: config.retry_attempts,
            retry_delay,
        })
    }

    /// Reachability probe for an arbitrary RPC URL (not yet a full client).
    ///
    /// # Errors
    /// Returns `AppError::RpcUnavailable` if the endpoint cannot be reached.
    pub async fn probe_rpc_url(rpc_url: &str, timeout: Duration) -> Result<()> {
        let url: reqwest::Url = rpc_url
            .parse()
            .map_err(|e| AppError::RpcUnavailable(format!("invalid RPC url: {e}")))?;

        let provider = ProviderBuilder::new().connect_http(url);

        tokio::time::timeout(timeout, provider.get_chain_id())
            .await
            .map_err(|_| AppError::RpcUnavailable("probe timed out".into()))?
            .map_err(|e| AppError::RpcUnavailable(format!("probe failed: {e}")))?;

        Ok(())
    }

    async fn with_retries<T, F, Fut>(&self, op_name: &str, f: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, alloy::transports::RpcError<alloy::transports::TransportErrorKind>>>,
    {
        let mut last_err = None;
        for attempt in 1..=self.retry_attempts.max(1) {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    warn!(chain_id = self.chain_id.get(), op = op_name, attempt, %err, "RPC call failed");
                    last_err = Some(err);
                    if attempt < self.retry_attempts.max(1) {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }
        Err(AppError::RpcUnavailable(format!(
            "{op_name} failed after {} attempts: {}",
            self.retry_attempts.max(1),
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    #[instrument(skip(self), fields(chain_id = self.chain_id.get()))]
    async fn latest_block(&self) -> Result<BlockNumber> {
        let number = self
            .with_retries("eth_blockNumber", || self.provider.get_block_number())
            .await?;
        Ok(BlockNumber::new(number))
    }

    #[instrument(skip(self), fields(chain_id = self.chain_id.get(), from = from.get(), to = to.get()))]
    async fn query_logs(&self, from: BlockNumber, to: BlockNumber) -> Result<Vec<LogDecodeOutcome>> {
        let filter = Filter::new()
            .address(self.contract_address)
            .event_signature(FeesCollected::SIGNATURE_HASH)
            .from_block(BlockNumberOrTag::Number(from.get()))
            .to_block(BlockNumberOrTag::Number(to.get()));

        let logs = self
            .with_retries("eth_getLogs", || self.provider.get_logs(&filter))
            .await?;

        Ok(logs.into_iter().map(decode_log).collect())
    }

    #[instrument(skip(self), fields(chain_id = self.chain_id.get(), block = block.get()))]
    async fn block_timestamp(&self, block: BlockNumber) -> Result<DateTime<Utc>> {
        let fetched = self
            .with_retries("eth_getBlockByNumber", || {
                self.provider
                    .get_block_by_number(BlockNumberOrTag::Number(block.get()))
            })
            .await?;

        let header = fetched.ok_or(InfraError::NotFound)?;
        Utc.timestamp_opt(i64::try_from(header.header.timestamp).unwrap_or(i64::MAX), 0)
            .single()
            .ok_or_else(|| InfraError::Decode("block timestamp out of range".into()).into())
    }

    #[instrument(skip(self), fields(chain_id = self.chain_id.get()))]
    async fn probe(&self) -> Result<()> {
        self.with_retries("probe", || self.provider.get_chain_id())
            .await?;
        Ok(())
    }
}

/// Decode a single raw log as `FeesCollected` (`spec.md` §4.1's `decode(rawLog)`
/// step). Fallible per log: a log missing an expected field or failing
/// `log_decode` yields `Err` rather than aborting the batch it came from.
fn decode_log(log: alloy::rpc::types::Log) -> LogDecodeOutcome {
    let block_number = log
        .block_number
        .ok_or_else(|| DecodeError("log missing block number".into()))?;
    let block_hash = log
        .block_hash
        .ok_or_else(|| DecodeError("log missing block hash".into()))?;
    let transaction_hash = log
        .transaction_hash
        .ok_or_else(|| DecodeError("log missing transaction hash".into()))?;
    let log_index = log
        .log_index
        .ok_or_else(|| DecodeError("log missing log index".into()))?;

    let decoded = log
        .log_decode::<FeesCollected>()
        .map_err(|e| DecodeError(format!("failed to decode FeesCollected: {e}")))?;
    let event = decoded.inner.data;

    Ok(RawFeeLog {
        block_number: BlockNumber::new(block_number),
        block_hash: block_hash.to_string(),
        transaction_hash: transaction_hash.to_string(),
        log_index: u32::try_from(log_index).unwrap_or(u32::MAX),
        token: EthAddress::new(*event.token.0),
        integrator: EthAddress::new(*event.integrator.0),
        integrator_fee: FeeAmount::try_from(event.integratorFee)
            .map_err(|e| DecodeError(format!("invalid integratorFee: {e}")))?,
        lifi_fee: FeeAmount::try_from(event.lifiFee)
            .map_err(|e| DecodeError(format!("invalid lifiFee: {e}")))?,
    })
}
