//! Chain Client Pool: one `AlloyChainClient` per configured chain.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, instrument};

use crate::chain::provider::AlloyChainClient;
use crate::error::Result;
use crate::ports::{ChainClient, ChainClientPool};
use crate::types::entities::ChainConfig;
use crate::types::primitives::ChainId;

/// `ChainClientPool` implementation backed by a `DashMap`.
///
/// Lookup via [`get`](ChainClientPool::get) is a lock-free read on the
/// common (per-tick) path. Replacing a chain's client (`ensure` called
/// again with a changed `rpc_url`/`contract_address`) establishes the new
/// client first and only swaps it in on success, so an in-flight worker
/// tick never observes a half-initialized entry.
#[derive(Debug, Default)]
pub struct AlloyChainClientPool {
    clients: DashMap<ChainId, Arc<AlloyChainClient>>,
    probe_timeout: Duration,
    retry_delay: Duration,
}

impl AlloyChainClientPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new(probe_timeout: Duration, retry_delay: Duration) -> Self {
        Self {
            clients: DashMap::new(),
            probe_timeout,
            retry_delay,
        }
    }
}

#[async_trait]
impl ChainClientPool for AlloyChainClientPool {
    #[instrument(skip(self, config), fields(chain_id = config.chain_id.get()))]
    async fn ensure(&self, config: &ChainConfig) -> Result<()> {
        let client = AlloyChainClient::connect(config, self.retry_delay).await?;
        self.clients.insert(config.chain_id, Arc::new(client));
        debug!(chain_id = config.chain_id.get(), "chain client installed");
        Ok(())
    }

    fn drop_chain(&self, chain_id: ChainId) {
        self.clients.remove(&chain_id);
    }

    fn get(&self, chain_id: ChainId) -> Option<Arc<dyn ChainClient>> {
        self.clients
            .get(&chain_id)
            .map(|entry| Arc::clone(entry.value()) as Arc<dyn ChainClient>)
    }

    async fn probe_url(&self, rpc_url: &str) -> Result<()> {
        AlloyChainClient::probe_rpc_url(rpc_url, self.probe_timeout).await
    }
}
