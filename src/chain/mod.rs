//! Chain Client Pool: RPC access and log decoding for each configured chain.
//!
//! This module provides the production implementations of the
//! [`crate::ports::ChainClient`] and [`crate::ports::ChainClientPool`]
//! ports, backed by `alloy`'s HTTP transport.

mod pool;
mod provider;

pub use pool::AlloyChainClientPool;
pub use provider::AlloyChainClient;
