//! Port definitions for dependency injection and testability.
//!
//! Ports are trait definitions that describe what the domain layer needs.
//! Following hexagonal architecture, adapters (in the infrastructure layer)
//! implement these traits to provide concrete functionality.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Domain Layer                            │
//! │                                                                 │
//! │  Uses ports (traits) to define what it needs                   │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐            │
//! │  │ChainRegistry│  │ EventStore  │  │ChainClient  │            │
//! │  │             │  │             │  │   Pool      │            │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘            │
//! │         │                │                │                    │
//! └─────────┼────────────────┼────────────────┼────────────────────┘
//!           │                │                │
//!           ▼                ▼                ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Infrastructure Layer                        │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐ │
//! │  │PostgresStore│  │PostgresStore│  │  DashMap<ChainId, ...>  │ │
//! │  │(implements  │  │(implements  │  │  (implements            │ │
//! │  │ChainRegistry)│  │ EventStore) │  │   ChainClientPool)      │ │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Port Categories
//!
//! | Category | Ports | Purpose |
//! |----------|-------|---------|
//! | Storage | [`ChainRegistry`], [`EventStore`] | Chain config/cursor and event persistence |
//! | Chain access | [`ChainClient`], [`ChainClientPool`] | RPC access and log decoding |
//! | Time | [`Clock`] | Testable time operations |
//!
//! # Usage
//!
//! ```ignore
//! use fee_indexer::ports::{ChainRegistry, Clock, SystemClock};
//!
//! // Application code depends on traits, not implementations
//! async fn load_chain<R: ChainRegistry, C: Clock>(
//!     registry: &R,
//!     clock: &C,
//!     chain_id: ChainId,
//! ) -> Result<()> {
//!     let config = registry.get_chain(chain_id).await?;
//!     let now = clock.now();
//!     // ...
//!     Ok(())
//! }
//!
//! // In production, use real implementations
//! let registry = PostgresStore::new(pool);
//! let clock = SystemClock;
//!
//! // In tests, use mocks
//! let registry = MockChainRegistry::new();
//! let clock = FakeClock::new(fixed_time);
//! ```

mod chain_client;
mod clock;
mod store;

// Re-export all port traits
pub use chain_client::{ChainClient, ChainClientPool, DecodeError, LogDecodeOutcome, RawFeeLog};
pub use clock::{Clock, SystemClock};
pub use store::{ChainRegistry, EventFilter, EventKey, EventStore};

// Re-export test utilities for tests and downstream crates using test-utils feature
#[cfg(any(test, feature = "test-utils"))]
pub use clock::FakeClock;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_ports_are_send_sync() {
        // Compile-time check that all port traits require Send + Sync
        fn assert_send_sync<T: Send + Sync>() {}

        fn check_chain_registry<T: ChainRegistry>() {
            assert_send_sync::<T>();
        }
        fn check_event_store<T: EventStore>() {
            assert_send_sync::<T>();
        }
        fn check_chain_client<T: ChainClient>() {
            assert_send_sync::<T>();
        }
        fn check_chain_client_pool<T: ChainClientPool>() {
            assert_send_sync::<T>();
        }
        fn check_clock<T: Clock>() {
            assert_send_sync::<T>();
        }
    }
}
