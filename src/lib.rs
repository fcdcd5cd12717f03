//! Multi-chain EVM event indexer for LI.FI `FeesCollected` logs.
//!
//! For each configured chain, a worker continuously discovers
//! `FeesCollected(address indexed token, address indexed integrator,
//! uint256 integratorFee, uint256 lifiFee)` events emitted by that chain's
//! fee-collector contract, deduplicates them by natural key
//! `(chainId, transactionHash, logIndex)`, and persists them for an
//! external API layer to query. Chains are managed at runtime through a
//! control plane; each chain's worker survives restarts via a persisted
//! cursor.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         INDEXER CORE                            │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐          │
//! │  │    Block     │  │    Event     │  │   Control    │          │
//! │  │   Planner    │─▶│  Processor   │  │    Plane     │          │
//! │  └──────────────┘  └──────┬───────┘  └──────┬───────┘          │
//! │                           │                  │                  │
//! │              ┌────────────┼──────────────────┘                  │
//! │              ▼            ▼                                     │
//! │       ┌──────────────┐ ┌──────────────┐   ┌──────────────────┐ │
//! │       │ChainRegistry │ │  EventStore  │   │ ChainClientPool  │ │
//! │       └──────────────┘ └──────────────┘   └──────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`types`] - Domain types (entities, enums, primitives)
//! - [`error`] - Layered error types
//! - [`config`] - Configuration loading and validation
//! - [`abi`] - ABI bindings for the fee-collector contract
//! - [`ports`] - Trait boundaries the domain depends on
//! - [`chain`] - Chain Client Pool (RPC access)
//! - [`indexer`] - Block-Range Planner, Event Processor, Worker Supervisor
//! - [`control`] - Control Plane (runtime chain management)
//! - [`store`] - `PostgreSQL` persistence
//!
//! # Getting Started
//!
//! ```bash
//! # Set up environment
//! cp .env.example .env
//! # Edit .env with your configuration
//!
//! # Run migrations
//! cargo run -- migrate
//!
//! # Start the indexer
//! cargo run -- run
//! ```

#![doc(html_root_url = "https://docs.li.fi/fee-indexer")]

pub mod abi;
pub mod chain;
pub mod config;
pub mod control;
pub mod error;
pub mod indexer;
pub mod ports;
pub mod store;
pub mod types;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the library version string
#[must_use]
pub const fn version() -> &'static str {
    VERSION
}
