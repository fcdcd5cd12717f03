//! Data persistence layer (adapters for store ports).
//!
//! This module provides the concrete implementation of the store ports
//! defined in [`crate::ports::store`], backed by `PostgreSQL`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Store Adapter                             │
//! │                                                                 │
//! │   ┌──────────────────────────────────────────────────────────┐  │
//! │   │                  PostgresStore                            │  │
//! │   │   ┌──────────────────┐        ┌──────────────────┐        │  │
//! │   │   │ chain_configs    │        │  scan_cursors     │        │  │
//! │   │   │ (ChainRegistry)  │        │  (ChainRegistry)  │        │  │
//! │   │   └──────────────────┘        └──────────────────┘        │  │
//! │   │   ┌──────────────────────────────────────────────────┐    │  │
//! │   │   │  fee_events (EventStore)                          │    │  │
//! │   │   └──────────────────────────────────────────────────┘    │  │
//! │   └──────────────────────────────────────────────────────────┘  │
//! │                               │                                  │
//! │                               ▼                                  │
//! │   ┌──────────────────────────────────────────────────────────┐  │
//! │   │              SQLx Connection Pool (PostgreSQL)             │  │
//! │   └──────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use fee_indexer::store::PostgresStore;
//! use sqlx::postgres::PgPoolOptions;
//!
//! let pool = PgPoolOptions::new()
//!     .max_connections(10)
//!     .connect("postgres://localhost/fee_indexer")
//!     .await?;
//!
//! sqlx::migrate!("./migrations").run(&pool).await?;
//!
//! let store = PostgresStore::new(pool);
//! ```
//!
//! # Migrations
//!
//! Migrations are located in `migrations/` and run via `sqlx migrate run`
//! or `PostgresStore::run_migrations`.

mod postgres;

pub use postgres::PostgresStore;

// Re-export commonly used types for convenience
pub use sqlx::postgres::PgPool;
