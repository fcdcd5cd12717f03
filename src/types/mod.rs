//! Domain types for the fee indexer.
//!
//! This module contains all the core types used throughout the indexer:
//!
//! - [`enums`] - Worker lifecycle enumeration (`WorkerStatus`)
//! - [`primitives`] - Validated newtypes (`ChainId`, `EthAddress`, `FeeAmount`, `RpcUrl`, `BlockNumber`)
//! - [`entities`] - Domain entities for database persistence (`ChainConfig`, `ScanCursor`, `FeeEvent`)

pub mod entities;
pub mod enums;
pub mod primitives;

// Re-export commonly used types at module level
pub use entities::{ChainConfig, FeeEvent, ScanCursor};
pub use enums::WorkerStatus;
pub use primitives::{BlockNumber, ChainId, EthAddress, FeeAmount, RpcUrl};
