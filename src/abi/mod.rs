//! ABI bindings for the fee-collector contract, via `alloy::sol!`.
//!
//! # Usage
//!
//! Events are decoded from raw logs using the `SolEvent` trait:
//!
//! ```ignore
//! use alloy::sol_types::SolEvent;
//! use fee_indexer::abi::fee_collector::FeesCollected;
//!
//! let event = FeesCollected::decode_log(&log.inner, true)?;
//! println!("{} collected {} for {}", event.token, event.integratorFee, event.integrator);
//! ```

pub mod fee_collector;

pub use fee_collector::FeesCollected;
