//! Core indexing logic: planning scan windows, processing them into
//! persisted events, and supervising one worker per chain.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Worker Supervisor                          │
//! │                                                                 │
//! │   per chain: ┌──────────────┐    ┌──────────────────┐           │
//! │              │   Planner    │───▶│  Event Processor  │           │
//! │              │ (pure fn)    │    │ (fetch, enrich,    │           │
//! │              └──────────────┘    │  dedup, persist)   │           │
//! │                                   └──────────────────┘           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use fee_indexer::indexer::WorkerSupervisor;
//!
//! let supervisor = WorkerSupervisor::new(
//!     registry, event_store, chain_pool, clock, tuning, graceful_shutdown,
//! );
//! supervisor.start_worker(chain_id).await?;
//! ```

pub mod planner;
pub mod processor;
mod supervisor;

pub use planner::{ScanWindow, plan_next_window};
pub use processor::{ProcessedWindow, ProcessorTuning, process_window};
pub use supervisor::WorkerSupervisor;
