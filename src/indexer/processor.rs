//! Event Processor: turns a planned block window into persisted,
//! deduplicated `FeeEvent`s.

use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::error::{InfraError, Result};
use crate::ports::{ChainClient, Clock, EventStore, RawFeeLog};
use crate::types::entities::FeeEvent;
use crate::types::primitives::{BlockNumber, ChainId};

/// Tuning for the timestamp-enrichment step (`spec.md` §4.3) and the
/// decode-error sanity threshold (`spec.md` §7).
#[derive(Debug, Clone, Copy)]
pub struct ProcessorTuning {
    /// Number of blocks to fetch timestamps for concurrently.
    pub timestamp_batch_size: usize,
    /// Pause between timestamp-fetch batches.
    pub timestamp_batch_delay: std::time::Duration,
    /// Share of per-log decode errors in a window (0.0-1.0) above which the
    /// tick aborts instead of proceeding with the logs that did decode.
    pub max_decode_error_ratio: f64,
}

/// Outcome of processing one scan window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessedWindow {
    /// Logs fetched from the chain in this window.
    pub fetched: usize,
    /// Logs that were new (not already in the event store).
    pub new_events: usize,
    /// Rows actually inserted (may be less than `new_events` under a race
    /// with another writer, though in this system there is only one).
    pub inserted: u64,
}

/// Fetches logs for a window, enriches them with block timestamps, filters
/// out already-seen events by natural key, and persists the rest.
///
/// # Errors
/// Returns an error if the chain client or event store fail. A timestamp
/// lookup failure for an individual block does not fail the whole window;
/// per `spec.md`'s Open Question resolution, the processor falls back to
/// "now" for that event instead.
///
/// A log that fails to decode is skipped with a warning rather than failing
/// the window, unless the share of decode errors in the window exceeds
/// `tuning.max_decode_error_ratio` (`spec.md` §7 `DecodeError` policy), in
/// which case the whole tick aborts with `InfraError::Decode`.
#[instrument(skip(chain_client, event_store, clock, tuning), fields(chain_id = chain_id.get(), from = from.get(), to = to.get()))]
pub async fn process_window(
    chain_id: ChainId,
    chain_client: &dyn ChainClient,
    event_store: &dyn EventStore,
    clock: &dyn Clock,
    tuning: &ProcessorTuning,
    from: BlockNumber,
    to: BlockNumber,
) -> Result<ProcessedWindow> {
    let outcomes = chain_client.query_logs(from, to).await?;
    let fetched = outcomes.len();

    if outcomes.is_empty() {
        return Ok(ProcessedWindow {
            fetched: 0,
            new_events: 0,
            inserted: 0,
        });
    }

    let mut raw_logs = Vec::with_capacity(outcomes.len());
    let mut decode_errors = 0usize;
    for outcome in outcomes {
        match outcome {
            Ok(log) => raw_logs.push(log),
            Err(err) => {
                decode_errors += 1;
                warn!(chain_id = chain_id.get(), %err, "log skipped: failed to decode");
            }
        }
    }

    if decode_errors > 0 {
        #[allow(clippy::cast_precision_loss)]
        let ratio = decode_errors as f64 / fetched as f64;
        if ratio > tuning.max_decode_error_ratio {
            return Err(InfraError::Decode(format!(
                "{decode_errors}/{fetched} logs in this window failed to decode, exceeding the {:.0}% sanity threshold",
                tuning.max_decode_error_ratio * 100.0
            ))
            .into());
        }
    }

    if raw_logs.is_empty() {
        return Ok(ProcessedWindow {
            fetched,
            new_events: 0,
            inserted: 0,
        });
    }

    let events = enrich_with_timestamps(chain_id, chain_client, clock, raw_logs, tuning).await;

    let keys: Vec<_> = events.iter().map(FeeEvent::natural_key).collect();
    let existing = event_store.find_existing_keys(&keys).await?;

    let fresh: Vec<FeeEvent> = events
        .into_iter()
        .filter(|event| !existing.contains(&event.natural_key()))
        .collect();
    let new_events = fresh.len();

    let inserted = if fresh.is_empty() {
        0
    } else {
        event_store.insert_many(&fresh).await?
    };

    debug!(fetched, new_events, inserted, "window processed");

    Ok(ProcessedWindow {
        fetched,
        new_events,
        inserted,
    })
}

/// Fetch each unique block's timestamp once, `timestamp_batch_size` blocks
/// at a time, with a pause between batches to stay polite to the RPC
/// endpoint, then fan each fetched timestamp back out to every log that
/// shares its block. A block whose timestamp lookup fails falls back to the
/// clock's current time rather than failing the whole batch.
async fn enrich_with_timestamps(
    chain_id: ChainId,
    chain_client: &dyn ChainClient,
    clock: &dyn Clock,
    raw_logs: Vec<RawFeeLog>,
    tuning: &ProcessorTuning,
) -> Vec<FeeEvent> {
    let now = clock.now();
    let batch_size = tuning.timestamp_batch_size.max(1);

    let mut unique_blocks = Vec::new();
    for log in &raw_logs {
        if !unique_blocks.contains(&log.block_number) {
            unique_blocks.push(log.block_number);
        }
    }

    let mut timestamps = HashMap::with_capacity(unique_blocks.len());
    for chunk in unique_blocks.chunks(batch_size) {
        let fetched = futures::future::join_all(
            chunk.iter().map(|&block| chain_client.block_timestamp(block)),
        )
        .await;

        for (&block, timestamp) in chunk.iter().zip(fetched) {
            let timestamp = timestamp.unwrap_or_else(|err| {
                warn!(
                    chain_id = chain_id.get(),
                    block = block.get(),
                    %err,
                    "block timestamp lookup failed, falling back to now"
                );
                now
            });
            timestamps.insert(block, timestamp);
        }

        if chunk.len() == batch_size {
            tokio::time::sleep(tuning.timestamp_batch_delay).await;
        }
    }

    raw_logs
        .into_iter()
        .map(|log| {
            let timestamp = timestamps.get(&log.block_number).copied().unwrap_or(now);
            FeeEvent {
                chain_id,
                block_number: log.block_number,
                block_hash: log.block_hash,
                transaction_hash: log.transaction_hash,
                log_index: log.log_index,
                token: log.token,
                integrator: log.integrator,
                integrator_fee: log.integrator_fee,
                lifi_fee: log.lifi_fee,
                timestamp,
                created_at: now,
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::error::AppError;
    use crate::ports::{EventFilter, EventKey, FakeClock, LogDecodeOutcome};
    use crate::types::primitives::{EthAddress, FeeAmount};

    struct MockChainClient {
        chain_id: ChainId,
        logs: Vec<RawFeeLog>,
        decode_failures: usize,
        timestamp: DateTime<Utc>,
        fail_timestamp_for_block: Option<BlockNumber>,
        timestamp_calls: Mutex<Vec<BlockNumber>>,
    }

    impl MockChainClient {
        fn new(logs: Vec<RawFeeLog>) -> Self {
            Self {
                chain_id: ChainId::new(1).unwrap(),
                logs,
                decode_failures: 0,
                timestamp: Utc::now(),
                fail_timestamp_for_block: None,
                timestamp_calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChainClient for MockChainClient {
        fn chain_id(&self) -> ChainId {
            self.chain_id
        }

        async fn latest_block(&self) -> Result<BlockNumber> {
            Ok(BlockNumber::new(0))
        }

        async fn query_logs(&self, _from: BlockNumber, _to: BlockNumber) -> Result<Vec<LogDecodeOutcome>> {
            let mut outcomes: Vec<LogDecodeOutcome> = self.logs.clone().into_iter().map(Ok).collect();
            for _ in 0..self.decode_failures {
                outcomes.push(Err(crate::ports::DecodeError("simulated decode failure".into())));
            }
            Ok(outcomes)
        }

        async fn block_timestamp(&self, block: BlockNumber) -> Result<DateTime<Utc>> {
            self.timestamp_calls.lock().unwrap().push(block);
            if Some(block) == self.fail_timestamp_for_block {
                return Err(AppError::RpcUnavailable("simulated failure".into()));
            }
            Ok(self.timestamp)
        }

        async fn probe(&self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockEventStore {
        existing: Mutex<HashSet<EventKey>>,
        inserted: Mutex<Vec<FeeEvent>>,
    }

    #[async_trait]
    impl EventStore for MockEventStore {
        async fn find_existing_keys(&self, keys: &[EventKey]) -> Result<HashSet<EventKey>> {
            let existing = self.existing.lock().unwrap();
            Ok(keys
                .iter()
                .filter(|k| existing.contains(k))
                .cloned()
                .collect())
        }

        async fn insert_many(&self, events: &[FeeEvent]) -> Result<u64> {
            let mut inserted = self.inserted.lock().unwrap();
            let mut existing = self.existing.lock().unwrap();
            for event in events {
                existing.insert(event.natural_key());
                inserted.push(event.clone());
            }
            Ok(events.len() as u64)
        }

        async fn count_by_filter(&self, _filter: &EventFilter) -> Result<u64> {
            Ok(self.inserted.lock().unwrap().len() as u64)
        }

        async fn find_by_filter(&self, _filter: &EventFilter) -> Result<Vec<FeeEvent>> {
            Ok(self.inserted.lock().unwrap().clone())
        }
    }

    fn sample_log(log_index: u32) -> RawFeeLog {
        RawFeeLog {
            block_number: BlockNumber::new(100),
            block_hash: "0xblock".into(),
            transaction_hash: "0xtx".into(),
            log_index,
            token: EthAddress::ZERO,
            integrator: EthAddress::ZERO,
            integrator_fee: FeeAmount::parse("100").unwrap(),
            lifi_fee: FeeAmount::parse("5").unwrap(),
        }
    }

    fn tuning() -> ProcessorTuning {
        ProcessorTuning {
            timestamp_batch_size: 5,
            timestamp_batch_delay: std::time::Duration::from_millis(0),
            max_decode_error_ratio: 0.5,
        }
    }

    #[tokio::test]
    async fn empty_window_is_a_noop() {
        let chain_id = ChainId::new(1).unwrap();
        let chain_client = MockChainClient::new(vec![]);
        let store = MockEventStore::default();
        let clock = FakeClock::new(Utc::now());

        let result = process_window(
            chain_id,
            &chain_client,
            &store,
            &clock,
            &tuning(),
            BlockNumber::new(100),
            BlockNumber::new(100),
        )
        .await
        .unwrap();

        assert_eq!(result, ProcessedWindow { fetched: 0, new_events: 0, inserted: 0 });
    }

    #[tokio::test]
    async fn new_logs_are_inserted() {
        let chain_id = ChainId::new(1).unwrap();
        let chain_client = MockChainClient::new(vec![sample_log(0), sample_log(1)]);
        let store = MockEventStore::default();
        let clock = FakeClock::new(Utc::now());

        let result = process_window(
            chain_id,
            &chain_client,
            &store,
            &clock,
            &tuning(),
            BlockNumber::new(100),
            BlockNumber::new(100),
        )
        .await
        .unwrap();

        assert_eq!(result.fetched, 2);
        assert_eq!(result.new_events, 2);
        assert_eq!(result.inserted, 2);
    }

    #[tokio::test]
    async fn already_seen_logs_are_skipped() {
        let chain_id = ChainId::new(1).unwrap();
        let chain_client = MockChainClient::new(vec![sample_log(0)]);
        let store = MockEventStore::default();
        store
            .existing
            .lock()
            .unwrap()
            .insert((chain_id, "0xtx".to_string(), 0));
        let clock = FakeClock::new(Utc::now());

        let result = process_window(
            chain_id,
            &chain_client,
            &store,
            &clock,
            &tuning(),
            BlockNumber::new(100),
            BlockNumber::new(100),
        )
        .await
        .unwrap();

        assert_eq!(result.fetched, 1);
        assert_eq!(result.new_events, 0);
        assert_eq!(result.inserted, 0);
    }

    #[tokio::test]
    async fn timestamp_failure_falls_back_to_now() {
        let chain_id = ChainId::new(1).unwrap();
        let fixed_now = Utc::now();
        let chain_client = MockChainClient {
            timestamp: fixed_now - chrono::Duration::days(1),
            fail_timestamp_for_block: Some(BlockNumber::new(100)),
            ..MockChainClient::new(vec![sample_log(0)])
        };
        let store = MockEventStore::default();
        let clock = FakeClock::new(fixed_now);

        process_window(
            chain_id,
            &chain_client,
            &store,
            &clock,
            &tuning(),
            BlockNumber::new(100),
            BlockNumber::new(100),
        )
        .await
        .unwrap();

        let inserted = store.inserted.lock().unwrap();
        assert_eq!(inserted[0].timestamp, fixed_now);
    }

    #[tokio::test]
    async fn timestamps_are_fetched_once_per_unique_block_not_per_log() {
        let chain_id = ChainId::new(1).unwrap();
        let mut log_a = sample_log(0);
        log_a.block_number = BlockNumber::new(100);
        let mut log_b = sample_log(1);
        log_b.block_number = BlockNumber::new(100);
        let mut log_c = sample_log(2);
        log_c.block_number = BlockNumber::new(101);

        let chain_client = MockChainClient::new(vec![log_a, log_b, log_c]);
        let store = MockEventStore::default();
        let clock = FakeClock::new(Utc::now());

        let result = process_window(
            chain_id,
            &chain_client,
            &store,
            &clock,
            &tuning(),
            BlockNumber::new(100),
            BlockNumber::new(101),
        )
        .await
        .unwrap();

        assert_eq!(result.fetched, 3);
        assert_eq!(result.inserted, 3);
        assert_eq!(chain_client.timestamp_calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn decode_errors_within_threshold_are_skipped_not_fatal() {
        let chain_id = ChainId::new(1).unwrap();
        let chain_client = MockChainClient {
            decode_failures: 1,
            ..MockChainClient::new(vec![sample_log(0), sample_log(1), sample_log(2)])
        };
        let store = MockEventStore::default();
        let clock = FakeClock::new(Utc::now());

        let result = process_window(
            chain_id,
            &chain_client,
            &store,
            &clock,
            &tuning(),
            BlockNumber::new(100),
            BlockNumber::new(100),
        )
        .await
        .unwrap();

        assert_eq!(result.fetched, 4);
        assert_eq!(result.new_events, 3);
        assert_eq!(result.inserted, 3);
    }

    #[tokio::test]
    async fn decode_errors_past_threshold_abort_the_tick() {
        let chain_id = ChainId::new(1).unwrap();
        let chain_client = MockChainClient {
            decode_failures: 3,
            ..MockChainClient::new(vec![sample_log(0)])
        };
        let store = MockEventStore::default();
        let clock = FakeClock::new(Utc::now());

        let result = process_window(
            chain_id,
            &chain_client,
            &store,
            &clock,
            &tuning(),
            BlockNumber::new(100),
            BlockNumber::new(100),
        )
        .await;

        assert!(result.is_err());
        assert!(store.inserted.lock().unwrap().is_empty());
    }
}
