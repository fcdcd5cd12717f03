//! Block-Range Planner: pure function from cursor + chain head to the next
//! window of blocks to scan.

use crate::types::primitives::BlockNumber;

/// The outcome of planning the next scan window for a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanWindow {
    /// Scan `[from, to]` inclusive.
    Scan {
        /// Lower bound of the window, inclusive.
        from: BlockNumber,
        /// Upper bound of the window, inclusive.
        to: BlockNumber,
    },
    /// The cursor has caught up to the chain head; nothing to scan this tick.
    Idle,
}

/// Plan the next window to scan, given the chain's configured
/// `max_block_range`, the worker's persisted cursor, and the chain's
/// current head.
///
/// `from = cursor.next(); to = min(from + max_block_range - 1, latest)`.
/// Returns `ScanWindow::Idle` when `from > to` (cursor has caught up, or
/// overtaken, the chain head).
#[must_use]
pub fn plan_next_window(
    max_block_range: u64,
    last_processed_block: BlockNumber,
    latest: BlockNumber,
) -> ScanWindow {
    let from = last_processed_block.next();
    let span = max_block_range.saturating_sub(1);
    let to = BlockNumber::new(from.get().saturating_add(span)).min(latest);

    if from.get() > to.get() {
        ScanWindow::Idle
    } else {
        ScanWindow::Scan { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_up_to_max_range_when_head_is_far_ahead() {
        let window = plan_next_window(1_000, BlockNumber::new(99), BlockNumber::new(10_000));
        assert_eq!(
            window,
            ScanWindow::Scan {
                from: BlockNumber::new(100),
                to: BlockNumber::new(1_099),
            }
        );
    }

    #[test]
    fn clamps_to_chain_head_when_close() {
        let window = plan_next_window(1_000, BlockNumber::new(99), BlockNumber::new(150));
        assert_eq!(
            window,
            ScanWindow::Scan {
                from: BlockNumber::new(100),
                to: BlockNumber::new(150),
            }
        );
    }

    #[test]
    fn idle_when_cursor_caught_up_to_head() {
        let window = plan_next_window(1_000, BlockNumber::new(150), BlockNumber::new(150));
        assert_eq!(window, ScanWindow::Idle);
    }

    #[test]
    fn idle_when_cursor_ahead_of_head() {
        let window = plan_next_window(1_000, BlockNumber::new(200), BlockNumber::new(150));
        assert_eq!(window, ScanWindow::Idle);
    }

    #[test]
    fn single_block_window_when_range_is_one() {
        let window = plan_next_window(1, BlockNumber::new(99), BlockNumber::new(10_000));
        assert_eq!(
            window,
            ScanWindow::Scan {
                from: BlockNumber::new(100),
                to: BlockNumber::new(100),
            }
        );
    }
}
