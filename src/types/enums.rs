//! Enumerations shared across domain entities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of a chain's worker, as observed by the control plane.
///
/// Transitions: `Starting -> Running -> (Error <-> Running) -> Stopped`.
/// See the Worker Supervisor state machine for the full transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    /// The worker task has been spawned but has not completed its first tick.
    Starting,
    /// The worker is ticking normally.
    Running,
    /// The worker's most recent tick failed; it will retry on the next tick.
    Error,
    /// The worker has been stopped and no ticks will run until `start` is called again.
    Stopped,
}

impl WorkerStatus {
    /// All variants, in the order they're typically presented.
    pub const ALL: [Self; 4] = [Self::Starting, Self::Running, Self::Error, Self::Stopped];

    /// True if a worker in this state is eligible for `start`.
    #[must_use]
    pub const fn is_startable(self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// True if a worker in this state is eligible for `stop`.
    #[must_use]
    pub const fn is_stoppable(self) -> bool {
        matches!(self, Self::Starting | Self::Running | Self::Error)
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Error => "error",
            Self::Stopped => "stopped",
        };
        write!(f, "{s}")
    }
}

impl FromStr for WorkerStatus {
    type Err = InvalidWorkerStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starting" => Ok(Self::Starting),
            "running" => Ok(Self::Running),
            "error" => Ok(Self::Error),
            "stopped" => Ok(Self::Stopped),
            other => Err(InvalidWorkerStatus(other.to_string())),
        }
    }
}

/// Error for an unrecognized worker status string (e.g. read back from storage).
#[derive(Debug, Clone, Error)]
#[error("invalid worker status: {0}")]
pub struct InvalidWorkerStatus(pub String);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_roundtrip() {
        for status in WorkerStatus::ALL {
            let s = status.to_string();
            assert_eq!(s.parse::<WorkerStatus>().unwrap(), status);
        }
    }

    #[test]
    fn startable_and_stoppable_are_disjoint_on_stopped() {
        assert!(WorkerStatus::Stopped.is_startable());
        assert!(!WorkerStatus::Stopped.is_stoppable());
    }

    #[test]
    fn running_is_stoppable_not_startable() {
        assert!(WorkerStatus::Running.is_stoppable());
        assert!(!WorkerStatus::Running.is_startable());
    }

    #[test]
    fn unknown_string_is_rejected() {
        assert!("paused".parse::<WorkerStatus>().is_err());
    }
}
