//! Layered error types for the fee indexer.
//!
//! This module provides a hierarchical error system:
//!
//! - [`DomainError`] - Business logic errors (validation, not found, conflict)
//! - [`InfraError`] - Infrastructure errors (database, RPC, serialization)
//! - [`AppError`] - Application-level error, the `Result` alias used throughout
//! - [`ErrorKind`] - The discriminant the control plane exposes to its caller
//!
//! # Error Philosophy
//!
//! - Domain errors are recoverable and caller-facing
//! - Infrastructure errors are logged; only their `ErrorKind` crosses the
//!   control-plane boundary, never the error's internal detail
//! - The `Result` type alias uses `AppError` for application code

use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// DOMAIN ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Domain-level errors representing business logic violations.
///
/// These errors are recoverable and should be shown to the control-plane
/// caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DomainError {
    /// A `ChainConfig` field failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// No chain exists with the given id.
    #[error("chain not found: {0}")]
    ChainNotFound(u64),

    /// A chain with this id already exists.
    #[error("chain already exists: {0}")]
    ChainAlreadyExists(u64),

    /// The requested operation conflicts with the chain's current worker state.
    #[error("conflicting worker state: {0}")]
    Conflict(String),

    /// Invalid address format.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid fee amount (not a non-negative decimal integer).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid chain id (must be positive).
    #[error("invalid chain id: {0}")]
    InvalidChainId(String),

    /// Invalid RPC URL.
    #[error("invalid RPC url: {0}")]
    InvalidRpcUrl(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// INFRASTRUCTURE ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Infrastructure-level errors from external systems.
///
/// These errors are typically logged in full but their details are hidden
/// from the control-plane caller beyond their `ErrorKind`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InfraError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// RPC error (chain node communication) after retries were exhausted.
    #[error("RPC unavailable: {0}")]
    Rpc(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A fetched log could not be decoded as `FeesCollected`.
    #[error("event decoding error: {0}")]
    Decode(String),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Resource not found in storage.
    #[error("resource not found")]
    NotFound,

    /// Timeout waiting for an RPC or store operation.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

// ═══════════════════════════════════════════════════════════════════════════════
// APPLICATION ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Application-level error combining domain and infrastructure errors.
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    /// Domain logic error.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Infrastructure error.
    #[error(transparent)]
    Infra(#[from] InfraError),

    /// The control plane's reachability probe failed for a proposed `rpcUrl`.
    #[error("RPC endpoint unreachable: {0}")]
    RpcUnavailable(String),

    /// Initialization error (e.g. bad configuration at startup).
    #[error("initialization error: {0}")]
    Initialization(String),
}

/// Type alias for application Results.
pub type Result<T> = std::result::Result<T, AppError>;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR KIND (control-plane boundary discriminant)
// ═══════════════════════════════════════════════════════════════════════════════

/// The discriminant the control plane reports to its caller, independent of
/// any particular transport (HTTP, CLI, ...).
///
/// `spec.md` §6 names the mapping this type implements: validation failures
/// are client errors, missing/duplicate chains are 404/409-shaped, a failed
/// RPC probe is reported the same as a validation failure (it blocks the
/// mutation but is not a server fault), and everything else is internal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself was invalid.
    Validation,
    /// The referenced chain does not exist.
    NotFound,
    /// The request conflicts with existing state.
    Conflict,
    /// The probe gate rejected a proposed RPC endpoint.
    RpcUnavailable,
    /// An internal/infrastructure failure occurred.
    Internal,
}

impl AppError {
    /// Classify this error for the control-plane boundary.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(DomainError::Validation(_))
            | Self::Domain(DomainError::InvalidAddress(_))
            | Self::Domain(DomainError::InvalidAmount(_))
            | Self::Domain(DomainError::InvalidChainId(_))
            | Self::Domain(DomainError::InvalidRpcUrl(_)) => ErrorKind::Validation,
            Self::Domain(DomainError::ChainNotFound(_)) => ErrorKind::NotFound,
            Self::Domain(DomainError::ChainAlreadyExists(_) | DomainError::Conflict(_)) => {
                ErrorKind::Conflict
            }
            Self::RpcUnavailable(_) => ErrorKind::RpcUnavailable,
            Self::Infra(_) | Self::Initialization(_) => ErrorKind::Internal,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONVENIENCE CONVERSIONS
// ═══════════════════════════════════════════════════════════════════════════════

impl From<crate::types::primitives::InvalidAddress> for DomainError {
    fn from(err: crate::types::primitives::InvalidAddress) -> Self {
        Self::InvalidAddress(err.to_string())
    }
}

impl From<crate::types::primitives::InvalidAmount> for DomainError {
    fn from(err: crate::types::primitives::InvalidAmount) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}

impl From<crate::types::primitives::InvalidChainId> for DomainError {
    fn from(err: crate::types::primitives::InvalidChainId) -> Self {
        Self::InvalidChainId(err.to_string())
    }
}

impl From<crate::types::primitives::InvalidRpcUrl> for DomainError {
    fn from(err: crate::types::primitives::InvalidRpcUrl) -> Self {
        Self::InvalidRpcUrl(err.to_string())
    }
}

impl From<crate::types::primitives::InvalidAddress> for AppError {
    fn from(err: crate::types::primitives::InvalidAddress) -> Self {
        Self::Domain(err.into())
    }
}

impl From<crate::types::primitives::InvalidAmount> for AppError {
    fn from(err: crate::types::primitives::InvalidAmount) -> Self {
        Self::Domain(err.into())
    }
}

impl From<crate::types::primitives::InvalidChainId> for AppError {
    fn from(err: crate::types::primitives::InvalidChainId) -> Self {
        Self::Domain(err.into())
    }
}

impl From<crate::types::primitives::InvalidRpcUrl> for AppError {
    fn from(err: crate::types::primitives::InvalidRpcUrl) -> Self {
        Self::Domain(err.into())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_display() {
        let err = DomainError::ChainNotFound(5);
        assert!(err.to_string().contains('5'));
    }

    #[test]
    fn app_error_from_domain() {
        let domain = DomainError::ChainNotFound(5);
        let app: AppError = domain.into();
        assert!(matches!(app, AppError::Domain(DomainError::ChainNotFound(5))));
    }

    #[test]
    fn app_error_from_infra() {
        let infra = InfraError::NotFound;
        let app: AppError = infra.into();
        assert!(matches!(app, AppError::Infra(InfraError::NotFound)));
    }

    #[test]
    fn kind_mapping_validation() {
        let err = AppError::Domain(DomainError::Validation("bad".into()));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn kind_mapping_not_found() {
        let err = AppError::Domain(DomainError::ChainNotFound(1));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn kind_mapping_conflict() {
        let err = AppError::Domain(DomainError::ChainAlreadyExists(1));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn kind_mapping_rpc_unavailable() {
        let err = AppError::RpcUnavailable("timeout".into());
        assert_eq!(err.kind(), ErrorKind::RpcUnavailable);
    }

    #[test]
    fn kind_mapping_internal() {
        let err = AppError::Infra(InfraError::NotFound);
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
