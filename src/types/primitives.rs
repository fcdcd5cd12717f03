//! Validated primitive types for domain entities.
//!
//! These newtypes provide:
//! - Type safety (can't accidentally pass a fee amount as a chain id)
//! - Validation at construction time
//! - Domain semantics in function signatures

use std::fmt;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

// ═══════════════════════════════════════════════════════════════════════════════
// ETHEREUM ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// Validated 20-byte Ethereum address.
///
/// This newtype ensures addresses are always exactly 20 bytes and normalizes
/// to lowercase hex. Use `Address` from `alloy-primitives` for on-chain
/// interaction, but this type for persistence and domain logic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EthAddress([u8; 20]);

impl EthAddress {
    /// Create from a fixed-size array (infallible).
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Try to create from a byte slice.
    ///
    /// # Errors
    /// Returns `InvalidAddress::WrongLength` if the slice is not exactly 20 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self, InvalidAddress> {
        let bytes: [u8; 20] = slice
            .try_into()
            .map_err(|_| InvalidAddress::WrongLength(slice.len()))?;
        Ok(Self(bytes))
    }

    /// Parse from hex string (with or without 0x prefix).
    ///
    /// # Errors
    /// Returns `InvalidAddress` if the string is not valid hex or wrong length.
    pub fn from_hex(s: &str) -> Result<Self, InvalidAddress> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.len() != 40 {
            return Err(InvalidAddress::WrongLength(s.len() / 2));
        }
        let bytes = hex::decode(s).map_err(|_| InvalidAddress::InvalidHex)?;
        Self::from_slice(&bytes)
    }

    /// Get the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Convert to lowercase hex string with 0x prefix.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Check if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// The zero address (0x0000...0000).
    pub const ZERO: Self = Self([0u8; 20]);
}

impl fmt::Debug for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthAddress({})", self.to_hex())
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<EthAddress> for String {
    fn from(addr: EthAddress) -> Self {
        addr.to_hex()
    }
}

impl TryFrom<String> for EthAddress {
    type Error = InvalidAddress;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl TryFrom<&str> for EthAddress {
    type Error = InvalidAddress;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::from_hex(s)
    }
}

impl From<[u8; 20]> for EthAddress {
    fn from(bytes: [u8; 20]) -> Self {
        Self::new(bytes)
    }
}

impl From<Address> for EthAddress {
    fn from(addr: Address) -> Self {
        Self::new(addr.0.0)
    }
}

impl From<EthAddress> for Address {
    fn from(addr: EthAddress) -> Self {
        Self::from(addr.0)
    }
}

/// Error for invalid Ethereum addresses.
#[derive(Debug, Clone, Error)]
pub enum InvalidAddress {
    /// Address has wrong byte length.
    #[error("wrong length: expected 20 bytes, got {0}")]
    WrongLength(usize),
    /// Address contains invalid hex characters.
    #[error("invalid hex encoding")]
    InvalidHex,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHAIN ID
// ═══════════════════════════════════════════════════════════════════════════════

/// Validated chain identifier (EIP-155 chain id). Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ChainId(u64);

impl ChainId {
    /// Create a new chain id.
    ///
    /// # Errors
    /// Returns `InvalidChainId::Zero` if the value is zero.
    pub const fn new(value: u64) -> Result<Self, InvalidChainId> {
        if value == 0 {
            return Err(InvalidChainId::Zero);
        }
        Ok(Self(value))
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl TryFrom<u64> for ChainId {
    type Error = InvalidChainId;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error for invalid chain ids.
#[derive(Debug, Clone, Copy, Error)]
pub enum InvalidChainId {
    /// Chain id must be a positive integer.
    #[error("chain id must be greater than zero")]
    Zero,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RPC URL
// ═══════════════════════════════════════════════════════════════════════════════

/// Validated absolute RPC endpoint URL.
///
/// Stored as `String` in entities (for straightforward serde/sqlx binding);
/// parsed through this type whenever the value needs validating, e.g. before
/// it is accepted by the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcUrl(String);

impl RpcUrl {
    /// Parse and validate an RPC URL.
    ///
    /// # Errors
    /// Returns `InvalidRpcUrl` if the string is not an absolute http(s) URL.
    pub fn parse(s: &str) -> Result<Self, InvalidRpcUrl> {
        let url = Url::parse(s).map_err(|_| InvalidRpcUrl::Malformed)?;
        match url.scheme() {
            "http" | "https" => Ok(Self(s.to_string())),
            other => Err(InvalidRpcUrl::UnsupportedScheme(other.to_string())),
        }
    }

    /// Borrow the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RpcUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error for invalid RPC URLs.
#[derive(Debug, Clone, Error)]
pub enum InvalidRpcUrl {
    /// URL could not be parsed at all.
    #[error("malformed URL")]
    Malformed,
    /// URL scheme is not http or https.
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// FEE AMOUNT (validated decimal string, no arithmetic)
// ═══════════════════════════════════════════════════════════════════════════════

/// A fee amount as it arrives on-chain: a non-negative base-10 integer string.
///
/// Deliberately not an arithmetic type. The indexer never computes over fee
/// amounts, it only carries them from a decoded log to storage, so this type
/// validates shape (ASCII digits, no sign, no leading zero unless the value
/// is exactly `"0"`) and nothing else. Conversion to `BigDecimal` happens only
/// at the SQL storage boundary, in the store adapter.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeeAmount(String);

impl FeeAmount {
    /// Parse a decimal integer string.
    ///
    /// # Errors
    /// Returns `InvalidAmount` if the string is empty, contains non-digit
    /// characters, or has a non-canonical leading zero.
    pub fn parse(s: &str) -> Result<Self, InvalidAmount> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidAmount::NotDecimalDigits);
        }
        if s.len() > 1 && s.starts_with('0') {
            return Err(InvalidAmount::LeadingZero);
        }
        Ok(Self(s.to_string()))
    }

    /// Zero amount.
    #[must_use]
    pub fn zero() -> Self {
        Self("0".to_string())
    }

    /// Borrow the underlying digit string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to `sqlx::types::BigDecimal` for database storage.
    ///
    /// Infallible: every `FeeAmount` is a validated decimal digit string.
    #[must_use]
    pub fn to_bigdecimal(&self) -> sqlx::types::BigDecimal {
        self.0.parse().unwrap_or_default()
    }

    /// Build from a `sqlx::types::BigDecimal` read back from storage.
    ///
    /// # Errors
    /// Returns `InvalidAmount` if the stored value is not a non-negative
    /// integer (it never should be, since only `FeeAmount` values are
    /// written, but the boundary is still validated on the way back in).
    pub fn from_bigdecimal(value: &sqlx::types::BigDecimal) -> Result<Self, InvalidAmount> {
        Self::parse(&value.to_string())
    }
}

impl fmt::Debug for FeeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeeAmount({})", self.0)
    }
}

impl fmt::Display for FeeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<FeeAmount> for String {
    fn from(amount: FeeAmount) -> Self {
        amount.0
    }
}

impl TryFrom<String> for FeeAmount {
    type Error = InvalidAmount;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl TryFrom<alloy::primitives::U256> for FeeAmount {
    type Error = InvalidAmount;

    fn try_from(value: alloy::primitives::U256) -> Result<Self, Self::Error> {
        Self::parse(&value.to_string())
    }
}

/// Error for invalid fee amounts.
#[derive(Debug, Clone, Error)]
pub enum InvalidAmount {
    /// String contains characters other than ASCII digits.
    #[error("amount must be a non-negative decimal integer")]
    NotDecimalDigits,
    /// String has a non-canonical leading zero, e.g. "007".
    #[error("amount has a non-canonical leading zero")]
    LeadingZero,
}

// ═══════════════════════════════════════════════════════════════════════════════
// BLOCK NUMBER (for type clarity)
// ═══════════════════════════════════════════════════════════════════════════════

/// Block number newtype for clarity in function signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockNumber(u64);

impl BlockNumber {
    /// Create a new block number.
    #[must_use]
    pub const fn new(n: u64) -> Self {
        Self(n)
    }

    /// Get the value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Returns the next block number (saturating at `u64::MAX`).
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns the previous block number (saturating at 0).
    #[must_use]
    pub const fn prev(&self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl From<u64> for BlockNumber {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

impl From<BlockNumber> for u64 {
    fn from(b: BlockNumber) -> Self {
        b.0
    }
}

impl From<BlockNumber> for i64 {
    #[allow(clippy::cast_possible_wrap)]
    fn from(b: BlockNumber) -> Self {
        b.0 as Self
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
