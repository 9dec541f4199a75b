// crates/context-trust-core/src/core/identifiers.rs
// ============================================================================
// Module: Trust Engine Identifiers
// Description: Canonical identifiers for tools, users, queries, and proofs.
// Purpose: Provide strongly typed identifiers with stable wire forms.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! This module defines the identifiers used throughout the trust engine.
//! Most identifiers are opaque strings minted by the marketplace layer.
//! [`TransactionHash`] is the exception: it is a validated fraud proof and
//! enforces its `0x` + 64 hex wire form at construction boundaries, so a
//! sentinel value recorded for a free-tier call can never reach the dispute
//! path as a proof of payment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Opaque Identifiers
// ============================================================================

/// Tool listing identifier.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolId(String);

impl ToolId {
    /// Creates a new tool identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ToolId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ToolId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Marketplace user identifier.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new user identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Invocation record identifier.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryId(String);

impl QueryId {
    /// Creates a new query identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Dispute record identifier.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    /// Creates a new report identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Transaction Hash
// ============================================================================

/// Length of the hex payload of a transaction hash (32 bytes).
const TRANSACTION_HASH_HEX_LEN: usize = 64;

/// Errors raised when parsing a transaction hash.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionHashError {
    /// The value does not start with the `0x` prefix.
    #[error("transaction hash must start with 0x")]
    MissingPrefix,
    /// The hex payload has the wrong length.
    #[error("transaction hash must be 0x followed by {TRANSACTION_HASH_HEX_LEN} hex characters")]
    BadLength,
    /// The payload contains non-hex characters.
    #[error("transaction hash contains non-hex characters")]
    BadCharacters,
}

/// On-chain transaction hash cited as a fraud proof.
///
/// # Invariants
/// - Always `0x` followed by exactly 64 lowercase hex characters.
/// - Construction goes through [`TransactionHash::parse`]; deserialization
///   applies the same validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionHash(String);

impl TransactionHash {
    /// Parses and normalizes a transaction hash.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionHashError`] when the value is not `0x` + 64 hex
    /// characters.
    pub fn parse(raw: &str) -> Result<Self, TransactionHashError> {
        let payload = raw.strip_prefix("0x").ok_or(TransactionHashError::MissingPrefix)?;
        if payload.len() != TRANSACTION_HASH_HEX_LEN {
            return Err(TransactionHashError::BadLength);
        }
        if !payload.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TransactionHashError::BadCharacters);
        }
        Ok(Self(format!("0x{}", payload.to_ascii_lowercase())))
    }

    /// Returns the normalized hash as a string slice (including the prefix).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the hex payload without the `0x` prefix.
    #[must_use]
    pub fn hex_payload(&self) -> &str {
        &self.0[2..]
    }
}

impl fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for TransactionHash {
    type Error = TransactionHashError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TransactionHash> for String {
    fn from(value: TransactionHash) -> Self {
        value.0
    }
}

// ============================================================================
// SECTION: Payment Proof
// ============================================================================

/// Wire form recorded for free-tier and API-gated invocations.
const FREE_TIER_SENTINEL: &str = "free_tier";

/// Payment evidence attached to an invocation record.
///
/// # Invariants
/// - `Onchain` carries a validated [`TransactionHash`].
/// - `FreeTier` is the sentinel recorded for unpaid calls and is never a
///   valid fraud proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PaymentProof {
    /// A real funds transfer referenced by its transaction hash.
    Onchain(TransactionHash),
    /// Free-tier or API-key-gated invocation with no on-chain payment.
    FreeTier,
}

impl PaymentProof {
    /// Returns the wire representation of the proof.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Onchain(hash) => hash.as_str(),
            Self::FreeTier => FREE_TIER_SENTINEL,
        }
    }

    /// Returns the transaction hash when the invocation was paid on-chain.
    #[must_use]
    pub const fn transaction_hash(&self) -> Option<&TransactionHash> {
        match self {
            Self::Onchain(hash) => Some(hash),
            Self::FreeTier => None,
        }
    }
}

impl TryFrom<String> for PaymentProof {
    type Error = TransactionHashError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == FREE_TIER_SENTINEL {
            return Ok(Self::FreeTier);
        }
        TransactionHash::parse(&value).map(Self::Onchain)
    }
}

impl From<PaymentProof> for String {
    fn from(value: PaymentProof) -> Self {
        value.as_str().to_string()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
