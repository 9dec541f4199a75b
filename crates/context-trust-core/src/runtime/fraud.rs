// crates/context-trust-core/src/runtime/fraud.rs
// ============================================================================
// Module: Fraud-Proof Validation
// Description: Payment verification gating every dispute filing.
// Purpose: Guarantee no dispute exists without a matching paid invocation.
// Dependencies: crate::core, crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! Fraud-proof validation is the sole replay and spam defense of the dispute
//! system. A dispute is accepted only when its cited transaction hash
//! matches a recorded invocation of the disputed tool, the invocation is
//! within the dispute window, and no prior dispute references the same hash.
//! The proof is deliberately expensive to forge because the hash must
//! correspond to a real funds transfer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::ToolId;
use crate::core::identifiers::TransactionHash;
use crate::core::query::ToolQuery;
use crate::core::time::Clock;
use crate::interfaces::StoreError;
use crate::interfaces::ToolStore;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Dispute window measured from the invocation timestamp.
pub const DISPUTE_WINDOW_MS: i64 = 7 * 24 * 60 * 60 * 1000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fraud-proof rejection reasons.
///
/// # Invariants
/// - Variants are user-facing and must not be conflated: a duplicate proof
///   is never reported as "not found".
#[derive(Debug, Error)]
pub enum FraudProofError {
    /// No invocation was paid for by the cited transaction hash.
    #[error("no paid invocation found for this transaction hash")]
    NotFound,
    /// The cited invocation belongs to a different tool.
    #[error("transaction hash belongs to a different tool")]
    Mismatch,
    /// The invocation is older than the dispute window.
    #[error("dispute window of 7 days has expired")]
    WindowExpired,
    /// A dispute already references the cited transaction hash.
    #[error("a dispute already exists for this transaction hash")]
    Duplicate,
    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a fraud proof and returns the matched invocation record.
///
/// Checks run in order: existence, tool match, dispute window, duplicate.
/// On success the caller may create exactly one dispute against the proof.
///
/// # Errors
///
/// Returns [`FraudProofError`] when the proof is rejected or the store
/// fails.
pub fn validate_fraud_proof(
    store: &dyn ToolStore,
    clock: &dyn Clock,
    tool_id: &ToolId,
    hash: &TransactionHash,
) -> Result<ToolQuery, FraudProofError> {
    let query =
        store.find_query_by_transaction_hash(hash)?.ok_or(FraudProofError::NotFound)?;
    if query.tool_id != *tool_id {
        return Err(FraudProofError::Mismatch);
    }
    if clock.now().millis_since(query.executed_at) > DISPUTE_WINDOW_MS {
        return Err(FraudProofError::WindowExpired);
    }
    if store.report_exists_for_transaction(hash)? {
        return Err(FraudProofError::Duplicate);
    }
    Ok(query)
}
