// crates/context-trust-core/src/core/query.rs
// ============================================================================
// Module: Invocation Records
// Description: Immutable records of tool invocations and their payment proofs.
// Purpose: Serve as the sole source of truth a disputant can cite.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`ToolQuery`] is created once per invocation attempt, including failed
//! attempts, and never mutated afterwards. The recorded payment proof is the
//! only evidence the fraud-proof validator will accept when a dispute is
//! filed against the invocation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::PaymentProof;
use crate::core::identifiers::QueryId;
use crate::core::identifiers::ToolId;
use crate::core::identifiers::UserId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Execution outcome of an invocation.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// The tool returned a payload.
    Completed,
    /// The invocation failed; the record supports audit and abuse detection.
    Failed,
}

/// Immutable record of one tool invocation.
///
/// # Invariants
/// - Created exactly once per invocation attempt and never mutated.
/// - `payment` is the proof the disputant must cite; free-tier sentinels can
///   never anchor a dispute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolQuery {
    /// Invocation identifier.
    pub query_id: QueryId,
    /// Invoked tool.
    pub tool_id: ToolId,
    /// Invoking user.
    pub user_id: UserId,
    /// Payment proof (on-chain transaction hash, or the free-tier sentinel).
    pub payment: PaymentProof,
    /// Raw output payload recorded at invocation time.
    pub output: Value,
    /// Execution outcome.
    pub status: QueryStatus,
    /// Invocation timestamp.
    pub executed_at: Timestamp,
}
