// crates/context-trust-core/src/core/dispute.rs
// ============================================================================
// Module: Dispute Records
// Description: Filed disputes with reasons, verdicts, and schema evidence.
// Purpose: Model the append-mostly dispute facts of the trust ledger.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ToolReport`] captures one filed dispute. The verdict and status are
//! set synchronously at creation by the adjudicator and never revised by
//! this engine; `manual_review` and `pending` verdicts are handled by an
//! external review process.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::QueryId;
use crate::core::identifiers::ReportId;
use crate::core::identifiers::ToolId;
use crate::core::identifiers::TransactionHash;
use crate::core::identifiers::UserId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Reason cited for a dispute.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
/// - Only [`DisputeReason::SchemaMismatch`] has a checkable ground truth;
///   all other reasons route to manual review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeReason {
    /// Output violated the declared JSON Schema.
    SchemaMismatch,
    /// Tool failed to execute after payment.
    ExecutionError,
    /// Output contained malicious content.
    MaliciousContent,
    /// Output fabricated data.
    DataFabrication,
}

impl DisputeReason {
    /// Returns the stable wire label of the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SchemaMismatch => "schema_mismatch",
            Self::ExecutionError => "execution_error",
            Self::MaliciousContent => "malicious_content",
            Self::DataFabrication => "data_fabrication",
        }
    }

    /// Returns whether the reason can be adjudicated mechanically.
    #[must_use]
    pub const fn is_auto_adjudicable(self) -> bool {
        matches!(self, Self::SchemaMismatch)
    }
}

/// Verdict rendered for a dispute.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
/// - Terminal for this engine; manual review happens externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Not yet adjudicated.
    Pending,
    /// Output satisfied the declared contract.
    Innocent,
    /// Output violated the declared contract.
    Guilty,
    /// No mechanical ground truth; routed to human review.
    ManualReview,
}

impl Verdict {
    /// Returns the stable wire label of the verdict.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Innocent => "innocent",
            Self::Guilty => "guilty",
            Self::ManualReview => "manual_review",
        }
    }
}

/// Processing status of a dispute.
///
/// # Invariants
/// - `Resolved` is set at creation iff the verdict is guilty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    /// Awaiting external handling.
    Pending,
    /// Closed by automatic adjudication.
    Resolved,
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// One structured schema-validation error recorded for transparency.
///
/// # Invariants
/// - `path` is a JSON pointer into the disputed output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaViolation {
    /// JSON pointer to the violating location in the output.
    pub path: String,
    /// Human-readable validation message.
    pub message: String,
}

/// One filed dispute against a tool.
///
/// # Invariants
/// - At most one report exists per transaction hash.
/// - Verdict and status are set at creation and never revised here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolReport {
    /// Report identifier.
    pub report_id: ReportId,
    /// Disputed tool.
    pub tool_id: ToolId,
    /// Reporting user.
    pub reporter_id: UserId,
    /// Transaction hash cited as the fraud proof.
    pub transaction_hash: TransactionHash,
    /// Invocation record the proof matched.
    pub query_id: QueryId,
    /// Cited dispute reason.
    pub reason: DisputeReason,
    /// Free-text details supplied by the disputant.
    pub details: Option<String>,
    /// Rendered verdict.
    pub verdict: Verdict,
    /// Short adjudication note explaining the verdict.
    pub adjudication_note: String,
    /// Structured schema-validation errors, when applicable.
    pub schema_errors: Vec<SchemaViolation>,
    /// Processing status.
    pub status: DisputeStatus,
    /// Filing timestamp.
    pub created_at: Timestamp,
}
