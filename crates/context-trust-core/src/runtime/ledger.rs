// crates/context-trust-core/src/runtime/ledger.rs
// ============================================================================
// Module: Dispute Ledger
// Description: Dispute filing, verdict side effects, and redacted listing.
// Purpose: Apply verdicts, maintain flag counters, and trigger soft slashes.
// Dependencies: crate::core, crate::interfaces, crate::runtime, serde
// ============================================================================

//! ## Overview
//! The ledger decides each dispute synchronously at creation: fraud proof,
//! adjudication, report insertion, and the guilty-verdict side effects
//! (flag increment and, at the threshold, soft-slash deactivation) in one
//! flow. Verdicts are terminal here; `pending` and `manual_review` disputes
//! are handled by external reviewers. Listing never exposes the disputant's
//! identity or transaction hash.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::dispute::DisputeReason;
use crate::core::dispute::DisputeStatus;
use crate::core::dispute::ToolReport;
use crate::core::dispute::Verdict;
use crate::core::identifiers::ReportId;
use crate::core::identifiers::ToolId;
use crate::core::identifiers::TransactionHash;
use crate::core::identifiers::UserId;
use crate::core::time::Clock;
use crate::core::time::Timestamp;
use crate::core::tool::FLAG_THRESHOLD;
use crate::interfaces::FlagUpdate;
use crate::interfaces::StoreError;
use crate::interfaces::ToolStore;
use crate::runtime::adjudicator::adjudicate;
use crate::runtime::fraud::FraudProofError;
use crate::runtime::fraud::validate_fraud_proof;

// ============================================================================
// SECTION: Requests and Outcomes
// ============================================================================

/// Validated dispute filing request.
///
/// # Invariants
/// - `transaction_hash` passed wire-format validation before reaching here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisputeRequest {
    /// Disputed tool.
    pub tool_id: ToolId,
    /// Reporting user.
    pub reporter_id: UserId,
    /// Cited fraud proof.
    pub transaction_hash: TransactionHash,
    /// Cited reason.
    pub reason: DisputeReason,
    /// Optional free-text details.
    pub details: Option<String>,
    /// Invoked sub-tool name for MCP listings.
    pub tool_name: Option<String>,
}

/// Tool status reported back to the disputant.
///
/// # Invariants
/// - `deactivated` is true only when this dispute flipped the tool inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolStatusSummary {
    /// Flag count after this dispute.
    pub total_flags: u32,
    /// Whether this dispute soft-slashed the tool.
    pub deactivated: bool,
    /// Flag count at which a tool is soft-slashed.
    pub flag_threshold: u32,
}

/// Outcome of a successful dispute filing.
#[derive(Debug, Clone, PartialEq)]
pub struct DisputeOutcome {
    /// The inserted dispute record.
    pub report: ToolReport,
    /// Tool status after verdict side effects.
    pub tool_status: ToolStatusSummary,
}

/// Dispute ledger errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum DisputeError {
    /// The disputed tool does not exist.
    #[error("unknown tool: {0}")]
    UnknownTool(ToolId),
    /// The fraud proof was rejected.
    #[error(transparent)]
    FraudProof(#[from] FraudProofError),
    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Filing
// ============================================================================

/// Length of the transaction-hash prefix embedded in report identifiers.
const REPORT_ID_PREFIX_LEN: usize = 16;

/// Derives the report identifier from the fraud proof.
///
/// One report exists per transaction hash, so the identifier is derived
/// deterministically from the hash payload.
fn report_id_for(hash: &TransactionHash) -> ReportId {
    ReportId::new(format!("report-{}", &hash.hex_payload()[..REPORT_ID_PREFIX_LEN]))
}

/// Files a dispute: fraud proof, adjudication, insertion, and side effects.
///
/// Side effects are gated strictly on a guilty verdict: the tool's flag
/// count is incremented and, when the count reaches the threshold while the
/// tool is active, the tool is deactivated in the same update (soft slash).
///
/// # Errors
///
/// Returns [`DisputeError`] when the tool is unknown, the fraud proof is
/// rejected, or the store fails.
pub fn file_dispute(
    store: &dyn ToolStore,
    clock: &dyn Clock,
    request: &DisputeRequest,
) -> Result<DisputeOutcome, DisputeError> {
    let tool = store
        .find_tool(&request.tool_id)?
        .ok_or_else(|| DisputeError::UnknownTool(request.tool_id.clone()))?;

    let query =
        validate_fraud_proof(store, clock, &request.tool_id, &request.transaction_hash)?;

    let adjudication = adjudicate(
        request.reason,
        &tool.schema,
        &query.output,
        request.tool_name.as_deref(),
    );

    let guilty = adjudication.verdict == Verdict::Guilty;
    let report = ToolReport {
        report_id: report_id_for(&request.transaction_hash),
        tool_id: request.tool_id.clone(),
        reporter_id: request.reporter_id.clone(),
        transaction_hash: request.transaction_hash.clone(),
        query_id: query.query_id,
        reason: request.reason,
        details: request.details.clone(),
        verdict: adjudication.verdict,
        adjudication_note: adjudication.note,
        schema_errors: adjudication.schema_errors,
        status: if guilty { DisputeStatus::Resolved } else { DisputeStatus::Pending },
        created_at: clock.now(),
    };
    store.insert_report(&report)?;

    let tool_status = if guilty {
        let total_flags = tool.total_flags.saturating_add(1);
        let deactivate = total_flags >= FLAG_THRESHOLD && tool.is_active;
        store.update_flags(&request.tool_id, &FlagUpdate {
            total_flags,
            deactivate,
        })?;
        ToolStatusSummary {
            total_flags,
            deactivated: deactivate,
            flag_threshold: FLAG_THRESHOLD,
        }
    } else {
        ToolStatusSummary {
            total_flags: tool.total_flags,
            deactivated: false,
            flag_threshold: FLAG_THRESHOLD,
        }
    };

    Ok(DisputeOutcome {
        report,
        tool_status,
    })
}

// ============================================================================
// SECTION: Listing
// ============================================================================

/// Redacted view of one dispute.
///
/// # Invariants
/// - Never carries the transaction hash or the reporter identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactedDispute {
    /// Cited reason.
    pub reason: DisputeReason,
    /// Rendered verdict.
    pub verdict: Verdict,
    /// Processing status.
    pub status: DisputeStatus,
    /// Filing timestamp.
    pub created_at: Timestamp,
}

/// Aggregate dispute summary for a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeSummary {
    /// Total disputes filed against the tool.
    pub total: usize,
    /// Guilty verdict count.
    pub guilty: usize,
    /// Innocent verdict count.
    pub innocent: usize,
    /// Manual-review verdict count.
    pub manual_review: usize,
    /// Pending verdict count.
    pub pending: usize,
    /// Current flag count.
    pub total_flags: u32,
    /// Current activity flag.
    pub is_active: bool,
}

/// Redacted dispute list plus aggregate summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeLedgerView {
    /// Redacted disputes, oldest first.
    pub disputes: Vec<RedactedDispute>,
    /// Aggregate summary.
    pub summary: DisputeSummary,
}

/// Lists disputes for a tool with disputant privacy preserved.
///
/// # Errors
///
/// Returns [`DisputeError`] when the tool is unknown or the store fails.
pub fn list_disputes(
    store: &dyn ToolStore,
    tool_id: &ToolId,
) -> Result<DisputeLedgerView, DisputeError> {
    let tool =
        store.find_tool(tool_id)?.ok_or_else(|| DisputeError::UnknownTool(tool_id.clone()))?;
    let reports = store.list_reports_for_tool(tool_id)?;

    let mut summary = DisputeSummary {
        total: reports.len(),
        guilty: 0,
        innocent: 0,
        manual_review: 0,
        pending: 0,
        total_flags: tool.total_flags,
        is_active: tool.is_active,
    };
    let disputes = reports
        .into_iter()
        .map(|report| {
            match report.verdict {
                Verdict::Guilty => summary.guilty += 1,
                Verdict::Innocent => summary.innocent += 1,
                Verdict::ManualReview => summary.manual_review += 1,
                Verdict::Pending => summary.pending += 1,
            }
            RedactedDispute {
                reason: report.reason,
                verdict: report.verdict,
                status: report.status,
                created_at: report.created_at,
            }
        })
        .collect();

    Ok(DisputeLedgerView {
        disputes,
        summary,
    })
}
