// crates/context-trust-core/src/lib.rs
// ============================================================================
// Module: Context Trust Core
// Description: Data model, trait seams, and adjudication logic for the
//              Context marketplace trust engine.
// Purpose: Provide backend-agnostic dispute adjudication and trust scoring.
// Dependencies: serde, serde_json, jsonschema, bigdecimal, thiserror
// ============================================================================

//! ## Overview
//! `context-trust-core` holds the shared data model of the Context tool
//! marketplace trust engine (tools, paid invocations, disputes), the trait
//! seams toward persistence and the on-chain stake oracle, and the
//! deterministic adjudication logic: fraud-proof validation, JSON Schema
//! verdicts, and the dispute ledger with its soft-slash policy.
//!
//! Control loops (health probing, stake reconciliation) live in
//! `context-trust-monitor`; the HTTP surface lives in
//! `context-trust-server`. All core operations take their dependencies
//! (store, clock) as explicit parameters and never read ambient state.

/// Core data model: identifiers, tools, queries, disputes, time.
pub mod core;
/// Backend-agnostic interfaces for persistence and the stake oracle.
pub mod interfaces;
/// Deterministic runtime logic: fraud proofs, adjudication, ledger.
pub mod runtime;

pub use core::dispute::DisputeReason;
pub use core::dispute::DisputeStatus;
pub use core::dispute::SchemaViolation;
pub use core::dispute::ToolReport;
pub use core::dispute::Verdict;
pub use core::identifiers::PaymentProof;
pub use core::identifiers::QueryId;
pub use core::identifiers::ReportId;
pub use core::identifiers::ToolId;
pub use core::identifiers::TransactionHash;
pub use core::identifiers::TransactionHashError;
pub use core::identifiers::UserId;
pub use core::memory::InMemoryToolStore;
pub use core::query::QueryStatus;
pub use core::query::ToolQuery;
pub use core::time::Clock;
pub use core::time::FixedClock;
pub use core::time::SystemClock;
pub use core::time::Timestamp;
pub use core::tool::FAILURE_THRESHOLD;
pub use core::tool::FLAG_THRESHOLD;
pub use core::tool::SubTool;
pub use core::tool::ToolRecord;
pub use core::tool::ToolSchema;
pub use core::tool::onchain_tool_key;
pub use core::tool::required_stake;
pub use interfaces::FlagUpdate;
pub use interfaces::HealthUpdate;
pub use interfaces::OracleError;
pub use interfaces::StakeOracle;
pub use interfaces::StakeUpdate;
pub use interfaces::StoreError;
pub use interfaces::ToolStore;
pub use runtime::adjudicator::Adjudication;
pub use runtime::adjudicator::adjudicate;
pub use runtime::adjudicator::adjudicate_schema_mismatch;
pub use runtime::fraud::FraudProofError;
pub use runtime::fraud::validate_fraud_proof;
pub use runtime::ledger::DisputeError;
pub use runtime::ledger::DisputeLedgerView;
pub use runtime::ledger::DisputeOutcome;
pub use runtime::ledger::DisputeRequest;
pub use runtime::ledger::DisputeSummary;
pub use runtime::ledger::RedactedDispute;
pub use runtime::ledger::ToolStatusSummary;
pub use runtime::ledger::file_dispute;
pub use runtime::ledger::list_disputes;
