// crates/context-trust-core/src/runtime/mod.rs
// ============================================================================
// Module: Trust Engine Runtime
// Description: Deterministic adjudication logic over injected dependencies.
// Purpose: Group fraud-proof validation, schema verdicts, and the ledger.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Runtime operations are pure over their injected dependencies: each takes
//! a [`crate::interfaces::ToolStore`] and, where time matters, a
//! [`crate::core::time::Clock`]. Nothing here reads ambient global state.

/// JSON Schema adjudication.
pub mod adjudicator;
/// Fraud-proof validation.
pub mod fraud;
/// Dispute filing and redacted listing.
pub mod ledger;
