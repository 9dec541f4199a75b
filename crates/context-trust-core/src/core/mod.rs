// crates/context-trust-core/src/core/mod.rs
// ============================================================================
// Module: Core Data Model
// Description: Records and value types shared across the trust engine.
// Purpose: Group identifier, tool, query, dispute, and time types.
// Dependencies: serde, bigdecimal, sha2
// ============================================================================

//! ## Overview
//! The core module holds the marketplace records the trust engine reads and
//! mutates: [`tool::ToolRecord`] as the long-lived aggregate and the
//! append-mostly [`query::ToolQuery`] / [`dispute::ToolReport`] facts.

/// Dispute records, reasons, and verdicts.
pub mod dispute;
/// Opaque and validated identifier newtypes.
pub mod identifiers;
/// In-memory [`crate::interfaces::ToolStore`] for tests and development.
pub mod memory;
/// Immutable invocation records.
pub mod query;
/// Timestamps and the clock seam.
pub mod time;
/// Tool listings, schemas, and economic-security rules.
pub mod tool;
