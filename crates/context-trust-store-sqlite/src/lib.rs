// crates/context-trust-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Tool Store
// Description: Durable ToolStore backend using SQLite WAL.
// Purpose: Provide production persistence for tools, invocations, and disputes.
// Dependencies: context-trust-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a `SQLite`-backed [`context_trust_core::ToolStore`]
//! implementation. Tool listings, invocation records, and filed disputes are
//! persisted in WAL mode with the one-dispute-per-transaction-hash rule
//! enforced by a database uniqueness constraint rather than application
//! logic alone.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
pub use store::SqliteToolStore;
pub use store::SqliteToolStoreConfig;
