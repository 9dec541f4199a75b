// crates/context-trust-core/src/interfaces/mod.rs
// ============================================================================
// Module: Trust Engine Interfaces
// Description: Backend-agnostic interfaces for persistence and the chain oracle.
// Purpose: Define the contract surfaces used by the trust engine runtime.
// Dependencies: crate::core, async-trait, bigdecimal, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the trust engine integrates with external systems
//! without embedding backend-specific details. Tool updates are deliberately
//! field-narrow: the dispute ledger, health prober, and stake reconciler each
//! write disjoint field groups, so concurrent writers on the same tool never
//! clobber each other's state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use thiserror::Error;

use crate::core::dispute::ToolReport;
use crate::core::identifiers::ToolId;
use crate::core::identifiers::TransactionHash;
use crate::core::query::ToolQuery;
use crate::core::time::Timestamp;
use crate::core::tool::ToolRecord;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Tool store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("tool store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("tool store corruption: {0}")]
    Corrupt(String),
    /// Store data is invalid.
    #[error("tool store invalid data: {0}")]
    Invalid(String),
    /// A uniqueness constraint was violated.
    #[error("tool store conflict: {0}")]
    Conflict(String),
    /// Store reported an error.
    #[error("tool store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Field-Narrow Updates
// ============================================================================

/// Flag-field update applied by the dispute ledger.
///
/// # Invariants
/// - Touches only `total_flags` and, when `deactivate` is set, `is_active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagUpdate {
    /// New cumulative flag count.
    pub total_flags: u32,
    /// Whether to flip `is_active` to false in the same update.
    pub deactivate: bool,
}

/// Health-field update applied by the health prober.
///
/// # Invariants
/// - Touches only failure counter, uptime, health-check stamp, and, when
///   `deactivate` is set, `is_active`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthUpdate {
    /// New consecutive-failure count.
    pub consecutive_failures: u32,
    /// New smoothed uptime percentage.
    pub uptime_percent: f64,
    /// Probe timestamp.
    pub last_health_check: Timestamp,
    /// Whether to flip `is_active` to false in the same update.
    pub deactivate: bool,
}

/// Stake-field update applied by the stake reconciler.
///
/// # Invariants
/// - Touches only `staked_amount` and, when `activate` is set, `is_active`.
/// - Flag counts are never reset by activation.
#[derive(Debug, Clone, PartialEq)]
pub struct StakeUpdate {
    /// Reconciled stake in USD.
    pub staked_amount: BigDecimal,
    /// Whether to flip `is_active` to true in the same update.
    pub activate: bool,
}

// ============================================================================
// SECTION: Tool Store
// ============================================================================

/// Persistence seam for tools, invocation records, and disputes.
///
/// Implementations must provide at least read-committed isolation per
/// operation; no transaction spanning multiple record types is assumed.
pub trait ToolStore: Send + Sync {
    /// Loads a tool by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn find_tool(&self, tool_id: &ToolId) -> Result<Option<ToolRecord>, StoreError>;

    /// Lists all tools.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when listing fails.
    fn list_tools(&self) -> Result<Vec<ToolRecord>, StoreError>;

    /// Lists currently active tools.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when listing fails.
    fn list_active_tools(&self) -> Result<Vec<ToolRecord>, StoreError>;

    /// Inserts a tool listing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when insertion fails.
    fn insert_tool(&self, record: &ToolRecord) -> Result<(), StoreError>;

    /// Finds the invocation record paid for by the given transaction hash.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_query_by_transaction_hash(
        &self,
        hash: &TransactionHash,
    ) -> Result<Option<ToolQuery>, StoreError>;

    /// Inserts an invocation record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when insertion fails.
    fn insert_query(&self, query: &ToolQuery) -> Result<(), StoreError>;

    /// Returns whether a dispute already references the transaction hash.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn report_exists_for_transaction(&self, hash: &TransactionHash) -> Result<bool, StoreError>;

    /// Inserts a dispute record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when a report already exists for the
    /// same transaction hash, and [`StoreError`] when insertion fails.
    fn insert_report(&self, report: &ToolReport) -> Result<(), StoreError>;

    /// Lists disputes filed against a tool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when listing fails.
    fn list_reports_for_tool(&self, tool_id: &ToolId) -> Result<Vec<ToolReport>, StoreError>;

    /// Applies a flag-field update to a tool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails or the tool is unknown.
    fn update_flags(&self, tool_id: &ToolId, update: &FlagUpdate) -> Result<(), StoreError>;

    /// Applies a health-field update to a tool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails or the tool is unknown.
    fn update_health(&self, tool_id: &ToolId, update: &HealthUpdate) -> Result<(), StoreError>;

    /// Applies a stake-field update to a tool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails or the tool is unknown.
    fn update_stake(&self, tool_id: &ToolId, update: &StakeUpdate) -> Result<(), StoreError>;

    /// Reports store readiness for liveness/readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Stake Oracle
// ============================================================================

/// Stake oracle errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The oracle environment is not configured.
    #[error("stake oracle misconfigured: {0}")]
    Misconfigured(String),
    /// The RPC transport failed.
    #[error("stake oracle rpc error: {0}")]
    Rpc(String),
    /// The RPC response could not be decoded.
    #[error("stake oracle decode error: {0}")]
    Decode(String),
}

/// Read-only view of staked collateral held by the router contract.
#[async_trait]
pub trait StakeOracle: Send + Sync {
    /// Reads the staked collateral for a tool key, in fixed-point token
    /// units (six decimals).
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] when the read fails.
    async fn stake_units(&self, tool_key: u64) -> Result<u128, OracleError>;
}
