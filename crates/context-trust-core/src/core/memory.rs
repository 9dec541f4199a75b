// crates/context-trust-core/src/core/memory.rs
// ============================================================================
// Module: In-Memory Tool Store
// Description: Mutex-guarded in-memory ToolStore implementation.
// Purpose: Back tests and development hosts without a database.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryToolStore`] implements the full [`ToolStore`] seam over plain
//! maps. It mirrors the durable store's semantics, including the uniqueness
//! constraint on dispute transaction hashes and field-narrow tool updates.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::dispute::ToolReport;
use crate::core::identifiers::PaymentProof;
use crate::core::identifiers::ToolId;
use crate::core::identifiers::TransactionHash;
use crate::core::query::ToolQuery;
use crate::core::tool::ToolRecord;
use crate::interfaces::FlagUpdate;
use crate::interfaces::HealthUpdate;
use crate::interfaces::StakeUpdate;
use crate::interfaces::StoreError;
use crate::interfaces::ToolStore;

// ============================================================================
// SECTION: Store
// ============================================================================

/// Mutable store contents behind the lock.
#[derive(Debug, Default)]
struct Inner {
    /// Tool records keyed by identifier.
    tools: BTreeMap<ToolId, ToolRecord>,
    /// Invocation records in insertion order.
    queries: Vec<ToolQuery>,
    /// Dispute records in insertion order.
    reports: Vec<ToolReport>,
}

/// In-memory [`ToolStore`] for tests and development.
///
/// # Invariants
/// - All access is serialized through the inner mutex.
/// - Dispute transaction hashes are unique, as in the durable store.
#[derive(Debug, Default)]
pub struct InMemoryToolStore {
    /// Guarded store contents.
    inner: Mutex<Inner>,
}

impl InMemoryToolStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the inner lock, mapping poisoning into a store error.
    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Store("store lock poisoned".to_string()))
    }
}

impl ToolStore for InMemoryToolStore {
    fn find_tool(&self, tool_id: &ToolId) -> Result<Option<ToolRecord>, StoreError> {
        Ok(self.lock()?.tools.get(tool_id).cloned())
    }

    fn list_tools(&self) -> Result<Vec<ToolRecord>, StoreError> {
        Ok(self.lock()?.tools.values().cloned().collect())
    }

    fn list_active_tools(&self) -> Result<Vec<ToolRecord>, StoreError> {
        Ok(self.lock()?.tools.values().filter(|tool| tool.is_active).cloned().collect())
    }

    fn insert_tool(&self, record: &ToolRecord) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.tools.contains_key(&record.tool_id) {
            return Err(StoreError::Conflict(format!("tool already exists: {}", record.tool_id)));
        }
        inner.tools.insert(record.tool_id.clone(), record.clone());
        Ok(())
    }

    fn find_query_by_transaction_hash(
        &self,
        hash: &TransactionHash,
    ) -> Result<Option<ToolQuery>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .queries
            .iter()
            .find(|query| query.payment == PaymentProof::Onchain(hash.clone()))
            .cloned())
    }

    fn insert_query(&self, query: &ToolQuery) -> Result<(), StoreError> {
        self.lock()?.queries.push(query.clone());
        Ok(())
    }

    fn report_exists_for_transaction(&self, hash: &TransactionHash) -> Result<bool, StoreError> {
        let inner = self.lock()?;
        Ok(inner.reports.iter().any(|report| report.transaction_hash == *hash))
    }

    fn insert_report(&self, report: &ToolReport) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.reports.iter().any(|existing| {
            existing.transaction_hash == report.transaction_hash
        }) {
            return Err(StoreError::Conflict(format!(
                "dispute already exists for transaction {}",
                report.transaction_hash
            )));
        }
        inner.reports.push(report.clone());
        Ok(())
    }

    fn list_reports_for_tool(&self, tool_id: &ToolId) -> Result<Vec<ToolReport>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.reports.iter().filter(|report| report.tool_id == *tool_id).cloned().collect())
    }

    fn update_flags(&self, tool_id: &ToolId, update: &FlagUpdate) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let tool = inner
            .tools
            .get_mut(tool_id)
            .ok_or_else(|| StoreError::Invalid(format!("unknown tool: {tool_id}")))?;
        tool.total_flags = update.total_flags;
        if update.deactivate {
            tool.is_active = false;
        }
        Ok(())
    }

    fn update_health(&self, tool_id: &ToolId, update: &HealthUpdate) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let tool = inner
            .tools
            .get_mut(tool_id)
            .ok_or_else(|| StoreError::Invalid(format!("unknown tool: {tool_id}")))?;
        tool.consecutive_failures = update.consecutive_failures;
        tool.uptime_percent = update.uptime_percent;
        tool.last_health_check = Some(update.last_health_check);
        if update.deactivate {
            tool.is_active = false;
        }
        Ok(())
    }

    fn update_stake(&self, tool_id: &ToolId, update: &StakeUpdate) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let tool = inner
            .tools
            .get_mut(tool_id)
            .ok_or_else(|| StoreError::Invalid(format!("unknown tool: {tool_id}")))?;
        tool.staked_amount = update.staked_amount.clone();
        if update.activate {
            tool.is_active = true;
        }
        Ok(())
    }
}
