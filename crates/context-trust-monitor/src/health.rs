// crates/context-trust-monitor/src/health.rs
// ============================================================================
// Module: Health Prober
// Description: Scheduled health-check loop over all active tools.
// Purpose: Track uptime, count failures, and deactivate unhealthy tools.
// Dependencies: context-trust-core, crate::endpoint, crate::probe, tokio
// ============================================================================

//! ## Overview
//! One health run probes every active tool in fixed-size batches: probes
//! within a batch run concurrently, batches run sequentially to bound
//! outbound connection pressure. Each probed tool gets both updates every
//! time: the uptime EMA and the consecutive-failure counter, applied
//! atomically to that tool's record. Reaching the failure threshold
//! deactivates the tool; the counter keeps counting until a success resets
//! it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use context_trust_core::Clock;
use context_trust_core::FAILURE_THRESHOLD;
use context_trust_core::HealthUpdate;
use context_trust_core::StoreError;
use context_trust_core::Timestamp;
use context_trust_core::ToolRecord;
use context_trust_core::ToolStore;
use serde::Deserialize;
use serde::Serialize;

use crate::endpoint::ProbePolicy;
use crate::endpoint::resolve_probe_target;
use crate::probe::ProbeClient;
use crate::probe::ProbeError;
use crate::probe::ProbeOutcome;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// EMA smoothing factor: weight of the newest probe result.
pub const UPTIME_ALPHA: f64 = 0.1;
/// Default number of concurrent probes per batch.
pub const DEFAULT_BATCH_SIZE: usize = 5;

// ============================================================================
// SECTION: Configuration and Summary
// ============================================================================

/// Health prober configuration.
///
/// # Invariants
/// - `batch_size` is at least 1.
#[derive(Debug, Clone, Copy)]
pub struct HealthProberConfig {
    /// Concurrent probes per batch.
    pub batch_size: usize,
    /// Endpoint reachability policy.
    pub policy: ProbePolicy,
}

impl Default for HealthProberConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            policy: ProbePolicy::default(),
        }
    }
}

/// Counts reported by one health run.
///
/// # Invariants
/// - `checked = passed + failed`; skipped tools see no state change.
/// - `deactivated` counts only deactivations that were persisted; a probed
///   tool whose update write failed lands in `errors` instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRunSummary {
    /// Tools actually probed.
    pub checked: usize,
    /// Probes classified healthy.
    pub passed: usize,
    /// Probes classified unhealthy.
    pub failed: usize,
    /// Tools skipped with no state change.
    pub skipped: usize,
    /// Tools deactivated by this run.
    pub deactivated: usize,
    /// Per-tool update writes that failed.
    pub errors: usize,
}

// ============================================================================
// SECTION: Pure State Planning
// ============================================================================

/// Applies the uptime EMA to a prior score.
///
/// `new = alpha * (success ? 100 : 0) + (1 - alpha) * old`.
#[must_use]
pub fn smooth_uptime(old: f64, success: bool) -> f64 {
    let target = if success { 100.0 } else { 0.0 };
    UPTIME_ALPHA.mul_add(target, (1.0 - UPTIME_ALPHA) * old)
}

/// Plans the per-tool health update for one probe result.
///
/// The failure counter resets on success and increments on failure; at the
/// threshold the tool is deactivated while the counter keeps its value.
#[must_use]
pub fn plan_health_update(tool: &ToolRecord, success: bool, now: Timestamp) -> HealthUpdate {
    let consecutive_failures =
        if success { 0 } else { tool.consecutive_failures.saturating_add(1) };
    HealthUpdate {
        consecutive_failures,
        uptime_percent: smooth_uptime(tool.uptime_percent, success),
        last_health_check: now,
        deactivate: !success && consecutive_failures >= FAILURE_THRESHOLD && tool.is_active,
    }
}

// ============================================================================
// SECTION: Prober
// ============================================================================

/// Scheduled health-check loop over active tools.
///
/// # Invariants
/// - A per-tool probe failure never aborts or affects sibling probes.
/// - Updates are applied per tool; no batch-wide transaction exists.
pub struct HealthProber {
    /// Persistence seam.
    store: Arc<dyn ToolStore>,
    /// Injected clock for health-check stamps.
    clock: Arc<dyn Clock>,
    /// Bounded probe client.
    probe: ProbeClient,
    /// Batch size and endpoint policy.
    config: HealthProberConfig,
}

impl HealthProber {
    /// Creates a prober over the given store and clock.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the probe client cannot be built.
    pub fn new(
        store: Arc<dyn ToolStore>,
        clock: Arc<dyn Clock>,
        config: HealthProberConfig,
    ) -> Result<Self, ProbeError> {
        Ok(Self {
            store,
            clock,
            probe: ProbeClient::new()?,
            config,
        })
    }

    /// Runs one health pass over all active tools.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the active-tool listing fails; per-tool
    /// probe and update failures are counted, never propagated.
    pub async fn run(&self) -> Result<HealthRunSummary, StoreError> {
        let tools = self.store.list_active_tools()?;
        let mut summary = HealthRunSummary::default();
        let batch_size = self.config.batch_size.max(1);

        for batch in tools.chunks(batch_size) {
            let mut in_flight = Vec::with_capacity(batch.len());
            for tool in batch {
                match resolve_probe_target(&tool.schema, self.config.policy) {
                    Ok(target) => {
                        let probe = self.probe.clone();
                        let handle =
                            tokio::spawn(async move { probe.probe(&target).await });
                        in_flight.push((tool.clone(), handle));
                    }
                    Err(_reason) => {
                        summary.skipped += 1;
                    }
                }
            }
            for (tool, handle) in in_flight {
                let outcome = handle.await.unwrap_or_else(|err| {
                    ProbeOutcome::Unreachable(format!("probe task failed: {err}"))
                });
                self.apply_outcome(&tool, &outcome, &mut summary);
            }
        }
        Ok(summary)
    }

    /// Applies one probe outcome to the tool record and the run summary.
    fn apply_outcome(
        &self,
        tool: &ToolRecord,
        outcome: &ProbeOutcome,
        summary: &mut HealthRunSummary,
    ) {
        let success = outcome.is_healthy();
        summary.checked += 1;
        if success {
            summary.passed += 1;
        } else {
            summary.failed += 1;
        }
        let update = plan_health_update(tool, success, self.clock.now());
        // Isolation: a failed write for one tool must not abort the run.
        // The summary only claims state changes that were persisted; a
        // lost update is counted and surfaces again on the next probe.
        match self.store.update_health(&tool.tool_id, &update) {
            Ok(()) => {
                if update.deactivate {
                    summary.deactivated += 1;
                }
            }
            Err(_) => summary.errors += 1,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
