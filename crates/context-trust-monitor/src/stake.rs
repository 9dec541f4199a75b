// crates/context-trust-monitor/src/stake.rs
// ============================================================================
// Module: Stake Reconciliation
// Description: Syncs on-chain staked collateral into tool records.
// Purpose: Keep stored stakes honest and re-activate sufficiently staked tools.
// Dependencies: context-trust-core, bigdecimal, tokio
// ============================================================================

//! ## Overview
//! The stake reconciler is the only path back to `is_active = true` once a
//! tool has been deactivated by flags or failed probes. Each run reads the
//! collateral locked in the router contract for every tool priced above a
//! near-zero floor, converts the 6-decimal token units to USD, and writes
//! the stake back only when it changed. An inactive tool whose fresh stake
//! meets the economic minimum is re-activated in the same narrow update;
//! its flag count is deliberately left untouched so the dispute history
//! survives restaking. A reconciler constructed without an oracle reports
//! the whole run as skipped rather than failing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use bigdecimal::num_bigint::BigInt;
use serde::Deserialize;
use serde::Serialize;

use context_trust_core::StakeOracle;
use context_trust_core::StakeUpdate;
use context_trust_core::StoreError;
use context_trust_core::ToolRecord;
use context_trust_core::ToolStore;
use context_trust_core::onchain_tool_key;
use context_trust_core::required_stake;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Tokens carry six decimal places on chain.
const TOKEN_DECIMALS: i64 = 6;
/// Default price floor below which tools are not worth a chain read.
pub const DEFAULT_PRICE_FLOOR: &str = "0.001";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Tunables for a reconciliation run.
#[derive(Debug, Clone)]
pub struct StakeReconcilerConfig {
    /// Tools priced at or below this USD floor are ignored.
    pub price_floor: BigDecimal,
}

impl Default for StakeReconcilerConfig {
    fn default() -> Self {
        Self {
            price_floor: BigDecimal::from_str(DEFAULT_PRICE_FLOOR)
                .unwrap_or_else(|_| BigDecimal::from(0)),
        }
    }
}

// ============================================================================
// SECTION: Run Summary
// ============================================================================

/// Outcome counters for one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeSyncSummary {
    /// Whether the run was skipped because no oracle was configured.
    pub skipped: bool,
    /// Tools whose stake was read from the chain.
    pub checked: u64,
    /// Tools whose stored stake was updated.
    pub synced: u64,
    /// Tools whose stake was already accurate.
    pub unchanged: u64,
    /// Inactive tools re-activated by this run.
    pub auto_activated: u64,
    /// Per-tool oracle or store failures.
    pub errors: u64,
}

impl StakeSyncSummary {
    /// Summary for a run short-circuited by missing configuration.
    #[must_use]
    pub fn skipped_run() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

// ============================================================================
// SECTION: Reconciler
// ============================================================================

/// Control loop reconciling stored stakes with the router contract.
pub struct StakeReconciler {
    /// Tool persistence.
    store: Arc<dyn ToolStore>,
    /// Chain read path, absent when the environment is unconfigured.
    oracle: Option<Arc<dyn StakeOracle>>,
    /// Run tunables.
    config: StakeReconcilerConfig,
}

impl StakeReconciler {
    /// Builds a reconciler. Passing `None` for the oracle produces a
    /// reconciler whose runs are always skipped.
    #[must_use]
    pub fn new(
        store: Arc<dyn ToolStore>,
        oracle: Option<Arc<dyn StakeOracle>>,
        config: StakeReconcilerConfig,
    ) -> Self {
        Self {
            store,
            oracle,
            config,
        }
    }

    /// Runs one reconciliation pass over all priced tools.
    ///
    /// Per-tool failures are counted and the run continues; only a failure
    /// to list tools aborts the pass.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the tool listing cannot be read.
    pub async fn run(&self) -> Result<StakeSyncSummary, StoreError> {
        let Some(oracle) = self.oracle.as_ref() else {
            return Ok(StakeSyncSummary::skipped_run());
        };
        let mut summary = StakeSyncSummary::default();
        let tools = self.store.list_tools()?;
        for tool in tools {
            if tool.price_per_query <= self.config.price_floor {
                continue;
            }
            summary.checked = summary.checked.saturating_add(1);
            let key = onchain_tool_key(&tool.tool_id);
            match oracle.stake_units(key).await {
                Ok(units) => self.apply_stake(&tool, units, &mut summary),
                Err(_err) => {
                    summary.errors = summary.errors.saturating_add(1);
                }
            }
        }
        Ok(summary)
    }

    /// Writes one tool's reconciled stake, counting the outcome.
    fn apply_stake(&self, tool: &ToolRecord, units: u128, summary: &mut StakeSyncSummary) {
        let fresh = units_to_usd(units);
        let activate =
            !tool.is_active && fresh >= required_stake(&tool.price_per_query);
        if fresh == tool.staked_amount && !activate {
            summary.unchanged = summary.unchanged.saturating_add(1);
            return;
        }
        let update = StakeUpdate {
            staked_amount: fresh,
            activate,
        };
        match self.store.update_stake(&tool.tool_id, &update) {
            Ok(()) => {
                summary.synced = summary.synced.saturating_add(1);
                if activate {
                    summary.auto_activated = summary.auto_activated.saturating_add(1);
                }
            }
            Err(_err) => {
                summary.errors = summary.errors.saturating_add(1);
            }
        }
    }
}

// ============================================================================
// SECTION: Unit Conversion
// ============================================================================

/// Converts 6-decimal token base units to a USD decimal.
#[must_use]
pub fn units_to_usd(units: u128) -> BigDecimal {
    BigDecimal::new(BigInt::from(units), TOKEN_DECIMALS)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
