// crates/context-trust-monitor/src/lib.rs
// ============================================================================
// Module: Context Trust Monitor
// Description: Health probing and stake reconciliation control loops.
// Purpose: Keep tool trust state aligned with endpoint reality and chain state.
// Dependencies: context-trust-core, reqwest, tokio, bigdecimal
// ============================================================================

//! ## Overview
//! `context-trust-monitor` implements the two scheduler-driven control loops
//! of the trust engine. The health prober pings every active tool's
//! endpoint, smooths an uptime score, and deactivates tools after repeated
//! failures. The stake reconciler reads staked collateral from the router
//! contract and re-activates tools whose stake meets the economic minimum.
//! Per-tool failures are isolated: one broken endpoint or one failed chain
//! read never aborts the rest of a run.

/// Probe endpoint resolution and reachability policy.
pub mod endpoint;
/// Health-probe control loop.
pub mod health;
/// JSON-RPC stake oracle against the router contract.
pub mod oracle;
/// Single-endpoint liveness probes.
pub mod probe;
/// Stake reconciliation control loop.
pub mod stake;

pub use endpoint::ProbePolicy;
pub use endpoint::ProbeProtocol;
pub use endpoint::ProbeTarget;
pub use endpoint::SkipReason;
pub use endpoint::resolve_probe_target;
pub use health::DEFAULT_BATCH_SIZE;
pub use health::HealthProber;
pub use health::HealthProberConfig;
pub use health::HealthRunSummary;
pub use health::plan_health_update;
pub use health::smooth_uptime;
pub use oracle::EvmOracleConfig;
pub use oracle::EvmStakeOracle;
pub use probe::ProbeClient;
pub use probe::ProbeError;
pub use probe::ProbeOutcome;
pub use stake::StakeReconciler;
pub use stake::StakeReconcilerConfig;
pub use stake::StakeSyncSummary;
pub use stake::units_to_usd;
