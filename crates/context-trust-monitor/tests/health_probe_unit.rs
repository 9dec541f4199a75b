// crates/context-trust-monitor/tests/health_probe_unit.rs
// ============================================================================
// Module: Health Probe Integration Tests
// Description: End-to-end prober runs against local HTTP servers.
// Purpose: Verify probe outcomes, skip policy, and deactivation behavior.
// Dependencies: context-trust-core, context-trust-monitor, tiny_http, tokio
// ============================================================================

//! ## Overview
//! Runs the prober against live loopback servers and dead sockets: uptime
//! smoothing, threshold deactivation, the private-host skip policy, batch
//! sequencing, and per-tool failure isolation.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::float_cmp,
    clippy::missing_docs_in_private_items,
    reason = "Tests assert exact fixture values."
)]

mod common;

use std::sync::Arc;

use context_trust_core::FixedClock;
use context_trust_core::InMemoryToolStore;
use context_trust_core::Timestamp;
use context_trust_core::ToolId;
use context_trust_core::ToolStore;
use context_trust_monitor::HealthProber;
use context_trust_monitor::HealthProberConfig;
use context_trust_monitor::ProbePolicy;

use common::BrokenHealthStore;
use common::NOW_MS;
use common::dead_endpoint;
use common::local_server;
use common::probe_tool;

/// Prober config that may reach loopback servers started by the tests.
fn loopback_config() -> HealthProberConfig {
    HealthProberConfig {
        batch_size: 5,
        policy: ProbePolicy {
            allow_private_hosts: true,
        },
    }
}

fn prober(store: &Arc<InMemoryToolStore>, config: HealthProberConfig) -> HealthProber {
    let clock = Arc::new(FixedClock::new(Timestamp::from_unix_millis(NOW_MS)));
    let tools: Arc<dyn ToolStore> = store.clone();
    HealthProber::new(tools, clock, config).unwrap()
}

#[tokio::test]
async fn healthy_endpoint_passes_and_stamps_check() {
    let store = Arc::new(InMemoryToolStore::new());
    let endpoint = local_server(200);
    store.insert_tool(&probe_tool("tool-up", &endpoint)).unwrap();

    let summary = prober(&store, loopback_config()).run().await.unwrap();

    assert_eq!(summary.checked, 1);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.deactivated, 0);

    let tool = store.find_tool(&ToolId::new("tool-up")).unwrap().unwrap();
    assert!(tool.is_active);
    assert_eq!(tool.consecutive_failures, 0);
    assert_eq!(tool.uptime_percent, 100.0);
    assert_eq!(
        tool.last_health_check,
        Some(Timestamp::from_unix_millis(NOW_MS))
    );
}

#[tokio::test]
async fn method_not_allowed_still_counts_alive() {
    let store = Arc::new(InMemoryToolStore::new());
    let endpoint = local_server(405);
    store.insert_tool(&probe_tool("tool-405", &endpoint)).unwrap();

    let summary = prober(&store, loopback_config()).run().await.unwrap();

    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn server_error_counts_failed() {
    let store = Arc::new(InMemoryToolStore::new());
    let endpoint = local_server(500);
    store.insert_tool(&probe_tool("tool-500", &endpoint)).unwrap();

    let summary = prober(&store, loopback_config()).run().await.unwrap();

    assert_eq!(summary.failed, 1);
    let tool = store.find_tool(&ToolId::new("tool-500")).unwrap().unwrap();
    assert_eq!(tool.consecutive_failures, 1);
    assert_eq!(tool.uptime_percent, 90.0);
    assert!(tool.is_active);
}

#[tokio::test]
async fn default_policy_skips_loopback_hosts() {
    let store = Arc::new(InMemoryToolStore::new());
    store
        .insert_tool(&probe_tool("tool-internal", "http://127.0.0.1:9/run"))
        .unwrap();

    let config = HealthProberConfig {
        batch_size: 5,
        policy: ProbePolicy::default(),
    };
    let summary = prober(&store, config).run().await.unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.checked, 0);

    // Skipped tools keep their health fields untouched.
    let tool = store
        .find_tool(&ToolId::new("tool-internal"))
        .unwrap()
        .unwrap();
    assert_eq!(tool.consecutive_failures, 0);
    assert_eq!(tool.last_health_check, None);
}

#[tokio::test]
async fn third_consecutive_failure_deactivates() {
    let store = Arc::new(InMemoryToolStore::new());
    let endpoint = dead_endpoint();
    store.insert_tool(&probe_tool("tool-down", &endpoint)).unwrap();
    let prober = prober(&store, loopback_config());

    let first = prober.run().await.unwrap();
    assert_eq!(first.failed, 1);
    assert_eq!(first.deactivated, 0);

    let second = prober.run().await.unwrap();
    assert_eq!(second.deactivated, 0);

    let third = prober.run().await.unwrap();
    assert_eq!(third.deactivated, 1);

    let tool = store.find_tool(&ToolId::new("tool-down")).unwrap().unwrap();
    assert!(!tool.is_active);
    assert_eq!(tool.consecutive_failures, 3);
    // 100 smoothed down three times at alpha 0.1.
    assert!((tool.uptime_percent - 72.9).abs() < 1e-9);
}

#[tokio::test]
async fn deactivated_tools_leave_the_probe_set() {
    let store = Arc::new(InMemoryToolStore::new());
    let endpoint = dead_endpoint();
    store.insert_tool(&probe_tool("tool-gone", &endpoint)).unwrap();
    let prober = prober(&store, loopback_config());

    for _ in 0..3 {
        prober.run().await.unwrap();
    }
    let after = prober.run().await.unwrap();

    // The tool is inactive now, so the next run has nothing to check.
    assert_eq!(after.checked, 0);
    assert_eq!(after.skipped, 0);
}

#[tokio::test]
async fn large_tool_sets_are_probed_in_batches() {
    let store = Arc::new(InMemoryToolStore::new());
    let endpoint = local_server(200);
    for index in 0..7 {
        store
            .insert_tool(&probe_tool(&format!("tool-{index}"), &endpoint))
            .unwrap();
    }

    let summary = prober(&store, loopback_config()).run().await.unwrap();

    assert_eq!(summary.checked, 7);
    assert_eq!(summary.passed, 7);
}

#[tokio::test]
async fn failed_update_write_is_counted_and_never_claims_a_deactivation() {
    let store = Arc::new(BrokenHealthStore::default());
    let endpoint = dead_endpoint();
    let mut tool = probe_tool("tool-stuck", &endpoint);
    tool.consecutive_failures = 2;
    store.insert_tool(&tool).unwrap();

    let clock = Arc::new(FixedClock::new(Timestamp::from_unix_millis(NOW_MS)));
    let tools: Arc<dyn ToolStore> = store.clone();
    let summary =
        HealthProber::new(tools, clock, loopback_config()).unwrap().run().await.unwrap();

    // The probe itself failed and would have crossed the threshold, but
    // the write was rejected: the deactivation must not be reported.
    assert_eq!(summary.checked, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.deactivated, 0);
    assert_eq!(summary.errors, 1);

    let stored = store.find_tool(&ToolId::new("tool-stuck")).unwrap().unwrap();
    assert!(stored.is_active);
    assert_eq!(stored.consecutive_failures, 2);
}

#[tokio::test]
async fn one_dead_endpoint_does_not_affect_siblings() {
    let store = Arc::new(InMemoryToolStore::new());
    let live = local_server(200);
    let dead = dead_endpoint();
    store.insert_tool(&probe_tool("tool-live", &live)).unwrap();
    store.insert_tool(&probe_tool("tool-dead", &dead)).unwrap();

    let summary = prober(&store, loopback_config()).run().await.unwrap();

    assert_eq!(summary.checked, 2);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 1);

    let live_tool = store.find_tool(&ToolId::new("tool-live")).unwrap().unwrap();
    assert_eq!(live_tool.consecutive_failures, 0);
}
