// crates/context-trust-server/tests/common/mod.rs
// ============================================================================
// Module: Server Test Fixtures
// Description: Shared builders for seeded handler state and request bodies.
// Purpose: Keep handler tests focused on statuses and side effects.
// Dependencies: context-trust-core, context-trust-monitor, context-trust-server
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::missing_docs_in_private_items,
    dead_code,
    reason = "Test-only helpers; not every test uses every fixture."
)]

use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use context_trust_core::Clock;
use context_trust_core::FixedClock;
use context_trust_core::InMemoryToolStore;
use context_trust_core::PaymentProof;
use context_trust_core::QueryId;
use context_trust_core::QueryStatus;
use context_trust_core::Timestamp;
use context_trust_core::ToolId;
use context_trust_core::ToolQuery;
use context_trust_core::ToolRecord;
use context_trust_core::ToolSchema;
use context_trust_core::ToolStore;
use context_trust_core::TransactionHash;
use context_trust_core::UserId;
use context_trust_monitor::HealthProber;
use context_trust_monitor::HealthProberConfig;
use context_trust_monitor::ProbePolicy;
use context_trust_monitor::StakeReconciler;
use context_trust_monitor::StakeReconcilerConfig;
use context_trust_server::NoopMetrics;
use context_trust_server::ServerState;
use context_trust_server::TrustMetrics;
use serde_json::Value;
use serde_json::json;

/// Fixed "now" used by deterministic tests: 2026-01-01T00:00:00Z.
pub const NOW_MS: i64 = 1_767_225_600_000;

/// Scheduler secret wired into test state.
pub const SCHEDULER_SECRET: &str = "sched-secret";

/// Builds a transaction hash from a repeated nibble for readable fixtures.
pub fn tx_hash(nibble: char) -> TransactionHash {
    let payload: String = std::iter::repeat_n(nibble, 64).collect();
    TransactionHash::parse(&format!("0x{payload}")).unwrap()
}

/// Builds an active HTTP tool with the given declared output schema.
pub fn http_tool(id: &str, output_schema: Option<Value>) -> ToolRecord {
    ToolRecord {
        tool_id: ToolId::new(id),
        name: format!("{id} listing"),
        price_per_query: BigDecimal::from_str("0.10").unwrap(),
        payout_address: "0x00000000000000000000000000000000000000aa".to_string(),
        schema: ToolSchema::Http {
            endpoint: "https://api.example/run".to_string(),
            output_schema,
        },
        is_active: true,
        is_verified: true,
        total_queries: 0,
        total_flags: 0,
        staked_amount: BigDecimal::from_str("10").unwrap(),
        consecutive_failures: 0,
        uptime_percent: 100.0,
        last_health_check: None,
    }
}

/// Builds a completed paid invocation of the given tool.
pub fn paid_query(tool_id: &str, hash: &TransactionHash, output: Value) -> ToolQuery {
    ToolQuery {
        query_id: QueryId::new(format!("query-{}", &hash.hex_payload()[..8])),
        tool_id: ToolId::new(tool_id),
        user_id: UserId::new("user-reporter"),
        payment: PaymentProof::Onchain(hash.clone()),
        output,
        status: QueryStatus::Completed,
        executed_at: Timestamp::from_unix_millis(NOW_MS - 60_000),
    }
}

/// Builds handler state over the given seeded store.
pub fn server_state(store: Arc<InMemoryToolStore>) -> Arc<ServerState> {
    let tools: Arc<dyn ToolStore> = store;
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(Timestamp::from_unix_millis(NOW_MS)));
    let prober = HealthProber::new(
        Arc::clone(&tools),
        Arc::clone(&clock),
        HealthProberConfig {
            batch_size: 5,
            policy: ProbePolicy {
                allow_private_hosts: false,
            },
        },
    )
    .unwrap();
    let reconciler =
        StakeReconciler::new(Arc::clone(&tools), None, StakeReconcilerConfig::default());
    let metrics: Arc<dyn TrustMetrics> = Arc::new(NoopMetrics);
    Arc::new(ServerState::new(
        tools,
        clock,
        prober,
        reconciler,
        SCHEDULER_SECRET.to_string(),
        metrics,
    ))
}

/// Builds state seeded with one tool and one paid invocation.
pub fn seeded_state(
    tool: &ToolRecord,
    query: &ToolQuery,
) -> (Arc<InMemoryToolStore>, Arc<ServerState>) {
    let store = Arc::new(InMemoryToolStore::new());
    store.insert_tool(tool).unwrap();
    store.insert_query(query).unwrap();
    let state = server_state(Arc::clone(&store));
    (store, state)
}

/// Builds a well-formed dispute body for the given tool and proof.
pub fn dispute_body(tool_id: &str, hash: &TransactionHash) -> Value {
    json!({
        "tool_id": tool_id,
        "reporter_id": "user-reporter",
        "transaction_hash": hash.as_str(),
        "reason": "schema_mismatch",
        "details": "output did not match the advertised contract",
    })
}

/// Weather-style schema requiring a forecast field.
pub fn forecast_schema() -> Value {
    json!({
        "type": "object",
        "required": ["forecast"],
        "properties": {"forecast": {"type": "string"}}
    })
}
