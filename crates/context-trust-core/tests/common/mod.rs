// crates/context-trust-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Fixtures
// Description: Shared builders for tools, invocations, and dispute requests.
// Purpose: Keep integration tests focused on the behavior under test.
// Dependencies: context-trust-core, bigdecimal, serde_json
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

use bigdecimal::BigDecimal;
use context_trust_core::DisputeReason;
use context_trust_core::DisputeRequest;
use context_trust_core::InMemoryToolStore;
use context_trust_core::PaymentProof;
use context_trust_core::QueryId;
use context_trust_core::QueryStatus;
use context_trust_core::SubTool;
use context_trust_core::Timestamp;
use context_trust_core::ToolId;
use context_trust_core::ToolQuery;
use context_trust_core::ToolRecord;
use context_trust_core::ToolSchema;
use context_trust_core::ToolStore;
use context_trust_core::TransactionHash;
use context_trust_core::UserId;
use serde_json::Value;
use serde_json::json;

/// Fixed "now" used by deterministic tests: 2026-01-01T00:00:00Z.
pub const NOW_MS: i64 = 1_767_225_600_000;

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

/// Builds an active MCP tool with one named sub-tool.
pub fn mcp_tool(id: &str, sub_tool: &str, output_schema: Option<Value>) -> ToolRecord {
    let mut record = http_tool(id, None);
    record.schema = ToolSchema::Mcp {
        endpoint: "https://tools.example/mcp".to_string(),
        sub_tools: vec![SubTool {
            name: sub_tool.to_string(),
            description: Some("fixture sub-tool".to_string()),
            output_schema,
        }],
    };
    record
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

/// Builds a dispute request citing the given proof.
pub fn dispute_request(tool_id: &str, hash: &TransactionHash, reason: DisputeReason) -> DisputeRequest {
    DisputeRequest {
        tool_id: ToolId::new(tool_id),
        reporter_id: UserId::new("user-reporter"),
        transaction_hash: hash.clone(),
        reason,
        details: Some("output did not match the advertised contract".to_string()),
        tool_name: None,
    }
}

/// Builds a store seeded with one tool and one paid invocation.
pub fn seeded_store(tool: &ToolRecord, query: &ToolQuery) -> InMemoryToolStore {
    let store = InMemoryToolStore::new();
    store.insert_tool(tool).unwrap();
    store.insert_query(query).unwrap();
    store
}

/// Weather-style schema requiring a forecast field.
pub fn forecast_schema() -> Value {
    json!({
        "type": "object",
        "required": ["forecast"],
        "properties": {"forecast": {"type": "string"}}
    })
}
