// crates/context-trust-monitor/tests/common/mod.rs
// ============================================================================
// Module: Monitor Test Fixtures
// Description: Shared builders for probe targets and stake fixtures.
// Purpose: Keep control-loop tests focused on the behavior under test.
// Dependencies: context-trust-core, bigdecimal, tiny_http
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::missing_docs_in_private_items,
    dead_code,
    reason = "Test-only helpers; not every test uses every fixture."
)]

use std::collections::HashMap;
use std::net::TcpListener;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use context_trust_core::FlagUpdate;
use context_trust_core::HealthUpdate;
use context_trust_core::InMemoryToolStore;
use context_trust_core::OracleError;
use context_trust_core::StakeOracle;
use context_trust_core::StakeUpdate;
use context_trust_core::StoreError;
use context_trust_core::ToolId;
use context_trust_core::ToolQuery;
use context_trust_core::ToolRecord;
use context_trust_core::ToolReport;
use context_trust_core::ToolSchema;
use context_trust_core::ToolStore;
use context_trust_core::TransactionHash;

/// Fixed "now" used by deterministic tests: 2026-01-01T00:00:00Z.
pub const NOW_MS: i64 = 1_767_225_600_000;

/// Builds an active HTTP tool probing the given endpoint.
pub fn probe_tool(id: &str, endpoint: &str) -> ToolRecord {
    ToolRecord {
        tool_id: ToolId::new(id),
        name: format!("{id} listing"),
        price_per_query: BigDecimal::from_str("0.10").unwrap(),
        payout_address: "0x00000000000000000000000000000000000000aa".to_string(),
        schema: ToolSchema::Http {
            endpoint: endpoint.to_string(),
            output_schema: None,
        },
        is_active: true,
        is_verified: true,
        total_queries: 0,
        total_flags: 0,
        staked_amount: BigDecimal::from(0),
        consecutive_failures: 0,
        uptime_percent: 100.0,
        last_health_check: None,
    }
}

/// Builds an inactive tool priced at `price` USD with no recorded stake.
pub fn priced_tool(id: &str, price: &str, active: bool) -> ToolRecord {
    let mut record = probe_tool(id, "https://api.example/run");
    record.price_per_query = BigDecimal::from_str(price).unwrap();
    record.is_active = active;
    record
}

/// Spawns a one-shot HTTP server answering every request with `status`.
///
/// Returns the endpoint URL to probe. The serving thread is detached and
/// lives for the duration of the test process.
pub fn local_server(status: u16) -> String {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let response = tiny_http::Response::from_string("{}").with_status_code(status);
            let _ = request.respond(response);
        }
    });
    format!("http://127.0.0.1:{port}/run")
}

/// Reserves a port with nothing listening on it, for refused connections.
pub fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/run")
}

/// Store whose health-update writes always fail.
///
/// Everything else delegates to the wrapped in-memory store, so prober
/// runs can still list tools and probe them.
#[derive(Default)]
pub struct BrokenHealthStore {
    inner: InMemoryToolStore,
}

impl ToolStore for BrokenHealthStore {
    fn find_tool(&self, tool_id: &ToolId) -> Result<Option<ToolRecord>, StoreError> {
        self.inner.find_tool(tool_id)
    }

    fn list_tools(&self) -> Result<Vec<ToolRecord>, StoreError> {
        self.inner.list_tools()
    }

    fn list_active_tools(&self) -> Result<Vec<ToolRecord>, StoreError> {
        self.inner.list_active_tools()
    }

    fn insert_tool(&self, record: &ToolRecord) -> Result<(), StoreError> {
        self.inner.insert_tool(record)
    }

    fn find_query_by_transaction_hash(
        &self,
        hash: &TransactionHash,
    ) -> Result<Option<ToolQuery>, StoreError> {
        self.inner.find_query_by_transaction_hash(hash)
    }

    fn insert_query(&self, query: &ToolQuery) -> Result<(), StoreError> {
        self.inner.insert_query(query)
    }

    fn report_exists_for_transaction(
        &self,
        hash: &TransactionHash,
    ) -> Result<bool, StoreError> {
        self.inner.report_exists_for_transaction(hash)
    }

    fn insert_report(&self, report: &ToolReport) -> Result<(), StoreError> {
        self.inner.insert_report(report)
    }

    fn list_reports_for_tool(&self, tool_id: &ToolId) -> Result<Vec<ToolReport>, StoreError> {
        self.inner.list_reports_for_tool(tool_id)
    }

    fn update_flags(&self, tool_id: &ToolId, update: &FlagUpdate) -> Result<(), StoreError> {
        self.inner.update_flags(tool_id, update)
    }

    fn update_health(&self, _tool_id: &ToolId, _update: &HealthUpdate) -> Result<(), StoreError> {
        Err(StoreError::Io("health write rejected".to_string()))
    }

    fn update_stake(&self, tool_id: &ToolId, update: &StakeUpdate) -> Result<(), StoreError> {
        self.inner.update_stake(tool_id, update)
    }
}

/// Stake oracle scripted per tool key.
#[derive(Default)]
pub struct ScriptedOracle {
    stakes: Mutex<HashMap<u64, u128>>,
}

impl ScriptedOracle {
    pub fn with_stake(tool_key: u64, units: u128) -> Self {
        let oracle = Self::default();
        oracle.set_stake(tool_key, units);
        oracle
    }

    pub fn set_stake(&self, tool_key: u64, units: u128) {
        self.stakes.lock().unwrap().insert(tool_key, units);
    }
}

#[async_trait]
impl StakeOracle for ScriptedOracle {
    async fn stake_units(&self, tool_key: u64) -> Result<u128, OracleError> {
        self.stakes
            .lock()
            .unwrap()
            .get(&tool_key)
            .copied()
            .ok_or_else(|| OracleError::Rpc("no scripted stake for key".to_string()))
    }
}
