// crates/context-trust-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Tool Store Tests
// Description: Round-trip and constraint tests against a temp database.
// Purpose: Verify persistence, uniqueness, and field-narrow update semantics.
// Dependencies: context-trust-core, context-trust-store-sqlite, tempfile
// ============================================================================

//! ## Overview
//! Exercises the durable store against a temp database file: full-record
//! round trips, the one-dispute-per-hash constraint, field-narrow updates
//! that never clobber sibling fields, and reopen survival.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::float_cmp,
    clippy::missing_docs_in_private_items,
    reason = "Tests assert exact fixture values."
)]

use std::path::PathBuf;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde_json::json;
use tempfile::TempDir;

use context_trust_core::DisputeReason;
use context_trust_core::DisputeStatus;
use context_trust_core::FlagUpdate;
use context_trust_core::HealthUpdate;
use context_trust_core::PaymentProof;
use context_trust_core::QueryId;
use context_trust_core::QueryStatus;
use context_trust_core::ReportId;
use context_trust_core::StakeUpdate;
use context_trust_core::StoreError;
use context_trust_core::Timestamp;
use context_trust_core::ToolId;
use context_trust_core::ToolQuery;
use context_trust_core::ToolRecord;
use context_trust_core::ToolReport;
use context_trust_core::ToolSchema;
use context_trust_core::ToolStore;
use context_trust_core::TransactionHash;
use context_trust_core::UserId;
use context_trust_core::Verdict;
use context_trust_store_sqlite::SqliteToolStore;
use context_trust_store_sqlite::SqliteToolStoreConfig;

/// Fixed timestamp used across fixtures: 2026-01-01T00:00:00Z.
const NOW_MS: i64 = 1_767_225_600_000;

fn temp_store() -> (TempDir, SqliteToolStore, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trust.db");
    let store = SqliteToolStore::new(&store_config(&path)).unwrap();
    (dir, store, path)
}

fn store_config(path: &std::path::Path) -> SqliteToolStoreConfig {
    SqliteToolStoreConfig {
        path: path.to_path_buf(),
        busy_timeout_ms: 5_000,
        journal_mode: context_trust_store_sqlite::SqliteStoreMode::Wal,
        sync_mode: context_trust_store_sqlite::SqliteSyncMode::Full,
    }
}

fn tool(id: &str) -> ToolRecord {
    ToolRecord {
        tool_id: ToolId::new(id),
        name: format!("{id} listing"),
        price_per_query: BigDecimal::from_str("0.10").unwrap(),
        payout_address: "0x00000000000000000000000000000000000000aa".to_string(),
        schema: ToolSchema::Http {
            endpoint: "https://api.example/run".to_string(),
            output_schema: Some(json!({ "type": "object" })),
        },
        is_active: true,
        is_verified: false,
        total_queries: 42,
        total_flags: 0,
        staked_amount: BigDecimal::from_str("12.5").unwrap(),
        consecutive_failures: 0,
        uptime_percent: 99.5,
        last_health_check: None,
    }
}

fn tx_hash(nibble: char) -> TransactionHash {
    let payload: String = std::iter::repeat_n(nibble, 64).collect();
    TransactionHash::parse(&format!("0x{payload}")).unwrap()
}

fn query(tool_id: &str, hash: &TransactionHash) -> ToolQuery {
    ToolQuery {
        query_id: QueryId::new(format!("query-{}", &hash.hex_payload()[..8])),
        tool_id: ToolId::new(tool_id),
        user_id: UserId::new("user-reporter"),
        payment: PaymentProof::Onchain(hash.clone()),
        output: json!({ "forecast": "sunny" }),
        status: QueryStatus::Completed,
        executed_at: Timestamp::from_unix_millis(NOW_MS - 60_000),
    }
}

fn report(tool_id: &str, hash: &TransactionHash, id: &str) -> ToolReport {
    ToolReport {
        report_id: ReportId::new(id),
        tool_id: ToolId::new(tool_id),
        reporter_id: UserId::new("user-reporter"),
        transaction_hash: hash.clone(),
        query_id: QueryId::new("query-1"),
        reason: DisputeReason::SchemaMismatch,
        details: Some("missing forecast field".to_string()),
        verdict: Verdict::Guilty,
        adjudication_note: "output violated the declared schema".to_string(),
        schema_errors: Vec::new(),
        status: DisputeStatus::Resolved,
        created_at: Timestamp::from_unix_millis(NOW_MS),
    }
}

#[test]
fn tool_round_trips_all_fields() {
    let (_dir, store, _path) = temp_store();
    let mut record = tool("tool-a");
    record.last_health_check = Some(Timestamp::from_unix_millis(NOW_MS));
    store.insert_tool(&record).unwrap();

    let loaded = store.find_tool(&ToolId::new("tool-a")).unwrap().unwrap();
    assert_eq!(loaded, record);
}

#[test]
fn missing_tool_is_none() {
    let (_dir, store, _path) = temp_store();
    assert!(store.find_tool(&ToolId::new("tool-missing")).unwrap().is_none());
}

#[test]
fn active_listing_excludes_deactivated_tools() {
    let (_dir, store, _path) = temp_store();
    store.insert_tool(&tool("tool-a")).unwrap();
    let mut inactive = tool("tool-b");
    inactive.is_active = false;
    store.insert_tool(&inactive).unwrap();

    let active = store.list_active_tools().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].tool_id, ToolId::new("tool-a"));
    assert_eq!(store.list_tools().unwrap().len(), 2);
}

#[test]
fn query_found_by_transaction_hash() {
    let (_dir, store, _path) = temp_store();
    store.insert_tool(&tool("tool-a")).unwrap();
    let hash = tx_hash('a');
    let record = query("tool-a", &hash);
    store.insert_query(&record).unwrap();

    let found = store.find_query_by_transaction_hash(&hash).unwrap().unwrap();
    assert_eq!(found, record);
    assert!(store.find_query_by_transaction_hash(&tx_hash('b')).unwrap().is_none());
}

#[test]
fn duplicate_report_hash_is_a_conflict() {
    let (_dir, store, _path) = temp_store();
    let hash = tx_hash('c');
    store.insert_report(&report("tool-a", &hash, "report-1")).unwrap();

    let err = store.insert_report(&report("tool-a", &hash, "report-2")).unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    assert!(store.report_exists_for_transaction(&hash).unwrap());
}

#[test]
fn reports_list_newest_first() {
    let (_dir, store, _path) = temp_store();
    let mut older = report("tool-a", &tx_hash('d'), "report-old");
    older.created_at = Timestamp::from_unix_millis(NOW_MS - 1_000);
    store.insert_report(&older).unwrap();
    store.insert_report(&report("tool-a", &tx_hash('e'), "report-new")).unwrap();
    store.insert_report(&report("tool-other", &tx_hash('f'), "report-x")).unwrap();

    let reports = store.list_reports_for_tool(&ToolId::new("tool-a")).unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].report_id, ReportId::new("report-new"));
    assert_eq!(reports[1].report_id, ReportId::new("report-old"));
}

#[test]
fn flag_update_is_field_narrow() {
    let (_dir, store, _path) = temp_store();
    let mut record = tool("tool-a");
    record.consecutive_failures = 2;
    store.insert_tool(&record).unwrap();

    store
        .update_flags(
            &ToolId::new("tool-a"),
            &FlagUpdate {
                total_flags: 5,
                deactivate: true,
            },
        )
        .unwrap();

    let loaded = store.find_tool(&ToolId::new("tool-a")).unwrap().unwrap();
    assert_eq!(loaded.total_flags, 5);
    assert!(!loaded.is_active);
    // Health fields are untouched by a flag update.
    assert_eq!(loaded.consecutive_failures, 2);
    assert_eq!(loaded.uptime_percent, 99.5);
}

#[test]
fn health_update_preserves_flags_and_stake() {
    let (_dir, store, _path) = temp_store();
    let mut record = tool("tool-a");
    record.total_flags = 3;
    store.insert_tool(&record).unwrap();

    store
        .update_health(
            &ToolId::new("tool-a"),
            &HealthUpdate {
                consecutive_failures: 1,
                uptime_percent: 89.55,
                last_health_check: Timestamp::from_unix_millis(NOW_MS),
                deactivate: false,
            },
        )
        .unwrap();

    let loaded = store.find_tool(&ToolId::new("tool-a")).unwrap().unwrap();
    assert_eq!(loaded.consecutive_failures, 1);
    assert_eq!(loaded.uptime_percent, 89.55);
    assert_eq!(loaded.last_health_check, Some(Timestamp::from_unix_millis(NOW_MS)));
    assert_eq!(loaded.total_flags, 3);
    assert_eq!(loaded.staked_amount, BigDecimal::from_str("12.5").unwrap());
}

#[test]
fn stake_update_can_reactivate_without_clearing_flags() {
    let (_dir, store, _path) = temp_store();
    let mut record = tool("tool-a");
    record.is_active = false;
    record.total_flags = 5;
    store.insert_tool(&record).unwrap();

    store
        .update_stake(
            &ToolId::new("tool-a"),
            &StakeUpdate {
                staked_amount: BigDecimal::from_str("150").unwrap(),
                activate: true,
            },
        )
        .unwrap();

    let loaded = store.find_tool(&ToolId::new("tool-a")).unwrap().unwrap();
    assert!(loaded.is_active);
    assert_eq!(loaded.staked_amount, BigDecimal::from_str("150").unwrap());
    assert_eq!(loaded.total_flags, 5);
}

#[test]
fn updating_unknown_tool_is_invalid() {
    let (_dir, store, _path) = temp_store();
    let err = store
        .update_flags(
            &ToolId::new("tool-missing"),
            &FlagUpdate {
                total_flags: 1,
                deactivate: false,
            },
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

#[test]
fn data_survives_reopen() {
    let (_dir, store, path) = temp_store();
    store.insert_tool(&tool("tool-a")).unwrap();
    let hash = tx_hash('a');
    store.insert_query(&query("tool-a", &hash)).unwrap();
    store.insert_report(&report("tool-a", &hash, "report-1")).unwrap();
    drop(store);

    let reopened = SqliteToolStore::new(&store_config(&path)).unwrap();
    assert!(reopened.find_tool(&ToolId::new("tool-a")).unwrap().is_some());
    assert!(reopened.find_query_by_transaction_hash(&hash).unwrap().is_some());
    assert_eq!(reopened.list_reports_for_tool(&ToolId::new("tool-a")).unwrap().len(), 1);
    reopened.readiness().unwrap();
}
