// crates/context-trust-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Tool Store
// Description: Durable ToolStore backed by SQLite WAL.
// Purpose: Persist tools, invocation records, and disputes across restarts.
// Dependencies: context-trust-core, rusqlite, bigdecimal, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`ToolStore`] using `SQLite`. Records map
//! to three tables: `tools`, `queries`, and `reports`. Decimal money fields
//! are stored as text and reparsed on load, JSON payloads as serialized
//! text, and enum fields as their stable wire labels. The
//! one-dispute-per-transaction-hash rule is a `UNIQUE` constraint on
//! `reports.transaction_hash`, surfaced as a conflict error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

use bigdecimal::BigDecimal;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use context_trust_core::DisputeReason;
use context_trust_core::DisputeStatus;
use context_trust_core::FlagUpdate;
use context_trust_core::HealthUpdate;
use context_trust_core::PaymentProof;
use context_trust_core::QueryId;
use context_trust_core::QueryStatus;
use context_trust_core::ReportId;
use context_trust_core::SchemaViolation;
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

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` tool store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteToolStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding raw invocation outputs.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored data failed to parse back into a record.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// A uniqueness constraint was violated.
    #[error("sqlite store conflict: {0}")]
    Conflict(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) | SqliteStoreError::Invalid(message) => {
                Self::Invalid(message)
            }
            SqliteStoreError::Conflict(message) => Self::Conflict(message),
        }
    }
}

/// Maps a `rusqlite` error, classifying uniqueness violations as conflicts.
fn map_db_error(err: &rusqlite::Error) -> SqliteStoreError {
    if let rusqlite::Error::SqliteFailure(failure, _) = err
        && failure.code == ErrorCode::ConstraintViolation
    {
        return SqliteStoreError::Conflict(err.to_string());
    }
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed tool store with WAL support.
///
/// # Invariants
/// - Connection access is serialized through a mutex.
/// - `reports.transaction_hash` carries a `UNIQUE` constraint.
pub struct SqliteToolStore {
    /// Shared connection guarded by a mutex.
    connection: Mutex<Connection>,
}

impl SqliteToolStore {
    /// Opens an `SQLite`-backed tool store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteToolStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Locks the connection, mapping mutex poisoning to a store error.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite mutex poisoned".to_string()))
    }

    /// Runs a tool query returning zero or more records.
    fn query_tools(&self, sql: &str) -> Result<Vec<ToolRecord>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut stmt = guard.prepare(sql).map_err(|err| map_db_error(&err))?;
        let rows = stmt
            .query_map([], tool_row)
            .map_err(|err| map_db_error(&err))?;
        let mut tools = Vec::new();
        for row in rows {
            let raw = row.map_err(|err| map_db_error(&err))?;
            tools.push(build_tool_record(raw)?);
        }
        Ok(tools)
    }
}

impl ToolStore for SqliteToolStore {
    fn find_tool(&self, tool_id: &ToolId) -> Result<Option<ToolRecord>, StoreError> {
        let raw = {
            let guard = self.lock()?;
            guard
                .query_row(
                    "SELECT tool_id, name, price_per_query, payout_address, schema_json, \
                     is_active, is_verified, total_queries, total_flags, staked_amount, \
                     consecutive_failures, uptime_percent, last_health_check \
                     FROM tools WHERE tool_id = ?1",
                    params![tool_id.as_str()],
                    tool_row,
                )
                .optional()
                .map_err(|err| map_db_error(&err))?
        };
        raw.map(build_tool_record)
            .transpose()
            .map_err(StoreError::from)
    }

    fn list_tools(&self) -> Result<Vec<ToolRecord>, StoreError> {
        self.query_tools(
            "SELECT tool_id, name, price_per_query, payout_address, schema_json, is_active, \
             is_verified, total_queries, total_flags, staked_amount, consecutive_failures, \
             uptime_percent, last_health_check FROM tools ORDER BY tool_id",
        )
        .map_err(StoreError::from)
    }

    fn list_active_tools(&self) -> Result<Vec<ToolRecord>, StoreError> {
        self.query_tools(
            "SELECT tool_id, name, price_per_query, payout_address, schema_json, is_active, \
             is_verified, total_queries, total_flags, staked_amount, consecutive_failures, \
             uptime_percent, last_health_check FROM tools WHERE is_active = 1 ORDER BY tool_id",
        )
        .map_err(StoreError::from)
    }

    fn insert_tool(&self, record: &ToolRecord) -> Result<(), StoreError> {
        let schema_json = serde_json::to_string(&record.schema)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO tools (tool_id, name, price_per_query, payout_address, schema_json, \
                 is_active, is_verified, total_queries, total_flags, staked_amount, \
                 consecutive_failures, uptime_percent, last_health_check) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    record.tool_id.as_str(),
                    record.name,
                    record.price_per_query.to_string(),
                    record.payout_address,
                    schema_json,
                    record.is_active,
                    record.is_verified,
                    i64::try_from(record.total_queries).unwrap_or(i64::MAX),
                    i64::from(record.total_flags),
                    record.staked_amount.to_string(),
                    i64::from(record.consecutive_failures),
                    record.uptime_percent,
                    record.last_health_check.map(Timestamp::unix_millis),
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn find_query_by_transaction_hash(
        &self,
        hash: &TransactionHash,
    ) -> Result<Option<ToolQuery>, StoreError> {
        let raw = {
            let guard = self.lock()?;
            guard
                .query_row(
                    "SELECT query_id, tool_id, user_id, payment, output_json, status, \
                     executed_at FROM queries WHERE payment = ?1",
                    params![hash.as_str()],
                    query_row,
                )
                .optional()
                .map_err(|err| map_db_error(&err))?
        };
        raw.map(build_query_record)
            .transpose()
            .map_err(StoreError::from)
    }

    fn insert_query(&self, query: &ToolQuery) -> Result<(), StoreError> {
        let output_json = serde_json::to_string(&query.output)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO queries (query_id, tool_id, user_id, payment, output_json, status, \
                 executed_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    query.query_id.as_str(),
                    query.tool_id.as_str(),
                    query.user_id.as_str(),
                    query.payment.as_str(),
                    output_json,
                    query_status_label(query.status),
                    query.executed_at.unix_millis(),
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn report_exists_for_transaction(&self, hash: &TransactionHash) -> Result<bool, StoreError> {
        let guard = self.lock()?;
        let count: i64 = guard
            .query_row(
                "SELECT COUNT(1) FROM reports WHERE transaction_hash = ?1",
                params![hash.as_str()],
                |row| row.get(0),
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(count > 0)
    }

    fn insert_report(&self, report: &ToolReport) -> Result<(), StoreError> {
        let schema_errors_json = serde_json::to_string(&report.schema_errors)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO reports (report_id, tool_id, reporter_id, transaction_hash, \
                 query_id, reason, details, verdict, adjudication_note, schema_errors_json, \
                 status, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    report.report_id.as_str(),
                    report.tool_id.as_str(),
                    report.reporter_id.as_str(),
                    report.transaction_hash.as_str(),
                    report.query_id.as_str(),
                    report.reason.as_str(),
                    report.details,
                    report.verdict.as_str(),
                    report.adjudication_note,
                    schema_errors_json,
                    dispute_status_label(report.status),
                    report.created_at.unix_millis(),
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn list_reports_for_tool(&self, tool_id: &ToolId) -> Result<Vec<ToolReport>, StoreError> {
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare(
                "SELECT report_id, tool_id, reporter_id, transaction_hash, query_id, reason, \
                 details, verdict, adjudication_note, schema_errors_json, status, created_at \
                 FROM reports WHERE tool_id = ?1 ORDER BY created_at DESC, report_id",
            )
            .map_err(|err| map_db_error(&err))?;
        let rows = stmt
            .query_map(params![tool_id.as_str()], report_row)
            .map_err(|err| map_db_error(&err))?;
        let mut reports = Vec::new();
        for row in rows {
            let raw = row.map_err(|err| map_db_error(&err))?;
            reports.push(build_report_record(raw)?);
        }
        Ok(reports)
    }

    fn update_flags(&self, tool_id: &ToolId, update: &FlagUpdate) -> Result<(), StoreError> {
        let guard = self.lock()?;
        let changed = guard
            .execute(
                "UPDATE tools SET total_flags = ?1, \
                 is_active = CASE WHEN ?2 THEN 0 ELSE is_active END \
                 WHERE tool_id = ?3",
                params![i64::from(update.total_flags), update.deactivate, tool_id.as_str()],
            )
            .map_err(|err| map_db_error(&err))?;
        ensure_tool_updated(changed, tool_id)
    }

    fn update_health(&self, tool_id: &ToolId, update: &HealthUpdate) -> Result<(), StoreError> {
        let guard = self.lock()?;
        let changed = guard
            .execute(
                "UPDATE tools SET consecutive_failures = ?1, uptime_percent = ?2, \
                 last_health_check = ?3, \
                 is_active = CASE WHEN ?4 THEN 0 ELSE is_active END \
                 WHERE tool_id = ?5",
                params![
                    i64::from(update.consecutive_failures),
                    update.uptime_percent,
                    update.last_health_check.unix_millis(),
                    update.deactivate,
                    tool_id.as_str(),
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        ensure_tool_updated(changed, tool_id)
    }

    fn update_stake(&self, tool_id: &ToolId, update: &StakeUpdate) -> Result<(), StoreError> {
        let guard = self.lock()?;
        let changed = guard
            .execute(
                "UPDATE tools SET staked_amount = ?1, \
                 is_active = CASE WHEN ?2 THEN 1 ELSE is_active END \
                 WHERE tool_id = ?3",
                params![update.staked_amount.to_string(), update.activate, tool_id.as_str()],
            )
            .map_err(|err| map_db_error(&err))?;
        ensure_tool_updated(changed, tool_id)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        let guard = self.lock()?;
        let _: i64 = guard
            .query_row("SELECT 1", [], |row| row.get(0))
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Raw tool row as read from `SQLite` before parsing typed fields.
type RawToolRow = (
    String,
    String,
    String,
    String,
    String,
    bool,
    bool,
    i64,
    i64,
    String,
    i64,
    f64,
    Option<i64>,
);

/// Extracts a raw tool row.
fn tool_row(row: &Row<'_>) -> rusqlite::Result<RawToolRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
    ))
}

/// Parses a raw tool row into a [`ToolRecord`].
fn build_tool_record(raw: RawToolRow) -> Result<ToolRecord, SqliteStoreError> {
    let (
        tool_id,
        name,
        price,
        payout_address,
        schema_json,
        is_active,
        is_verified,
        total_queries,
        total_flags,
        staked,
        consecutive_failures,
        uptime_percent,
        last_health_check,
    ) = raw;
    let schema: ToolSchema = serde_json::from_str(&schema_json)
        .map_err(|err| SqliteStoreError::Corrupt(format!("tool schema: {err}")))?;
    Ok(ToolRecord {
        tool_id: ToolId::new(tool_id),
        name,
        price_per_query: parse_decimal(&price, "price_per_query")?,
        payout_address,
        schema,
        is_active,
        is_verified,
        total_queries: u64::try_from(total_queries)
            .map_err(|_| SqliteStoreError::Corrupt("negative total_queries".to_string()))?,
        total_flags: u32::try_from(total_flags)
            .map_err(|_| SqliteStoreError::Corrupt("total_flags out of range".to_string()))?,
        staked_amount: parse_decimal(&staked, "staked_amount")?,
        consecutive_failures: u32::try_from(consecutive_failures).map_err(|_| {
            SqliteStoreError::Corrupt("consecutive_failures out of range".to_string())
        })?,
        uptime_percent,
        last_health_check: last_health_check.map(Timestamp::from_unix_millis),
    })
}

/// Raw invocation row as read from `SQLite`.
type RawQueryRow = (String, String, String, String, String, String, i64);

/// Extracts a raw invocation row.
fn query_row(row: &Row<'_>) -> rusqlite::Result<RawQueryRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

/// Parses a raw invocation row into a [`ToolQuery`].
fn build_query_record(raw: RawQueryRow) -> Result<ToolQuery, SqliteStoreError> {
    let (query_id, tool_id, user_id, payment, output_json, status, executed_at) = raw;
    let payment = PaymentProof::try_from(payment)
        .map_err(|err| SqliteStoreError::Corrupt(format!("payment proof: {err}")))?;
    let output: Value = serde_json::from_str(&output_json)
        .map_err(|err| SqliteStoreError::Corrupt(format!("query output: {err}")))?;
    Ok(ToolQuery {
        query_id: QueryId::new(query_id),
        tool_id: ToolId::new(tool_id),
        user_id: UserId::new(user_id),
        payment,
        output,
        status: parse_query_status(&status)?,
        executed_at: Timestamp::from_unix_millis(executed_at),
    })
}

/// Raw dispute row as read from `SQLite`.
type RawReportRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    String,
    String,
    String,
    i64,
);

/// Extracts a raw dispute row.
fn report_row(row: &Row<'_>) -> rusqlite::Result<RawReportRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
    ))
}

/// Parses a raw dispute row into a [`ToolReport`].
fn build_report_record(raw: RawReportRow) -> Result<ToolReport, SqliteStoreError> {
    let (
        report_id,
        tool_id,
        reporter_id,
        transaction_hash,
        query_id,
        reason,
        details,
        verdict,
        adjudication_note,
        schema_errors_json,
        status,
        created_at,
    ) = raw;
    let transaction_hash = TransactionHash::parse(&transaction_hash)
        .map_err(|err| SqliteStoreError::Corrupt(format!("transaction hash: {err}")))?;
    let schema_errors: Vec<SchemaViolation> = serde_json::from_str(&schema_errors_json)
        .map_err(|err| SqliteStoreError::Corrupt(format!("schema errors: {err}")))?;
    Ok(ToolReport {
        report_id: ReportId::new(report_id),
        tool_id: ToolId::new(tool_id),
        reporter_id: UserId::new(reporter_id),
        transaction_hash,
        query_id: QueryId::new(query_id),
        reason: parse_reason(&reason)?,
        details,
        verdict: parse_verdict(&verdict)?,
        adjudication_note,
        schema_errors,
        status: parse_dispute_status(&status)?,
        created_at: Timestamp::from_unix_millis(created_at),
    })
}

// ============================================================================
// SECTION: Label Helpers
// ============================================================================

/// Parses a stored decimal column.
fn parse_decimal(raw: &str, column: &str) -> Result<BigDecimal, SqliteStoreError> {
    BigDecimal::from_str(raw)
        .map_err(|err| SqliteStoreError::Corrupt(format!("{column}: {err}")))
}

/// Returns the stable label of an invocation status.
const fn query_status_label(status: QueryStatus) -> &'static str {
    match status {
        QueryStatus::Completed => "completed",
        QueryStatus::Failed => "failed",
    }
}

/// Parses a stored invocation status label.
fn parse_query_status(label: &str) -> Result<QueryStatus, SqliteStoreError> {
    match label {
        "completed" => Ok(QueryStatus::Completed),
        "failed" => Ok(QueryStatus::Failed),
        other => Err(SqliteStoreError::Corrupt(format!("unknown query status: {other}"))),
    }
}

/// Returns the stable label of a dispute status.
const fn dispute_status_label(status: DisputeStatus) -> &'static str {
    match status {
        DisputeStatus::Pending => "pending",
        DisputeStatus::Resolved => "resolved",
    }
}

/// Parses a stored dispute status label.
fn parse_dispute_status(label: &str) -> Result<DisputeStatus, SqliteStoreError> {
    match label {
        "pending" => Ok(DisputeStatus::Pending),
        "resolved" => Ok(DisputeStatus::Resolved),
        other => Err(SqliteStoreError::Corrupt(format!("unknown dispute status: {other}"))),
    }
}

/// Parses a stored dispute reason label.
fn parse_reason(label: &str) -> Result<DisputeReason, SqliteStoreError> {
    match label {
        "schema_mismatch" => Ok(DisputeReason::SchemaMismatch),
        "execution_error" => Ok(DisputeReason::ExecutionError),
        "malicious_content" => Ok(DisputeReason::MaliciousContent),
        "data_fabrication" => Ok(DisputeReason::DataFabrication),
        other => Err(SqliteStoreError::Corrupt(format!("unknown dispute reason: {other}"))),
    }
}

/// Parses a stored verdict label.
fn parse_verdict(label: &str) -> Result<Verdict, SqliteStoreError> {
    match label {
        "pending" => Ok(Verdict::Pending),
        "innocent" => Ok(Verdict::Innocent),
        "guilty" => Ok(Verdict::Guilty),
        "manual_review" => Ok(Verdict::ManualReview),
        other => Err(SqliteStoreError::Corrupt(format!("unknown verdict: {other}"))),
    }
}

/// Maps update row counts to an unknown-tool error when nothing changed.
fn ensure_tool_updated(changed: usize, tool_id: &ToolId) -> Result<(), StoreError> {
    if changed == 0 {
        return Err(StoreError::Invalid(format!("unknown tool: {}", tool_id.as_str())));
    }
    Ok(())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with durability pragmas applied.
fn open_connection(config: &SqliteToolStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(connection)
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS tools (
                    tool_id TEXT NOT NULL PRIMARY KEY,
                    name TEXT NOT NULL,
                    price_per_query TEXT NOT NULL,
                    payout_address TEXT NOT NULL,
                    schema_json TEXT NOT NULL,
                    is_active INTEGER NOT NULL,
                    is_verified INTEGER NOT NULL,
                    total_queries INTEGER NOT NULL,
                    total_flags INTEGER NOT NULL,
                    staked_amount TEXT NOT NULL,
                    consecutive_failures INTEGER NOT NULL,
                    uptime_percent REAL NOT NULL,
                    last_health_check INTEGER
                );
                CREATE TABLE IF NOT EXISTS queries (
                    query_id TEXT NOT NULL PRIMARY KEY,
                    tool_id TEXT NOT NULL,
                    user_id TEXT NOT NULL,
                    payment TEXT NOT NULL,
                    output_json TEXT NOT NULL,
                    status TEXT NOT NULL,
                    executed_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_queries_payment
                    ON queries (payment);
                CREATE TABLE IF NOT EXISTS reports (
                    report_id TEXT NOT NULL PRIMARY KEY,
                    tool_id TEXT NOT NULL,
                    reporter_id TEXT NOT NULL,
                    transaction_hash TEXT NOT NULL UNIQUE,
                    query_id TEXT NOT NULL,
                    reason TEXT NOT NULL,
                    details TEXT,
                    verdict TEXT NOT NULL,
                    adjudication_note TEXT NOT NULL,
                    schema_errors_json TEXT NOT NULL,
                    status TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_reports_tool
                    ON reports (tool_id, created_at);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}
