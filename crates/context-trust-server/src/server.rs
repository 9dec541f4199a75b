// crates/context-trust-server/src/server.rs
// ============================================================================
// Module: Trust Server
// Description: HTTP surface for disputes, listings, and scheduler runs.
// Purpose: Wire the ledger, prober, and reconciler behind an axum router.
// Dependencies: axum, context-trust-core, context-trust-monitor, tokio
// ============================================================================

//! ## Overview
//! Five routes cover the whole surface: dispute filing, redacted dispute
//! listing, the two secret-gated scheduler entry points, and liveness.
//! Handlers translate domain errors into HTTP statuses and never leak
//! internal detail beyond the documented error strings. The scheduler
//! endpoints verify the bearer secret before touching the store, so an
//! unauthorized call has no side effects.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::routing::get;
use axum::routing::post;
use context_trust_core::Clock;
use context_trust_core::DisputeError;
use context_trust_core::DisputeReason;
use context_trust_core::DisputeRequest;
use context_trust_core::DisputeStatus;
use context_trust_core::FraudProofError;
use context_trust_core::InMemoryToolStore;
use context_trust_core::ReportId;
use context_trust_core::SchemaViolation;
use context_trust_core::StakeOracle;
use context_trust_core::SystemClock;
use context_trust_core::Timestamp;
use context_trust_core::ToolId;
use context_trust_core::ToolReport;
use context_trust_core::ToolStore;
use context_trust_core::TransactionHash;
use context_trust_core::UserId;
use context_trust_core::Verdict;
use context_trust_core::file_dispute;
use context_trust_core::list_disputes;
use context_trust_monitor::EvmStakeOracle;
use context_trust_monitor::HealthProber;
use context_trust_monitor::HealthProberConfig;
use context_trust_monitor::ProbePolicy;
use context_trust_monitor::StakeReconciler;
use context_trust_monitor::StakeReconcilerConfig;
use context_trust_store_sqlite::SqliteToolStore;
use context_trust_store_sqlite::SqliteToolStoreConfig;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::auth::verify_scheduler_secret;
use crate::config::StoreKind;
use crate::config::TrustServerConfig;
use crate::telemetry::Endpoint;
use crate::telemetry::NoopMetrics;
use crate::telemetry::Outcome;
use crate::telemetry::RequestEvent;
use crate::telemetry::TrustMetrics;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while constructing or serving the trust server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    /// A component failed to initialize.
    #[error("server init error: {0}")]
    Init(String),
    /// The listener failed to bind or serve.
    #[error("server transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared state behind every handler.
pub struct ServerState {
    /// Tool, query, and report persistence.
    store: Arc<dyn ToolStore>,
    /// Time source for dispute-window checks.
    clock: Arc<dyn Clock>,
    /// Health prober driven by the scheduler.
    prober: HealthProber,
    /// Stake reconciler driven by the scheduler.
    reconciler: StakeReconciler,
    /// Shared secret for the internal endpoints.
    scheduler_secret: String,
    /// Request metrics sink.
    metrics: Arc<dyn TrustMetrics>,
}

impl ServerState {
    /// Builds server state from pre-constructed components.
    #[must_use]
    pub fn new(
        store: Arc<dyn ToolStore>,
        clock: Arc<dyn Clock>,
        prober: HealthProber,
        reconciler: StakeReconciler,
        scheduler_secret: String,
        metrics: Arc<dyn TrustMetrics>,
    ) -> Self {
        Self {
            store,
            clock,
            prober,
            reconciler,
            scheduler_secret,
            metrics,
        }
    }

    /// Records one handled request with its latency.
    fn observe(&self, endpoint: Endpoint, outcome: Outcome, started: Instant) {
        let event = RequestEvent { endpoint, outcome };
        self.metrics.record_request(event);
        self.metrics.record_latency(event, started.elapsed());
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// The trust server: a configured router plus its bind address.
pub struct TrustServer {
    /// Address to bind.
    bind: String,
    /// Shared handler state.
    state: Arc<ServerState>,
}

impl TrustServer {
    /// Builds a server from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration is invalid or a
    /// component fails to initialize.
    pub fn from_config(config: &TrustServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let store = build_store(config)?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let prober = HealthProber::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            HealthProberConfig {
                batch_size: config.prober.batch_size,
                policy: ProbePolicy {
                    allow_private_hosts: config.prober.allow_private_hosts,
                },
            },
        )
        .map_err(|err| ServerError::Init(err.to_string()))?;
        let oracle = match config.oracle_config() {
            Some(oracle_config) => {
                let oracle = EvmStakeOracle::new(&oracle_config)
                    .map_err(|err| ServerError::Init(err.to_string()))?;
                let oracle: Arc<dyn StakeOracle> = Arc::new(oracle);
                Some(oracle)
            }
            None => None,
        };
        let reconciler = StakeReconciler::new(
            Arc::clone(&store),
            oracle,
            StakeReconcilerConfig {
                price_floor: config.price_floor()?,
            },
        );
        let metrics: Arc<dyn TrustMetrics> = Arc::new(NoopMetrics);
        let state = Arc::new(ServerState::new(
            store,
            clock,
            prober,
            reconciler,
            config.server.scheduler_secret.clone(),
            metrics,
        ));
        Ok(Self {
            bind: config.server.bind.clone(),
            state,
        })
    }

    /// Returns the configured router for this server.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.state))
    }

    /// Binds the listener and serves until the process exits.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(&self.bind)
            .await
            .map_err(|err| ServerError::Transport(err.to_string()))?;
        let router = build_router(self.state);
        axum::serve(listener, router)
            .await
            .map_err(|err| ServerError::Transport(err.to_string()))
    }
}

/// Builds the backing store named by configuration.
fn build_store(config: &TrustServerConfig) -> Result<Arc<dyn ToolStore>, ServerError> {
    match config.store.kind {
        StoreKind::Memory => Ok(Arc::new(InMemoryToolStore::new())),
        StoreKind::Sqlite => {
            let path = config.store.path.clone().ok_or_else(|| {
                ServerError::Init("store.path is required for the sqlite backend".to_string())
            })?;
            let store = SqliteToolStore::new(&SqliteToolStoreConfig {
                path,
                busy_timeout_ms: config.store.busy_timeout_ms,
                journal_mode: config.store.journal_mode,
                sync_mode: config.store.sync_mode,
            })
            .map_err(|err| ServerError::Init(err.to_string()))?;
            Ok(Arc::new(store))
        }
    }
}

/// Builds the route table over shared state.
fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/disputes", post(handle_file_dispute))
        .route("/tools/{tool_id}/disputes", get(handle_list_disputes))
        .route("/internal/health-run", post(handle_health_run))
        .route("/internal/stake-sync", post(handle_stake_sync))
        .route("/health", get(handle_liveness))
        .with_state(state)
}

// ============================================================================
// SECTION: Request Bodies
// ============================================================================

/// Wire body for `POST /disputes`.
///
/// # Invariants
/// - `transaction_hash` and `reason` are validated during deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisputeBody {
    /// Disputed tool.
    pub tool_id: String,
    /// Reporting user.
    pub reporter_id: String,
    /// Cited fraud proof.
    pub transaction_hash: TransactionHash,
    /// Cited reason.
    pub reason: DisputeReason,
    /// Optional free-text details.
    #[serde(default)]
    pub details: Option<String>,
    /// Invoked sub-tool name for MCP listings.
    #[serde(default)]
    pub tool_name: Option<String>,
}

impl DisputeBody {
    /// Converts the wire body into a validated ledger request.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message when an identifier is blank.
    fn into_request(self) -> Result<DisputeRequest, String> {
        if self.tool_id.trim().is_empty() {
            return Err("tool_id must not be empty".to_string());
        }
        if self.reporter_id.trim().is_empty() {
            return Err("reporter_id must not be empty".to_string());
        }
        Ok(DisputeRequest {
            tool_id: ToolId::new(self.tool_id),
            reporter_id: UserId::new(self.reporter_id),
            transaction_hash: self.transaction_hash,
            reason: self.reason,
            details: self.details,
            tool_name: self.tool_name,
        })
    }
}

/// Filing response view of a report.
///
/// The wire shape carries only the adjudication result; the identifiers
/// the disputant supplied (`transaction_hash`, `reporter_id`) and the
/// matched invocation are not echoed back, and the shape stays stable if
/// the stored report grows fields.
#[derive(Debug, Clone, Serialize)]
pub struct FiledDispute {
    /// Report identifier.
    pub report_id: ReportId,
    /// Disputed tool.
    pub tool_id: ToolId,
    /// Cited reason.
    pub reason: DisputeReason,
    /// Rendered verdict.
    pub verdict: Verdict,
    /// Short adjudication note explaining the verdict.
    pub adjudication_note: String,
    /// Structured schema-validation errors, when applicable.
    pub schema_errors: Vec<SchemaViolation>,
    /// Processing status.
    pub status: DisputeStatus,
    /// Filing timestamp.
    pub created_at: Timestamp,
}

impl From<ToolReport> for FiledDispute {
    fn from(report: ToolReport) -> Self {
        Self {
            report_id: report.report_id,
            tool_id: report.tool_id,
            reason: report.reason,
            verdict: report.verdict,
            adjudication_note: report.adjudication_note,
            schema_errors: report.schema_errors,
            status: report.status,
            created_at: report.created_at,
        }
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Shorthand for the uniform handler response shape.
type HandlerResponse = (StatusCode, Json<Value>);

/// Builds the uniform error body.
fn error_body(message: &str) -> Json<Value> {
    Json(json!({ "error": message }))
}

/// Files a dispute against a tool.
///
/// Statuses: 201 filed, 400 invalid input, 403 rejected fraud proof,
/// 404 unknown tool, 409 duplicate proof, 500 store failure.
pub async fn handle_file_dispute(
    State(state): State<Arc<ServerState>>,
    payload: Option<Json<Value>>,
) -> HandlerResponse {
    let started = Instant::now();
    let Some(Json(raw)) = payload else {
        state.observe(Endpoint::FileDispute, Outcome::Rejected, started);
        return (StatusCode::BAD_REQUEST, error_body("request body must be JSON"));
    };
    let body: DisputeBody = match serde_json::from_value(raw) {
        Ok(body) => body,
        Err(err) => {
            state.observe(Endpoint::FileDispute, Outcome::Rejected, started);
            return (StatusCode::BAD_REQUEST, error_body(&err.to_string()));
        }
    };
    let request = match body.into_request() {
        Ok(request) => request,
        Err(message) => {
            state.observe(Endpoint::FileDispute, Outcome::Rejected, started);
            return (StatusCode::BAD_REQUEST, error_body(&message));
        }
    };
    match file_dispute(state.store.as_ref(), state.clock.as_ref(), &request) {
        Ok(outcome) => {
            state.observe(Endpoint::FileDispute, Outcome::Ok, started);
            (
                StatusCode::CREATED,
                Json(json!({
                    "dispute": FiledDispute::from(outcome.report),
                    "tool_status": outcome.tool_status,
                })),
            )
        }
        Err(err) => {
            let (status, outcome) = dispute_error_status(&err);
            state.observe(Endpoint::FileDispute, outcome, started);
            (status, error_body(&err.to_string()))
        }
    }
}

/// Maps a dispute error onto its HTTP status and metric outcome.
fn dispute_error_status(err: &DisputeError) -> (StatusCode, Outcome) {
    match err {
        DisputeError::UnknownTool(_) => (StatusCode::NOT_FOUND, Outcome::Rejected),
        DisputeError::FraudProof(FraudProofError::Duplicate) => {
            (StatusCode::CONFLICT, Outcome::Rejected)
        }
        DisputeError::FraudProof(FraudProofError::Store(_)) | DisputeError::Store(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Outcome::Failed)
        }
        DisputeError::FraudProof(_) => (StatusCode::FORBIDDEN, Outcome::Rejected),
    }
}

/// Lists a tool's disputes in redacted form.
///
/// Statuses: 200 listing, 404 unknown tool, 500 store failure.
pub async fn handle_list_disputes(
    State(state): State<Arc<ServerState>>,
    Path(tool_id): Path<String>,
) -> HandlerResponse {
    let started = Instant::now();
    let tool_id = ToolId::new(tool_id);
    match list_disputes(state.store.as_ref(), &tool_id) {
        Ok(view) => {
            state.observe(Endpoint::ListDisputes, Outcome::Ok, started);
            (StatusCode::OK, Json(json!(view)))
        }
        Err(DisputeError::UnknownTool(id)) => {
            state.observe(Endpoint::ListDisputes, Outcome::Rejected, started);
            (StatusCode::NOT_FOUND, error_body(&format!("unknown tool: {id}")))
        }
        Err(err) => {
            state.observe(Endpoint::ListDisputes, Outcome::Failed, started);
            (StatusCode::INTERNAL_SERVER_ERROR, error_body(&err.to_string()))
        }
    }
}

/// Runs a scheduler-driven health pass over all active tools.
///
/// Statuses: 200 run summary, 401 bad secret (no side effects), 500
/// store failure.
pub async fn handle_health_run(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> HandlerResponse {
    let started = Instant::now();
    if !verify_scheduler_secret(&headers, &state.scheduler_secret) {
        state.observe(Endpoint::HealthRun, Outcome::Rejected, started);
        return (StatusCode::UNAUTHORIZED, error_body("unauthorized"));
    }
    match state.prober.run().await {
        Ok(summary) => {
            state.observe(Endpoint::HealthRun, Outcome::Ok, started);
            (StatusCode::OK, Json(json!(summary)))
        }
        Err(err) => {
            state.observe(Endpoint::HealthRun, Outcome::Failed, started);
            (StatusCode::INTERNAL_SERVER_ERROR, error_body(&err.to_string()))
        }
    }
}

/// Runs a scheduler-driven stake reconciliation pass.
///
/// Statuses: 200 run summary (skipped runs included), 401 bad secret
/// (no side effects), 500 store failure.
pub async fn handle_stake_sync(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> HandlerResponse {
    let started = Instant::now();
    if !verify_scheduler_secret(&headers, &state.scheduler_secret) {
        state.observe(Endpoint::StakeSync, Outcome::Rejected, started);
        return (StatusCode::UNAUTHORIZED, error_body("unauthorized"));
    }
    match state.reconciler.run().await {
        Ok(summary) => {
            state.observe(Endpoint::StakeSync, Outcome::Ok, started);
            (StatusCode::OK, Json(json!(summary)))
        }
        Err(err) => {
            state.observe(Endpoint::StakeSync, Outcome::Failed, started);
            (StatusCode::INTERNAL_SERVER_ERROR, error_body(&err.to_string()))
        }
    }
}

/// Reports process liveness.
pub async fn handle_liveness(State(state): State<Arc<ServerState>>) -> HandlerResponse {
    let started = Instant::now();
    state.observe(Endpoint::Liveness, Outcome::Ok, started);
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
