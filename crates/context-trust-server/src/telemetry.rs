// crates/context-trust-server/src/telemetry.rs
// ============================================================================
// Module: Server Telemetry
// Description: Request metrics seam for the trust server.
// Purpose: Let hosts observe endpoint traffic without binding a backend.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The server records one event per handled request: which endpoint, what
//! outcome, and how long it took. Hosts plug in their own sink through
//! [`TrustMetrics`]; the default [`NoopMetrics`] discards everything so
//! the handlers never pay for an unused backend.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// SECTION: Labels
// ============================================================================

/// Endpoint label for recorded requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `POST /disputes`.
    FileDispute,
    /// `GET /tools/{tool_id}/disputes`.
    ListDisputes,
    /// `POST /internal/health-run`.
    HealthRun,
    /// `POST /internal/stake-sync`.
    StakeSync,
    /// `GET /health`.
    Liveness,
}

impl Endpoint {
    /// Returns the stable metric label of the endpoint.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FileDispute => "file_dispute",
            Self::ListDisputes => "list_disputes",
            Self::HealthRun => "health_run",
            Self::StakeSync => "stake_sync",
            Self::Liveness => "liveness",
        }
    }
}

/// Outcome label for recorded requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The request was handled successfully.
    Ok,
    /// The request was rejected before reaching domain logic.
    Rejected,
    /// The request failed inside domain logic or the store.
    Failed,
}

impl Outcome {
    /// Returns the stable metric label of the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

/// One handled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestEvent {
    /// Endpoint that handled the request.
    pub endpoint: Endpoint,
    /// How the request ended.
    pub outcome: Outcome,
}

// ============================================================================
// SECTION: Sink
// ============================================================================

/// Metrics sink for handled requests.
pub trait TrustMetrics: Send + Sync {
    /// Records one handled request.
    fn record_request(&self, event: RequestEvent);

    /// Records request latency.
    fn record_latency(&self, event: RequestEvent, latency: Duration);
}

/// Metrics sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl TrustMetrics for NoopMetrics {
    fn record_request(&self, _event: RequestEvent) {}

    fn record_latency(&self, _event: RequestEvent, _latency: Duration) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
