// crates/context-trust-monitor/src/probe.rs
// ============================================================================
// Module: Liveness Probes
// Description: Single-endpoint liveness checks with bounded timeouts.
// Purpose: Classify tool endpoints as alive or unhealthy per protocol.
// Dependencies: crate::endpoint, reqwest, serde_json
// ============================================================================

//! ## Overview
//! A probe issues exactly one request per tool using the tool's declared
//! protocol handshake: a plain JSON ping for HTTP tools, a JSON-RPC
//! `initialize` envelope for MCP servers. An endpoint that answers at all in
//! a way consistent with the protocol counts as alive; rejecting our request
//! shape (400/405/406) still proves the service is up. Anything else,
//! including timeouts and connect errors, is unhealthy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use reqwest::Client;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde_json::json;
use thiserror::Error;

use crate::endpoint::ProbeProtocol;
use crate::endpoint::ProbeTarget;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Hard timeout applied to every probe request.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(15);
/// Accept header required by MCP streamable-HTTP servers.
const MCP_ACCEPT: &str = "application/json, text/event-stream";
/// MCP protocol version sent in the initialize envelope.
const MCP_PROTOCOL_VERSION: &str = "2025-03-26";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Probe construction errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The HTTP client could not be built.
    #[error("probe client build failed: {0}")]
    ClientBuild(String),
}

/// Outcome of one liveness probe.
///
/// # Invariants
/// - `Alive` carries the observed status code for telemetry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The endpoint answered consistently with its protocol.
    Alive(u16),
    /// The endpoint answered with an unexpected status.
    BadStatus(u16),
    /// The request failed (connect error, TLS failure, timeout).
    Unreachable(String),
}

impl ProbeOutcome {
    /// Returns whether the outcome counts as a healthy probe.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Alive(_))
    }
}

/// Bounded HTTP client for liveness probes.
///
/// # Invariants
/// - Every request carries the hard probe timeout.
/// - One probe issues exactly one request; redirects are followed by the
///   underlying client but count toward the same timeout.
#[derive(Debug, Clone)]
pub struct ProbeClient {
    /// Shared HTTP client.
    client: Client,
}

impl ProbeClient {
    /// Creates a probe client with the hard probe timeout applied.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the HTTP client cannot be built.
    pub fn new() -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(PROBE_TIMEOUT)
            .user_agent("context-trust-prober/0.1")
            .build()
            .map_err(|err| ProbeError::ClientBuild(err.to_string()))?;
        Ok(Self {
            client,
        })
    }

    /// Probes one endpoint with the protocol-appropriate handshake.
    pub async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome {
        let request = match target.protocol {
            ProbeProtocol::Http => self
                .client
                .post(target.url.clone())
                .header(ACCEPT, "application/json")
                .json(&json!({ "ping": true })),
            ProbeProtocol::Mcp => self
                .client
                .post(target.url.clone())
                .header(ACCEPT, MCP_ACCEPT)
                .json(&initialize_envelope()),
        };
        match request.send().await {
            Ok(response) => classify_status(response.status()),
            Err(err) => ProbeOutcome::Unreachable(err.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the JSON-RPC initialize envelope for MCP probes.
fn initialize_envelope() -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "context-trust-prober",
                "version": "0.1.0"
            }
        }
    })
}

/// Classifies a response status into a probe outcome.
///
/// 2xx/3xx and the request-shape rejections 400/405/406 count as alive;
/// everything else is a bad status.
fn classify_status(status: StatusCode) -> ProbeOutcome {
    let code = status.as_u16();
    if status.is_success() || status.is_redirection() || matches!(code, 400 | 405 | 406) {
        ProbeOutcome::Alive(code)
    } else {
        ProbeOutcome::BadStatus(code)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
