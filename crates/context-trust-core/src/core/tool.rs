// crates/context-trust-core/src/core/tool.rs
// ============================================================================
// Module: Tool Records
// Description: Marketplace tool listings, schemas, and economic rules.
// Purpose: Model the long-lived aggregate mutated by all trust subsystems.
// Dependencies: serde, serde_json, bigdecimal, sha2
// ============================================================================

//! ## Overview
//! A [`ToolRecord`] is the long-lived aggregate of the trust engine. The
//! dispute ledger mutates its flag fields, the health prober its uptime and
//! failure fields, and the stake reconciler its stake fields. The declared
//! [`ToolSchema`] doubles as the invocation contract: it carries the probe
//! endpoint and, for MCP servers, the per-sub-tool output schemas the
//! adjudicator validates against.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;

use crate::core::identifiers::ToolId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Guilty-dispute count at which a tool is soft-slashed.
pub const FLAG_THRESHOLD: u32 = 5;
/// Consecutive health-check failures at which a tool is deactivated.
pub const FAILURE_THRESHOLD: u32 = 3;
/// Uptime score assigned to tools that have never been probed.
pub const DEFAULT_UPTIME_PERCENT: f64 = 100.0;
/// Multiplier applied to the per-query price for the required stake.
const STAKE_PRICE_MULTIPLIER: u64 = 100;
/// Absolute floor of the required stake in USD.
const STAKE_FLOOR_USD: u64 = 1;

// ============================================================================
// SECTION: Tool Schema
// ============================================================================

/// Named sub-tool exposed by an MCP server listing.
///
/// # Invariants
/// - `output_schema`, when present, is a JSON Schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTool {
    /// Sub-tool name used for invocation and adjudication lookup.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// Declared JSON Schema for the sub-tool output.
    #[serde(default)]
    pub output_schema: Option<Value>,
}

/// Machine-checkable schema of a tool listing.
///
/// # Invariants
/// - `kind` discriminates the invocation protocol on the wire.
/// - `endpoint` is the invocation and probe URL for both kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolSchema {
    /// Plain JSON-over-HTTP API.
    Http {
        /// Invocation endpoint URL.
        endpoint: String,
        /// Declared JSON Schema for the response payload.
        #[serde(default)]
        output_schema: Option<Value>,
    },
    /// MCP server exposing named sub-tools.
    Mcp {
        /// Server endpoint URL.
        endpoint: String,
        /// Named sub-tools with their output schemas.
        #[serde(default)]
        sub_tools: Vec<SubTool>,
    },
}

impl ToolSchema {
    /// Returns the probe/invocation endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Http { endpoint, .. } | Self::Mcp { endpoint, .. } => endpoint,
        }
    }

    /// Resolves the declared output schema for an invocation.
    ///
    /// For HTTP tools the sub-tool name is ignored. For MCP tools the
    /// sub-tool is selected by name; an unnamed lookup selects the first
    /// sub-tool in the list.
    #[must_use]
    pub fn output_schema_for(&self, sub_tool: Option<&str>) -> Option<&Value> {
        match self {
            Self::Http { output_schema, .. } => output_schema.as_ref(),
            Self::Mcp { sub_tools, .. } => {
                let entry = match sub_tool {
                    Some(name) => sub_tools.iter().find(|tool| tool.name == name),
                    None => sub_tools.first(),
                };
                entry.and_then(|tool| tool.output_schema.as_ref())
            }
        }
    }
}

// ============================================================================
// SECTION: Tool Record
// ============================================================================

/// Marketplace tool listing and its trust state.
///
/// # Invariants
/// - `is_active` flips to `false` automatically once
///   `consecutive_failures >= FAILURE_THRESHOLD` or
///   `total_flags >= FLAG_THRESHOLD`; it flips back to `true` only through
///   stake reconciliation meeting [`required_stake`].
/// - `uptime_percent` stays within `0.0..=100.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRecord {
    /// Tool identifier.
    pub tool_id: ToolId,
    /// Display name of the listing.
    pub name: String,
    /// Price per query in USD.
    pub price_per_query: BigDecimal,
    /// Developer payout address on the payment chain.
    pub payout_address: String,
    /// Declared invocation schema.
    pub schema: ToolSchema,
    /// Whether the tool is currently listed as active.
    pub is_active: bool,
    /// Whether the listing passed marketplace verification.
    pub is_verified: bool,
    /// Cumulative successful query count.
    pub total_queries: u64,
    /// Cumulative guilty-dispute flag count.
    pub total_flags: u32,
    /// Staked collateral in USD, as last reconciled from chain.
    pub staked_amount: BigDecimal,
    /// Consecutive failed health checks.
    pub consecutive_failures: u32,
    /// Smoothed uptime percentage.
    pub uptime_percent: f64,
    /// Timestamp of the last health check, when any.
    pub last_health_check: Option<Timestamp>,
}

// ============================================================================
// SECTION: Economic Rules
// ============================================================================

/// Returns the minimum stake a tool must hold to be activated.
///
/// The requirement is `max($1, 100 x price_per_query)`.
#[must_use]
pub fn required_stake(price_per_query: &BigDecimal) -> BigDecimal {
    let scaled = price_per_query * BigDecimal::from(STAKE_PRICE_MULTIPLIER);
    let floor = BigDecimal::from(STAKE_FLOOR_USD);
    if scaled > floor { scaled } else { floor }
}

/// Derives the deterministic on-chain key of a tool.
///
/// The key is the big-endian u64 taken from the first eight bytes of
/// `SHA-256(tool_id)`, matching the key derivation used when the listing was
/// registered with the router contract.
#[must_use]
pub fn onchain_tool_key(tool_id: &ToolId) -> u64 {
    let digest = Sha256::digest(tool_id.as_str().as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::missing_docs_in_private_items,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use serde_json::json;

    use super::SubTool;
    use super::ToolSchema;
    use super::onchain_tool_key;
    use super::required_stake;
    use crate::core::identifiers::ToolId;

    #[test]
    fn required_stake_floors_at_one_dollar() {
        let cheap = BigDecimal::from_str("0.001").unwrap();
        assert_eq!(required_stake(&cheap), BigDecimal::from_str("1").unwrap());
    }

    #[test]
    fn required_stake_scales_with_price() {
        let price = BigDecimal::from_str("0.10").unwrap();
        assert_eq!(required_stake(&price), BigDecimal::from_str("10.00").unwrap());
        let dollar = BigDecimal::from_str("1.00").unwrap();
        assert_eq!(required_stake(&dollar), BigDecimal::from_str("100.00").unwrap());
    }

    #[test]
    fn onchain_key_is_deterministic() {
        let id = ToolId::new("tool-weather");
        assert_eq!(onchain_tool_key(&id), onchain_tool_key(&id));
        assert_ne!(onchain_tool_key(&id), onchain_tool_key(&ToolId::new("tool-other")));
    }

    #[test]
    fn mcp_schema_lookup_by_name_and_first() {
        let schema = ToolSchema::Mcp {
            endpoint: "https://tools.example/mcp".to_string(),
            sub_tools: vec![
                SubTool {
                    name: "search".to_string(),
                    description: None,
                    output_schema: Some(json!({"type": "object"})),
                },
                SubTool {
                    name: "fetch".to_string(),
                    description: None,
                    output_schema: Some(json!({"type": "array"})),
                },
            ],
        };
        assert_eq!(schema.output_schema_for(Some("fetch")), Some(&json!({"type": "array"})));
        assert_eq!(schema.output_schema_for(None), Some(&json!({"type": "object"})));
        assert_eq!(schema.output_schema_for(Some("missing")), None);
    }
}
