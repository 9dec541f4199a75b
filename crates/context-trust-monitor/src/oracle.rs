// crates/context-trust-monitor/src/oracle.rs
// ============================================================================
// Module: EVM Stake Oracle
// Description: Read-only stake lookups against the router contract.
// Purpose: Resolve a tool's staked collateral via JSON-RPC `eth_call`.
// Dependencies: context-trust-core, reqwest, sha3, hex, serde_json
// ============================================================================

//! ## Overview
//! The router contract exposes `getStake(uint256)` returning the collateral
//! a tool has locked, denominated in 6-decimal USDC base units. This module
//! performs the read path only: it never signs or submits transactions. The
//! function selector is derived at construction time from the canonical
//! signature, so no hand-copied ABI constants can drift out of date. A
//! missing RPC URL or contract address is a configuration error surfaced as
//! [`OracleError::Misconfigured`] so callers can skip the run instead of
//! hammering a dead endpoint.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use serde_json::json;
use sha3::Digest;
use sha3::Keccak256;

use context_trust_core::OracleError;
use context_trust_core::StakeOracle;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Canonical signature hashed into the 4-byte call selector.
const GET_STAKE_SIGNATURE: &[u8] = b"getStake(uint256)";
/// Default timeout for a single `eth_call`, in milliseconds.
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 10_000;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Connection settings for the router contract read path.
#[derive(Debug, Clone, Default)]
pub struct EvmOracleConfig {
    /// JSON-RPC endpoint of the chain node. Empty means unconfigured.
    pub rpc_url: String,
    /// Hex address of the router contract. Empty means unconfigured.
    pub contract_address: String,
    /// Request timeout in milliseconds. Zero falls back to the default.
    pub timeout_ms: u64,
}

impl EvmOracleConfig {
    /// Returns the effective request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        if self.timeout_ms == 0 {
            Duration::from_millis(DEFAULT_RPC_TIMEOUT_MS)
        } else {
            Duration::from_millis(self.timeout_ms)
        }
    }
}

// ============================================================================
// SECTION: Oracle
// ============================================================================

/// Stake oracle backed by a live EVM JSON-RPC node.
#[derive(Debug, Clone)]
pub struct EvmStakeOracle {
    /// Shared HTTP client with the configured timeout applied.
    client: Client,
    /// JSON-RPC endpoint of the chain node.
    rpc_url: String,
    /// Checksummed or lowercase router contract address.
    contract_address: String,
    /// Precomputed `getStake(uint256)` selector.
    selector: [u8; 4],
}

impl EvmStakeOracle {
    /// Builds an oracle from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Misconfigured`] when the RPC URL or contract
    /// address is missing, and [`OracleError::Rpc`] when the HTTP client
    /// cannot be constructed.
    pub fn new(config: &EvmOracleConfig) -> Result<Self, OracleError> {
        if config.rpc_url.trim().is_empty() {
            return Err(OracleError::Misconfigured(
                "rpc_url is not set".to_string(),
            ));
        }
        if config.contract_address.trim().is_empty() {
            return Err(OracleError::Misconfigured(
                "contract_address is not set".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| OracleError::Rpc(err.to_string()))?;
        Ok(Self {
            client,
            rpc_url: config.rpc_url.trim().to_string(),
            contract_address: config.contract_address.trim().to_string(),
            selector: get_stake_selector(),
        })
    }

    /// Encodes the ABI call data for a stake lookup on `tool_key`.
    fn call_data(&self, tool_key: u64) -> String {
        let mut data = Vec::with_capacity(4 + 32);
        data.extend_from_slice(&self.selector);
        let mut word = [0_u8; 32];
        word[24..].copy_from_slice(&tool_key.to_be_bytes());
        data.extend_from_slice(&word);
        format!("0x{}", hex::encode(data))
    }
}

#[async_trait]
impl StakeOracle for EvmStakeOracle {
    async fn stake_units(&self, tool_key: u64) -> Result<u128, OracleError> {
        let request = json!({
            "jsonrpc": "2.0",
            "method": "eth_call",
            "params": [
                {
                    "to": self.contract_address,
                    "data": self.call_data(tool_key),
                },
                "latest",
            ],
            "id": 1,
        });
        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|err| OracleError::Rpc(err.to_string()))?;
        let body: Value = response.json().await.map_err(|err| OracleError::Rpc(err.to_string()))?;
        if let Some(error) = body.get("error") {
            return Err(OracleError::Rpc(error.to_string()));
        }
        let result = body
            .get("result")
            .and_then(Value::as_str)
            .ok_or_else(|| OracleError::Decode("missing result field in eth_call response".to_string()))?;
        decode_uint256_as_u128(result)
    }
}

// ============================================================================
// SECTION: ABI Helpers
// ============================================================================

/// Derives the 4-byte selector for `getStake(uint256)`.
#[must_use]
pub fn get_stake_selector() -> [u8; 4] {
    let digest = Keccak256::digest(GET_STAKE_SIGNATURE);
    let mut selector = [0_u8; 4];
    selector.copy_from_slice(&digest[..4]);
    selector
}

/// Decodes a 32-byte ABI word into a `u128` stake amount.
///
/// The contract returns `uint256`, but stakes beyond `u128::MAX` base units
/// are economically absurd and treated as decode failures.
///
/// # Errors
///
/// Returns [`OracleError::Decode`] on malformed hex, wrong word length, or
/// a value exceeding 128 bits.
pub fn decode_uint256_as_u128(raw: &str) -> Result<u128, OracleError> {
    let word = raw.strip_prefix("0x").unwrap_or(raw);
    if word.len() != 64 {
        return Err(OracleError::Decode(format!("expected 32-byte ABI word, got {} hex chars", word.len())));
    }
    let (high, low) = word.split_at(32);
    let overflow = u128::from_str_radix(high, 16).map_err(|err| OracleError::Decode(err.to_string()))?;
    if overflow != 0 {
        return Err(OracleError::Decode("stake exceeds 128 bits".to_string()));
    }
    u128::from_str_radix(low, 16).map_err(|err| OracleError::Decode(err.to_string()))
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

    use super::*;

    #[test]
    fn selector_matches_known_keccak_prefix() {
        // keccak256("getStake(uint256)") is stable; the selector must be its
        // first four bytes and must not change across runs.
        let first = get_stake_selector();
        let second = get_stake_selector();
        assert_eq!(first, second);
        let digest = Keccak256::digest(GET_STAKE_SIGNATURE);
        assert_eq!(&first[..], &digest[..4]);
    }

    #[test]
    fn call_data_left_pads_tool_key() {
        let oracle = EvmStakeOracle::new(&EvmOracleConfig {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            contract_address: "0x00000000000000000000000000000000000000aa".to_string(),
            timeout_ms: 0,
        })
        .unwrap();
        let data = oracle.call_data(0xdead_beef);
        // 0x + 4 selector bytes + 32 word bytes.
        assert_eq!(data.len(), 2 + 8 + 64);
        assert!(data.ends_with("00000000000000000000000000000000000000000000000000000000deadbeef"));
    }

    #[test]
    fn decode_accepts_full_word() {
        let raw = format!("0x{:064x}", 150_000_000_u64);
        assert_eq!(decode_uint256_as_u128(&raw).unwrap(), 150_000_000);
    }

    #[test]
    fn decode_rejects_short_word() {
        let err = decode_uint256_as_u128("0xdeadbeef").unwrap_err();
        assert!(matches!(err, OracleError::Decode(_)));
    }

    #[test]
    fn decode_rejects_overflowing_word() {
        let raw = format!("0x{}{}", "f".repeat(32), "0".repeat(32));
        let err = decode_uint256_as_u128(&raw).unwrap_err();
        assert!(matches!(err, OracleError::Decode(_)));
    }

    #[test]
    fn misconfigured_when_rpc_url_missing() {
        let err = EvmStakeOracle::new(&EvmOracleConfig::default()).unwrap_err();
        assert!(matches!(err, OracleError::Misconfigured(_)));
    }
}
