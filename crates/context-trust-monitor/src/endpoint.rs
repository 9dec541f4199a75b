// crates/context-trust-monitor/src/endpoint.rs
// ============================================================================
// Module: Probe Endpoint Policy
// Description: Endpoint resolution and reachability policy for health probes.
// Purpose: Decide which tool endpoints the prober may contact.
// Dependencies: context-trust-core, url
// ============================================================================

//! ## Overview
//! The prober runs from a network where loopback and private addresses are
//! unreachable, so tools registered against such hosts are skipped rather
//! than counted as failures. Policy checks are performed on the URL host
//! label and on literal IP addresses; skipped tools see no state change at
//! all.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::IpAddr;

use context_trust_core::ToolSchema;
use url::Url;

// ============================================================================
// SECTION: Policy Types
// ============================================================================

/// Probe reachability policy.
///
/// # Invariants
/// - `allow_private_hosts = false` skips loopback/private/link-local hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProbePolicy {
    /// Allow probing loopback and private-network hosts.
    pub allow_private_hosts: bool,
}

/// Why a tool was skipped by the prober.
///
/// # Invariants
/// - Variants are stable for run-summary labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The schema declares no endpoint or the endpoint is empty.
    NoEndpoint,
    /// The endpoint URL could not be parsed or uses a non-HTTP scheme.
    InvalidUrl,
    /// The endpoint host is loopback, private, or link-local.
    PrivateHost,
}

impl SkipReason {
    /// Returns a stable label for the skip reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoEndpoint => "no_endpoint",
            Self::InvalidUrl => "invalid_url",
            Self::PrivateHost => "private_host",
        }
    }
}

/// Protocol handshake the probe should speak.
///
/// # Invariants
/// - Mirrors the `kind` discriminator of the tool schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeProtocol {
    /// Plain JSON request/response.
    Http,
    /// JSON-RPC initialize exchange over HTTP.
    Mcp,
}

/// Resolved probe target for one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    /// Validated endpoint URL.
    pub url: Url,
    /// Handshake protocol to use.
    pub protocol: ProbeProtocol,
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolves a tool schema into a probe target, or a skip reason.
///
/// # Errors
///
/// Returns [`SkipReason`] when the endpoint is missing, unparsable, or
/// unreachable from the prober's network.
pub fn resolve_probe_target(
    schema: &ToolSchema,
    policy: ProbePolicy,
) -> Result<ProbeTarget, SkipReason> {
    let endpoint = schema.endpoint().trim();
    if endpoint.is_empty() {
        return Err(SkipReason::NoEndpoint);
    }
    let url = Url::parse(endpoint).map_err(|_| SkipReason::InvalidUrl)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SkipReason::InvalidUrl);
    }
    let host = url.host_str().ok_or(SkipReason::InvalidUrl)?;
    if !policy.allow_private_hosts && is_private_host(host) {
        return Err(SkipReason::PrivateHost);
    }
    let protocol = match schema {
        ToolSchema::Http { .. } => ProbeProtocol::Http,
        ToolSchema::Mcp { .. } => ProbeProtocol::Mcp,
    };
    Ok(ProbeTarget {
        url,
        protocol,
    })
}

/// Returns true when a host label names a loopback/private/link-local target.
fn is_private_host(host: &str) -> bool {
    let label = normalize_host_label(host);
    if label == "localhost" || label.ends_with(".localhost") || label.ends_with(".local") {
        return true;
    }
    label.parse::<IpAddr>().is_ok_and(|ip| is_private_or_link_local(&ip))
}

/// Returns true when an IP is private, loopback, link-local, or otherwise local.
#[allow(
    clippy::option_if_let_else,
    reason = "Option::map_or is not const-callable on current toolchain."
)]
const fn is_private_or_link_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => {
            addr.is_private()
                || addr.is_loopback()
                || addr.is_link_local()
                || addr.is_unspecified()
                || addr.is_multicast()
                || addr.is_broadcast()
        }
        IpAddr::V6(addr) => {
            let mapped_private = if let Some(mapped) = addr.to_ipv4_mapped() {
                mapped.is_private()
                    || mapped.is_loopback()
                    || mapped.is_link_local()
                    || mapped.is_unspecified()
                    || mapped.is_multicast()
                    || mapped.is_broadcast()
            } else {
                false
            };
            mapped_private
                || addr.is_loopback()
                || addr.is_unique_local()
                || addr.is_unicast_link_local()
                || addr.is_unspecified()
                || addr.is_multicast()
        }
    }
}

/// Normalizes host labels for policy comparisons.
fn normalize_host_label(host: &str) -> String {
    let trimmed = host.trim_end_matches('.');
    let trimmed =
        trimmed.strip_prefix('[').and_then(|inner| inner.strip_suffix(']')).unwrap_or(trimmed);
    trimmed.to_ascii_lowercase()
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

    use context_trust_core::ToolSchema;

    use super::ProbePolicy;
    use super::ProbeProtocol;
    use super::SkipReason;
    use super::resolve_probe_target;

    fn http_schema(endpoint: &str) -> ToolSchema {
        ToolSchema::Http {
            endpoint: endpoint.to_string(),
            output_schema: None,
        }
    }

    #[test]
    fn localhost_endpoint_is_skipped() {
        // Scenario D: a loopback MCP endpoint must be skipped, not failed.
        let schema = ToolSchema::Mcp {
            endpoint: "http://localhost:4000/mcp".to_string(),
            sub_tools: Vec::new(),
        };
        let err = resolve_probe_target(&schema, ProbePolicy::default()).unwrap_err();
        assert_eq!(err, SkipReason::PrivateHost);
    }

    #[test]
    fn private_and_loopback_ips_are_skipped() {
        for endpoint in [
            "http://127.0.0.1:8080/run",
            "http://10.1.2.3/run",
            "http://192.168.0.4/run",
            "http://169.254.0.1/run",
            "http://[::1]/run",
        ] {
            let err = resolve_probe_target(&http_schema(endpoint), ProbePolicy::default())
                .unwrap_err();
            assert_eq!(err, SkipReason::PrivateHost, "endpoint {endpoint}");
        }
    }

    #[test]
    fn missing_or_invalid_endpoints_are_skipped() {
        let err = resolve_probe_target(&http_schema("  "), ProbePolicy::default()).unwrap_err();
        assert_eq!(err, SkipReason::NoEndpoint);
        let err =
            resolve_probe_target(&http_schema("ftp://files.example"), ProbePolicy::default())
                .unwrap_err();
        assert_eq!(err, SkipReason::InvalidUrl);
        let err =
            resolve_probe_target(&http_schema("not a url"), ProbePolicy::default()).unwrap_err();
        assert_eq!(err, SkipReason::InvalidUrl);
    }

    #[test]
    fn public_endpoint_resolves_with_protocol() {
        let target =
            resolve_probe_target(&http_schema("https://api.example/run"), ProbePolicy::default())
                .unwrap();
        assert_eq!(target.protocol, ProbeProtocol::Http);
    }

    #[test]
    fn policy_override_allows_private_hosts() {
        let policy = ProbePolicy {
            allow_private_hosts: true,
        };
        assert!(resolve_probe_target(&http_schema("http://127.0.0.1:9/x"), policy).is_ok());
    }
}
