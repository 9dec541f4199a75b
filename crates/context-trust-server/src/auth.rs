// crates/context-trust-server/src/auth.rs
// ============================================================================
// Module: Scheduler Auth
// Description: Bearer-secret verification for internal endpoints.
// Purpose: Gate the scheduler entry points before any work happens.
// Dependencies: axum, subtle
// ============================================================================

//! ## Overview
//! The internal endpoints are driven by a scheduler holding a shared
//! secret. The secret rides in the `Authorization: Bearer` header and is
//! compared in constant time; a missing, malformed, or wrong header is a
//! uniform rejection that carries no timing signal about the expected
//! value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use subtle::ConstantTimeEq;

// ============================================================================
// SECTION: Verification
// ============================================================================

/// Compares two byte strings in constant time.
#[must_use]
pub fn secrets_match(provided: &[u8], expected: &[u8]) -> bool {
    provided.ct_eq(expected).into()
}

/// Extracts the bearer token from request headers.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Verifies the scheduler secret carried by a request.
///
/// # Invariants
/// - Token comparison is constant time; length still leaks, which is
///   acceptable for a fixed-length deployment secret.
#[must_use]
pub fn verify_scheduler_secret(headers: &HeaderMap, expected: &str) -> bool {
    bearer_token(headers)
        .is_some_and(|token| secrets_match(token.as_bytes(), expected.as_bytes()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
