// crates/context-trust-server/src/lib.rs
// ============================================================================
// Module: Context Trust Server
// Description: HTTP surface and scheduler entry points for the trust engine.
// Purpose: Expose dispute filing, listings, and internal runs over axum.
// Dependencies: axum, context-trust-core, context-trust-monitor, tokio
// ============================================================================

//! ## Overview
//! `context-trust-server` binds the trust engine to HTTP. Humans and
//! marketplace clients file and list disputes on the public routes; the
//! deployment scheduler drives the health prober and stake reconciler
//! through secret-gated internal routes. Configuration is one TOML file
//! validated at startup; the backing store is in-memory or `SQLite`.

/// Scheduler bearer-secret verification.
pub mod auth;
/// TOML configuration loading and validation.
pub mod config;
/// Router construction and request handlers.
pub mod server;
/// Request metrics seam.
pub mod telemetry;

pub use auth::bearer_token;
pub use auth::secrets_match;
pub use auth::verify_scheduler_secret;
pub use config::ConfigError;
pub use config::HttpConfig;
pub use config::OracleConfig;
pub use config::ProberConfig;
pub use config::StakeConfig;
pub use config::StoreConfig;
pub use config::StoreKind;
pub use config::TrustServerConfig;
pub use server::DisputeBody;
pub use server::FiledDispute;
pub use server::ServerError;
pub use server::ServerState;
pub use server::TrustServer;
pub use server::handle_file_dispute;
pub use server::handle_health_run;
pub use server::handle_list_disputes;
pub use server::handle_liveness;
pub use server::handle_stake_sync;
pub use telemetry::Endpoint;
pub use telemetry::NoopMetrics;
pub use telemetry::Outcome;
pub use telemetry::RequestEvent;
pub use telemetry::TrustMetrics;
