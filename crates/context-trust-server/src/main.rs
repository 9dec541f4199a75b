// crates/context-trust-server/src/main.rs
// ============================================================================
// Module: Server Entry Point
// Description: Binary entry point for the trust server.
// Purpose: Load configuration, build the server, and serve until exit.
// Dependencies: context-trust-server, tokio
// ============================================================================

//! ## Overview
//! The binary takes one optional argument: the configuration file path,
//! defaulting to `context-trust.toml` in the working directory. Startup
//! failures print one line to stderr and exit nonzero; the serve loop
//! runs until the process is terminated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use context_trust_server::TrustServer;
use context_trust_server::TrustServerConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration file path.
const DEFAULT_CONFIG_PATH: &str = "context-trust.toml";

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Binary entry point.
#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => emit_error(&message),
    }
}

/// Loads configuration and serves until the process exits.
async fn run() -> Result<(), String> {
    let config_path = config_path_from_args();
    let config =
        TrustServerConfig::load(&config_path).map_err(|err| err.to_string())?;
    let server = TrustServer::from_config(&config).map_err(|err| err.to_string())?;
    emit_line(&format!("listening on {}", config.server.bind))?;
    server.serve().await.map_err(|err| err.to_string())
}

/// Returns the configuration path from the first argument or the default.
fn config_path_from_args() -> PathBuf {
    env::args().nth(1).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Writes one line to stdout.
fn emit_line(message: &str) -> Result<(), String> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{message}").map_err(|err| err.to_string())
}

/// Writes one error line to stderr and returns the failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "error: {message}");
    ExitCode::FAILURE
}
