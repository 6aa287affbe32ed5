//! Entry points for the UI shell.
//!
//! Every command takes the shared [`CoreState`] and flattens failures to a
//! user-displayable `String`.

pub mod appointment;
pub mod pets;

use serde::Serialize;

use crate::config;
use crate::core_state::CoreState;

/// Health check, verifies the core is reachable.
pub fn health_check() -> String {
    tracing::debug!("Health check called");
    "ok".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub app_name: &'static str,
    pub version: &'static str,
    pub signed_in: bool,
}

pub fn session_info(state: &CoreState) -> SessionInfo {
    SessionInfo {
        app_name: config::APP_NAME,
        version: config::APP_VERSION,
        signed_in: state.owner_id().is_ok(),
    }
}
