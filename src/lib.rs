pub mod appointment; // Draft validation, edits, sort + search
pub mod backend; // Collaborator interfaces + local adapters
pub mod commands;
pub mod config;
pub mod core_state; // Injected collaborators, owner scoping
pub mod db;
pub mod dialog; // Add/edit appointment state machine
pub mod models;
pub mod pet_details; // Per-pet appointment list
pub mod pets; // Owner's pet list

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` overrides the default filter.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}
