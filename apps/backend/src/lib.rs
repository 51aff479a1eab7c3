#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod error;
pub mod errors;
pub mod infra;
pub mod realtime;
pub mod repos;
pub mod services;
pub mod state;
pub mod telemetry;

#[cfg(test)]
pub mod test_bootstrap;

// Re-exports for public API
pub use config::db::{db_url, DbOwner, DbProfile};
pub use config::game::GameConfig;
pub use db::txn::with_txn;
pub use error::AppError;
pub use infra::db::connect_db;
pub use realtime::events::{EventPublisher, GameEvent};
pub use realtime::presence::PresenceMonitor;
pub use services::game_flow::GameFlowService;
pub use services::wallets::WalletService;
pub use state::app_state::AppState;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
