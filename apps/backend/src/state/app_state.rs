use sea_orm::DatabaseConnection;

use crate::config::game::GameConfig;
use crate::realtime::events::EventPublisher;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Game tunables
    pub game: GameConfig,
    /// Post-commit event fan-out
    pub events: EventPublisher,
}

impl AppState {
    pub fn new(db: DatabaseConnection, game: GameConfig) -> Self {
        Self {
            db,
            game,
            events: EventPublisher::new(),
        }
    }

    /// State with default config, for tests and tools.
    pub fn with_defaults(db: DatabaseConnection) -> Self {
        Self::new(db, GameConfig::default())
    }
}
