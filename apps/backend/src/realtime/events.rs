//! Post-commit game events and their fire-and-forget publisher.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::domain::tiles::{Position, Tile};
use crate::entities::games::GameEndReason;

/// Events emitted after a game mutation commits. Delivery is best-effort;
/// clients resynchronize from the sanitized game state on reconnect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GameEvent {
    GameStarted {
        game_id: i64,
        stake_cents: i64,
        pot_cents: i64,
        first_turn_user_id: i64,
    },
    MoveMade {
        game_id: i64,
        user_id: i64,
        tile: Tile,
        position: Position,
        next_turn_user_id: Option<i64>,
    },
    TileDrawn {
        game_id: i64,
        user_id: i64,
        boneyard_count: i32,
        kept_turn: bool,
    },
    TurnPassed {
        game_id: i64,
        user_id: i64,
        consecutive_passes: i32,
    },
    GameEnded {
        game_id: i64,
        winner_user_id: Option<i64>,
        winner_payout_cents: Option<i64>,
        reason: GameEndReason,
    },
    OpponentConnected {
        game_id: i64,
        user_id: i64,
    },
    OpponentDisconnected {
        game_id: i64,
        user_id: i64,
        grace_secs: u64,
    },
    OpponentReconnected {
        game_id: i64,
        user_id: i64,
    },
}

impl GameEvent {
    pub fn game_id(&self) -> i64 {
        match self {
            GameEvent::GameStarted { game_id, .. }
            | GameEvent::MoveMade { game_id, .. }
            | GameEvent::TileDrawn { game_id, .. }
            | GameEvent::TurnPassed { game_id, .. }
            | GameEvent::GameEnded { game_id, .. }
            | GameEvent::OpponentConnected { game_id, .. }
            | GameEvent::OpponentDisconnected { game_id, .. }
            | GameEvent::OpponentReconnected { game_id, .. } => *game_id,
        }
    }
}

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Broadcast fan-out for game events. Publishing never blocks and never
/// fails; with no subscribers the event is dropped.
#[derive(Clone)]
pub struct EventPublisher {
    tx: broadcast::Sender<GameEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, event: GameEvent) {
        tracing::debug!(game_id = event.game_id(), ?event, "publishing game event");
        let _ = self.tx.send(event);
    }

    pub fn publish_all(&self, events: impl IntoIterator<Item = GameEvent>) {
        for event in events {
            self.publish(event);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
