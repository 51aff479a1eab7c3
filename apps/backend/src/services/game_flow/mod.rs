//! Game flow orchestration - bridges pure domain logic with DB persistence.
//!
//! Every method takes the caller's transaction; callers wrap invocations in
//! `db::txn::with_txn` and publish the returned events only after commit.

mod matchmaking;
mod settlement;
mod turn_actions;
mod view;

pub use view::{GameHistoryEntry, PlayerView, SanitizedGame};

use crate::entities::games;
use crate::realtime::events::GameEvent;

/// Game flow service - methods are generic over the transaction they run in.
#[derive(Default, Clone, Copy)]
pub struct GameFlowService;

/// Result of a committed game mutation: the final game row plus the events
/// the caller should publish after the transaction commits.
#[derive(Debug)]
pub struct ActionOutcome {
    pub game: games::Model,
    pub events: Vec<GameEvent>,
}

impl ActionOutcome {
    fn new(game: games::Model) -> Self {
        Self {
            game,
            events: Vec::new(),
        }
    }

    fn with_event(mut self, event: GameEvent) -> Self {
        self.events.push(event);
        self
    }
}
