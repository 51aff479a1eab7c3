//! Connection presence and the disconnect/forfeit monitor.
//!
//! Tracks one live connection token per user. A disconnect starts a grace
//! timer; reconnecting cancels it, and an expired timer forfeits the game
//! to the opponent through the normal settlement path. State is held
//! in-process, so all socket traffic for a game must land on one instance.

use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::txn::with_txn;
use crate::entities::games::{GameEndReason, GameStatus};
use crate::error::AppError;
use crate::realtime::events::GameEvent;
use crate::realtime::rate_limit::RateLimiter;
use crate::repos::{games as games_repo, players as players_repo};
use crate::services::game_flow::GameFlowService;
use crate::state::app_state::AppState;

pub struct PresenceMonitor {
    state: AppState,
    flow: GameFlowService,
    limiter: RateLimiter,
    /// Live connection token per user. A reconnect replaces the token, which
    /// makes the old connection's disconnect a no-op.
    connections: DashMap<i64, Uuid>,
    /// Pending forfeit timers keyed by user.
    timers: DashMap<i64, CancellationToken>,
}

impl PresenceMonitor {
    pub fn new(state: AppState) -> Arc<Self> {
        let limiter = RateLimiter::new(state.game.event_rate_window, state.game.event_rate_max);
        Arc::new(Self {
            state,
            flow: GameFlowService,
            limiter,
            connections: DashMap::new(),
            timers: DashMap::new(),
        })
    }

    /// Register a connection for a seated player. Cancels any pending
    /// forfeit timer and returns the token the transport must hand back
    /// on disconnect.
    pub async fn on_user_connected(
        &self,
        user_id: i64,
        game_id: i64,
    ) -> Result<Uuid, AppError> {
        let conn = Uuid::new_v4();
        self.connections.insert(user_id, conn);

        let reconnected = match self.timers.remove(&user_id) {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        };

        with_txn(&self.state, |txn| {
            Box::pin(async move {
                players_repo::set_connected(txn, game_id, user_id, true).await?;
                Ok(())
            })
        })
        .await?;

        let event = if reconnected {
            info!(user_id, game_id, "player reconnected within grace period");
            GameEvent::OpponentReconnected { game_id, user_id }
        } else {
            debug!(user_id, game_id, %conn, "player connected");
            GameEvent::OpponentConnected { game_id, user_id }
        };
        self.state.events.publish(event);
        Ok(conn)
    }

    /// Handle a dropped connection. Stale tokens (superseded by a newer
    /// connection for the same user) are ignored.
    pub async fn on_user_disconnected(
        self: &Arc<Self>,
        user_id: i64,
        game_id: i64,
        conn: Uuid,
    ) -> Result<(), AppError> {
        self.limiter.forget(conn);

        let current = self.connections.get(&user_id).map(|c| *c);
        if current != Some(conn) {
            debug!(user_id, %conn, "ignoring disconnect from superseded connection");
            return Ok(());
        }
        self.connections.remove(&user_id);

        with_txn(&self.state, |txn| {
            Box::pin(async move {
                players_repo::set_connected(txn, game_id, user_id, false).await?;
                Ok(())
            })
        })
        .await?;

        let grace = self.state.game.forfeit_grace;
        self.state.events.publish(GameEvent::OpponentDisconnected {
            game_id,
            user_id,
            grace_secs: grace.as_secs(),
        });
        info!(user_id, game_id, grace_secs = grace.as_secs(), "player disconnected, grace timer started");

        let token = CancellationToken::new();
        if let Some(previous) = self.timers.insert(user_id, token.clone()) {
            previous.cancel();
        }

        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(grace) => {
                    monitor.timers.remove(&user_id);
                    if let Err(err) = monitor.fire_forfeit(game_id, user_id).await {
                        warn!(game_id, user_id, error = %err, "forfeit settlement failed");
                    }
                }
            }
        });
        Ok(())
    }

    /// Rate-limit gate for inbound presence-channel events.
    pub fn allow_channel_event(&self, conn: Uuid) -> bool {
        self.limiter.allow(conn)
    }

    /// Settle the game as a forfeit if it is still live and the player is
    /// still gone. Settlement itself is idempotent, so racing a concurrent
    /// game end is safe.
    async fn fire_forfeit(&self, game_id: i64, user_id: i64) -> Result<(), AppError> {
        let flow = self.flow;
        let config = self.state.game.clone();
        let event = with_txn(&self.state, |txn| {
            Box::pin(async move {
                let game = games_repo::require_game(txn, game_id).await?;
                if game.status != GameStatus::Active {
                    debug!(game_id, status = ?game.status, "forfeit timer expired on finished game");
                    return Ok(None);
                }
                let absent = players_repo::require_seat(txn, game_id, user_id).await?;
                if absent.is_connected {
                    debug!(game_id, user_id, "forfeit timer expired but player is back");
                    return Ok(None);
                }

                let players = players_repo::find_by_game(txn, game_id).await?;
                let Some(opponent) = players.iter().find(|p| p.user_id != user_id) else {
                    return Ok(None);
                };

                flow.settle(
                    txn,
                    &config,
                    game_id,
                    Some(opponent.user_id),
                    GameEndReason::Forfeit,
                )
                .await
            })
        })
        .await?;

        if let Some(event) = event {
            info!(game_id, forfeited_by = user_id, "game forfeited after grace period");
            self.state.events.publish(event);
        }
        Ok(())
    }
}
