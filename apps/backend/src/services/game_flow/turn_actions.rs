use sea_orm::DatabaseTransaction;
use tracing::{debug, warn};

use super::{ActionOutcome, GameFlowService};
use crate::config::game::GameConfig;
use crate::domain::rules;
use crate::domain::tiles::{hand_score, Position, Tile};
use crate::entities::game_players;
use crate::entities::games::{self, GameEndReason, GameStatus};
use crate::entities::game_moves::MoveAction;
use crate::entities::types::TileList;
use crate::error::AppError;
use crate::errors::domain::{AntiCheatKind, ConflictKind, DomainError};
use crate::realtime::events::GameEvent;
use crate::repos::{games as games_repo, moves as moves_repo, players as players_repo};
use time::OffsetDateTime;

/// Validated actor context shared by all three turn actions.
struct TurnContext {
    game: games::Model,
    actor: game_players::Model,
    opponent: game_players::Model,
}

impl GameFlowService {
    /// Place a tile from the actor's hand onto the board.
    ///
    /// `expected_lock_version`, when provided, pins the mutation to the
    /// game state the client saw; a concurrent change surfaces as an
    /// OPTIMISTIC_LOCK conflict instead of being applied blind.
    pub async fn place_tile(
        &self,
        txn: &DatabaseTransaction,
        config: &GameConfig,
        game_id: i64,
        user_id: i64,
        tile: Tile,
        position: Position,
        expected_lock_version: Option<i32>,
    ) -> Result<ActionOutcome, AppError> {
        let ctx = self
            .load_turn_context(txn, game_id, user_id, expected_lock_version)
            .await?;
        let board = ctx.game.board.as_slice();

        // Anti-cheat: the tile must be in hand in its stored orientation.
        // A flipped rendition does not count as ownership.
        let mut hand = ctx.actor.hand.0.clone();
        let Some(idx) = hand.iter().position(|t| *t == tile) else {
            warn!(game_id, user_id, %tile, "rejected move: tile not in hand");
            return Err(DomainError::anti_cheat(
                AntiCheatKind::TileNotOwned,
                format!("tile {tile} is not in hand"),
            )
            .into());
        };

        if !rules::is_legal_at(tile, board, position) {
            warn!(game_id, user_id, %tile, ?position, "rejected move: illegal placement");
            return Err(DomainError::anti_cheat(
                AntiCheatKind::IllegalMove,
                format!("tile {tile} does not match the open end"),
            )
            .into());
        }

        hand.remove(idx);
        let mut new_board = ctx.game.board.0.clone();
        rules::attach(&mut new_board, tile, position);

        let move_no = ctx.game.turn_no + 1;
        moves_repo::append(
            txn,
            moves_repo::MoveCreate {
                game_id,
                user_id,
                move_no,
                action: MoveAction::Place,
                tile: Some(tile),
                position: Some(position),
            },
        )
        .await?;
        players_repo::apply_place(txn, ctx.actor.id, TileList::new(hand.clone())).await?;

        let hand_empty = hand.is_empty();
        let next_turn = if hand_empty {
            // Settlement clears the turn pointer; keep the actor until then.
            Some(user_id)
        } else {
            Some(ctx.opponent.user_id)
        };

        let mut update = games_repo::GameUpdate::new()
            .with_board(TileList::new(new_board))
            .with_turn_no(move_no)
            .with_consecutive_passes(0)
            .with_current_turn(next_turn);
        if !hand_empty {
            update = update.with_turn_started_at(Some(OffsetDateTime::now_utc()));
        }
        let game = games_repo::update(txn, game_id, ctx.game.lock_version, update).await?;

        debug!(game_id, user_id, %tile, ?position, move_no, "tile placed");

        let mut outcome = ActionOutcome::new(game).with_event(GameEvent::MoveMade {
            game_id,
            user_id,
            tile,
            position,
            next_turn_user_id: if hand_empty { None } else { next_turn },
        });

        if hand_empty {
            if let Some(ended) = self
                .settle(txn, config, game_id, Some(user_id), GameEndReason::EmptyHand)
                .await?
            {
                outcome.game = games_repo::require_game(txn, game_id).await?;
                outcome.events.push(ended);
            }
        }
        Ok(outcome)
    }

    /// Draw the last boneyard tile into the actor's hand. A playable draw
    /// keeps the turn; the actor may then place, draw again, or pass.
    pub async fn draw_tile(
        &self,
        txn: &DatabaseTransaction,
        game_id: i64,
        user_id: i64,
        expected_lock_version: Option<i32>,
    ) -> Result<ActionOutcome, AppError> {
        let ctx = self
            .load_turn_context(txn, game_id, user_id, expected_lock_version)
            .await?;

        let mut boneyard = ctx.game.boneyard.0.clone();
        let Some(drawn) = boneyard.pop() else {
            return Err(DomainError::conflict(
                ConflictKind::BoneyardEmpty,
                "no tiles left to draw",
            )
            .into());
        };

        let mut hand = ctx.actor.hand.0.clone();
        hand.push(drawn);

        let kept_turn = rules::is_legal(drawn, ctx.game.board.as_slice());
        let move_no = ctx.game.turn_no + 1;

        moves_repo::append(
            txn,
            moves_repo::MoveCreate {
                game_id,
                user_id,
                move_no,
                action: MoveAction::Draw,
                tile: Some(drawn),
                position: None,
            },
        )
        .await?;
        players_repo::apply_draw(txn, ctx.actor.id, TileList::new(hand)).await?;

        let mut update = games_repo::GameUpdate::new().with_boneyard(TileList::new(boneyard));
        if !kept_turn {
            update = update
                .with_turn_no(move_no)
                .with_current_turn(Some(ctx.opponent.user_id))
                .with_turn_started_at(Some(OffsetDateTime::now_utc()));
        }
        let game = games_repo::update(txn, game_id, ctx.game.lock_version, update).await?;

        debug!(game_id, user_id, kept_turn, boneyard_count = game.boneyard_count, "tile drawn");

        let event = GameEvent::TileDrawn {
            game_id,
            user_id,
            boneyard_count: game.boneyard_count,
            kept_turn,
        };
        Ok(ActionOutcome::new(game).with_event(event))
    }

    /// Pass the turn. Refused while the hand holds a legal tile; the second
    /// consecutive pass blocks the game and hands off to resolution.
    pub async fn pass_turn(
        &self,
        txn: &DatabaseTransaction,
        config: &GameConfig,
        game_id: i64,
        user_id: i64,
        expected_lock_version: Option<i32>,
    ) -> Result<ActionOutcome, AppError> {
        let ctx = self
            .load_turn_context(txn, game_id, user_id, expected_lock_version)
            .await?;
        let board = ctx.game.board.as_slice();

        if rules::has_legal_move(ctx.actor.hand.as_slice(), board) {
            return Err(DomainError::conflict(
                ConflictKind::HasLegalMove,
                "cannot pass while holding a playable tile",
            )
            .into());
        }

        let move_no = ctx.game.turn_no + 1;
        let passes = ctx.game.consecutive_passes + 1;

        moves_repo::append(
            txn,
            moves_repo::MoveCreate {
                game_id,
                user_id,
                move_no,
                action: MoveAction::Pass,
                tile: None,
                position: None,
            },
        )
        .await?;
        players_repo::apply_pass(txn, ctx.actor.id).await?;

        let blocked = passes >= 2;
        let mut update = games_repo::GameUpdate::new()
            .with_turn_no(move_no)
            .with_consecutive_passes(passes);
        if !blocked {
            update = update
                .with_current_turn(Some(ctx.opponent.user_id))
                .with_turn_started_at(Some(OffsetDateTime::now_utc()));
        }
        let game = games_repo::update(txn, game_id, ctx.game.lock_version, update).await?;

        debug!(game_id, user_id, passes, blocked, "turn passed");

        let mut outcome = ActionOutcome::new(game).with_event(GameEvent::TurnPassed {
            game_id,
            user_id,
            consecutive_passes: passes,
        });

        if blocked {
            let actor_score = hand_score(ctx.actor.hand.as_slice()) as i32;
            let opponent_score = hand_score(ctx.opponent.hand.as_slice()) as i32;
            players_repo::set_score(txn, ctx.actor.id, actor_score).await?;
            players_repo::set_score(txn, ctx.opponent.id, opponent_score).await?;

            let (winner, reason) =
                match rules::blocked_winner(actor_score as u32, opponent_score as u32) {
                    Some(rules::BlockedSeat::A) => (Some(ctx.actor.user_id), GameEndReason::Blocked),
                    Some(rules::BlockedSeat::B) => {
                        (Some(ctx.opponent.user_id), GameEndReason::Blocked)
                    }
                    None => (None, GameEndReason::Draw),
                };

            if let Some(ended) = self.settle(txn, config, game_id, winner, reason).await? {
                outcome.game = games_repo::require_game(txn, game_id).await?;
                outcome.events.push(ended);
            }
        }
        Ok(outcome)
    }

    async fn load_turn_context(
        &self,
        txn: &DatabaseTransaction,
        game_id: i64,
        user_id: i64,
        expected_lock_version: Option<i32>,
    ) -> Result<TurnContext, AppError> {
        let game = games_repo::require_game(txn, game_id).await?;

        if let Some(expected) = expected_lock_version {
            if game.lock_version != expected {
                return Err(DomainError::conflict(
                    ConflictKind::OptimisticLock,
                    format!(
                        "game {game_id} was modified concurrently (expected version {expected}, actual {})",
                        game.lock_version
                    ),
                )
                .into());
            }
        }

        if game.status != GameStatus::Active {
            return Err(DomainError::conflict(
                ConflictKind::GameNotActive,
                format!("game {game_id} is {:?}", game.status),
            )
            .into());
        }

        let actor = players_repo::require_seat(txn, game_id, user_id).await?;
        let players = players_repo::find_by_game(txn, game_id).await?;
        let opponent = players
            .into_iter()
            .find(|p| p.user_id != user_id)
            .ok_or_else(|| {
                DomainError::conflict(
                    ConflictKind::GameNotActive,
                    format!("game {game_id} has no opponent seated"),
                )
            })?;

        if game.current_turn_user_id != Some(user_id) {
            return Err(DomainError::conflict(
                ConflictKind::NotYourTurn,
                format!("it is not user {user_id}'s turn in game {game_id}"),
            )
            .into());
        }

        Ok(TurnContext {
            game,
            actor,
            opponent,
        })
    }
}
