//! Read-side projections of game state.
//!
//! Hands are never serialized wholesale: the requester sees their own
//! tiles and only a count for the opponent.

use sea_orm::DatabaseTransaction;
use serde::Serialize;
use time::OffsetDateTime;

use super::GameFlowService;
use crate::entities::game_players;
use crate::entities::games::{self, GameEndReason, GameStatus};
use crate::entities::types::TileList;
use crate::error::AppError;
use crate::repos::{games as games_repo, moves as moves_repo, players as players_repo};

/// One seat as seen by the requester.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub user_id: i64,
    pub seat: i16,
    /// Present only for the requester's own seat.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand: Option<TileList>,
    pub hand_count: usize,
    pub score: Option<i32>,
    pub is_winner: bool,
    pub is_connected: bool,
}

/// Full game state with the opponent's hand redacted.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGame {
    pub game_id: i64,
    pub status: GameStatus,
    pub stake_cents: i64,
    pub pot_cents: i64,
    pub board: TileList,
    pub boneyard_count: i32,
    pub current_turn_user_id: Option<i64>,
    pub turn_no: i32,
    pub consecutive_passes: i32,
    pub max_turn_secs: i32,
    pub turn_started_at: Option<OffsetDateTime>,
    pub lock_version: i32,
    pub players: Vec<PlayerView>,
    pub winner_user_id: Option<i64>,
    pub winner_payout_cents: Option<i64>,
    pub end_reason: Option<GameEndReason>,
}

/// Row in a user's completed-game history.
#[derive(Debug, Clone, Serialize)]
pub struct GameHistoryEntry {
    pub game_id: i64,
    pub stake_cents: i64,
    pub pot_cents: i64,
    pub won: bool,
    pub payout_cents: Option<i64>,
    pub end_reason: Option<GameEndReason>,
    pub opponent_user_id: Option<i64>,
    pub completed_at: Option<OffsetDateTime>,
    pub duration_secs: Option<i64>,
}

impl GameFlowService {
    /// Game state as the given seated player is allowed to see it.
    pub async fn sanitized_state(
        &self,
        txn: &DatabaseTransaction,
        game_id: i64,
        user_id: i64,
    ) -> Result<SanitizedGame, AppError> {
        let game = games_repo::require_game(txn, game_id).await?;
        players_repo::require_seat(txn, game_id, user_id).await?;
        let players = players_repo::find_by_game(txn, game_id).await?;
        Ok(sanitize(game, players, user_id))
    }

    /// Replay log for a game the requester played in, oldest move first.
    pub async fn move_log(
        &self,
        txn: &DatabaseTransaction,
        game_id: i64,
        user_id: i64,
    ) -> Result<Vec<crate::entities::game_moves::Model>, AppError> {
        games_repo::require_game(txn, game_id).await?;
        players_repo::require_seat(txn, game_id, user_id).await?;
        Ok(moves_repo::list_by_game(txn, game_id).await?)
    }

    /// Completed games for the user, most recent first.
    pub async fn game_history(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
    ) -> Result<Vec<GameHistoryEntry>, AppError> {
        let games = games_repo::find_completed_by_user(txn, user_id).await?;
        let mut entries = Vec::with_capacity(games.len());
        for game in games {
            let players = players_repo::find_by_game(txn, game.id).await?;
            let own = players.iter().find(|p| p.user_id == user_id);
            let opponent = players.iter().find(|p| p.user_id != user_id);
            entries.push(GameHistoryEntry {
                game_id: game.id,
                stake_cents: game.stake_cents,
                pot_cents: game.pot_cents,
                won: game.winner_user_id == Some(user_id),
                payout_cents: own.and_then(|p| p.payout_cents),
                end_reason: game.end_reason,
                opponent_user_id: opponent.map(|p| p.user_id),
                completed_at: game.completed_at,
                duration_secs: game.duration_secs,
            });
        }
        Ok(entries)
    }
}

fn sanitize(
    game: games::Model,
    players: Vec<game_players::Model>,
    viewer_id: i64,
) -> SanitizedGame {
    let players = players
        .into_iter()
        .map(|p| {
            let own = p.user_id == viewer_id;
            PlayerView {
                user_id: p.user_id,
                seat: p.seat,
                hand_count: p.hand.len(),
                hand: own.then_some(p.hand),
                score: p.score,
                is_winner: p.is_winner,
                is_connected: p.is_connected,
            }
        })
        .collect();

    SanitizedGame {
        game_id: game.id,
        status: game.status,
        stake_cents: game.stake_cents,
        pot_cents: game.pot_cents,
        board: game.board,
        boneyard_count: game.boneyard_count,
        current_turn_user_id: game.current_turn_user_id,
        turn_no: game.turn_no,
        consecutive_passes: game.consecutive_passes,
        max_turn_secs: game.max_turn_secs,
        turn_started_at: game.turn_started_at,
        lock_version: game.lock_version,
        players,
        winner_user_id: game.winner_user_id,
        winner_payout_cents: game.winner_payout_cents,
        end_reason: game.end_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tiles::Tile;
    use time::OffsetDateTime;

    fn player(user_id: i64, seat: i16, tiles: Vec<Tile>) -> game_players::Model {
        let now = OffsetDateTime::now_utc();
        game_players::Model {
            id: seat as i64 + 1,
            game_id: 1,
            user_id,
            seat,
            hand: TileList::new(tiles),
            score: None,
            moves_count: 0,
            draws_count: 0,
            pass_count: 0,
            is_winner: false,
            payout_cents: None,
            is_connected: true,
            last_seen: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn game() -> games::Model {
        let now = OffsetDateTime::now_utc();
        games::Model {
            id: 1,
            created_by: 10,
            status: GameStatus::Active,
            stake_cents: 1000,
            pot_cents: 2000,
            board: TileList::default(),
            boneyard: TileList::new(vec![Tile::new(0, 0).unwrap()]),
            boneyard_count: 1,
            current_turn_user_id: Some(10),
            turn_no: 0,
            consecutive_passes: 0,
            max_turn_secs: 30,
            turn_started_at: Some(now),
            winner_user_id: None,
            winner_payout_cents: None,
            loser_loss_cents: None,
            platform_fee_cents: None,
            fee_processed: false,
            end_reason: None,
            started_at: Some(now),
            completed_at: None,
            duration_secs: None,
            lock_version: 2,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn opponent_hand_is_redacted() {
        let mine = vec![Tile::new(6, 6).unwrap(), Tile::new(1, 2).unwrap()];
        let theirs = vec![Tile::new(3, 4).unwrap()];
        let view = sanitize(game(), vec![player(10, 0, mine), player(20, 1, theirs)], 10);

        let me = view.players.iter().find(|p| p.user_id == 10).unwrap();
        let opp = view.players.iter().find(|p| p.user_id == 20).unwrap();
        assert_eq!(me.hand.as_ref().map(|h| h.len()), Some(2));
        assert_eq!(me.hand_count, 2);
        assert!(opp.hand.is_none());
        assert_eq!(opp.hand_count, 1);
    }

    #[test]
    fn serialized_view_never_contains_opponent_tiles() {
        let theirs = vec![Tile::new(5, 6).unwrap()];
        let view = sanitize(game(), vec![player(10, 0, vec![]), player(20, 1, theirs)], 10);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("5|6"));
        assert!(!json.contains("\"left\":5"));
    }
}
