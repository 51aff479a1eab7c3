use sea_orm::DatabaseTransaction;
use time::OffsetDateTime;
use tracing::{debug, info};

use super::GameFlowService;
use crate::config::game::GameConfig;
use crate::entities::game_players;
use crate::entities::games::{GameEndReason, GameStatus};
use crate::entities::wallet_transactions::TxnKind;
use crate::error::AppError;
use crate::errors::domain::{DomainError, InfraErrorKind};
use crate::realtime::events::GameEvent;
use crate::repos::{games as games_repo, players as players_repo, users as users_repo,
    wallets as wallets_repo};

impl GameFlowService {
    /// Settle a terminal game: terminal status write, wallet mutations, stat
    /// updates, all in the caller's transaction.
    ///
    /// Idempotent. The first gate is a read check; the authoritative gate is
    /// the conditional status flip in `games_repo::try_settle`. Concurrent
    /// settlers (turn engine vs forfeit timer) race on that UPDATE and the
    /// loser returns `Ok(None)` without touching wallets.
    pub async fn settle(
        &self,
        txn: &DatabaseTransaction,
        config: &GameConfig,
        game_id: i64,
        winner_user_id: Option<i64>,
        reason: GameEndReason,
    ) -> Result<Option<GameEvent>, AppError> {
        let game = games_repo::require_game(txn, game_id).await?;
        if game.status != GameStatus::Active || game.fee_processed {
            debug!(game_id, status = ?game.status, "settlement no-op: game already terminal");
            return Ok(None);
        }

        let players = players_repo::find_by_game(txn, game_id).await?;
        let [player_a, player_b]: [game_players::Model; 2] =
            players.try_into().map_err(|_| {
                DomainError::infra(
                    InfraErrorKind::DataCorruption,
                    format!("game {game_id} settled without exactly two players"),
                )
            })?;

        let now = OffsetDateTime::now_utc();
        let duration_secs = game.started_at.map(|s| (now - s).whole_seconds());
        let stake = game.stake_cents;
        let pot = game.pot_cents;

        let (payout_cents, fee_cents) = match winner_user_id {
            Some(_) => {
                let (payout, fee) = config.split_pot(pot);
                (Some(payout), fee)
            }
            None => (None, 0),
        };

        let flipped = games_repo::try_settle(
            txn,
            game_id,
            &games_repo::GameSettle {
                winner_user_id,
                winner_payout_cents: payout_cents,
                loser_loss_cents: winner_user_id.map(|_| stake),
                platform_fee_cents: fee_cents,
                end_reason: reason,
                completed_at: now,
                duration_secs,
            },
        )
        .await?;
        if !flipped {
            debug!(game_id, "settlement no-op: lost the terminal-status race");
            return Ok(None);
        }

        match winner_user_id {
            Some(winner_id) => {
                let (winner, loser) = if player_a.user_id == winner_id {
                    (&player_a, &player_b)
                } else if player_b.user_id == winner_id {
                    (&player_b, &player_a)
                } else {
                    return Err(DomainError::infra(
                        InfraErrorKind::DataCorruption,
                        format!("winner {winner_id} is not seated in game {game_id}"),
                    )
                    .into());
                };
                let payout = payout_cents.unwrap_or(0);

                let winner_wallet =
                    wallets_repo::settle_win(txn, winner.user_id, payout, stake).await?;
                wallets_repo::append_transaction(
                    txn,
                    wallets_repo::TxnCreate {
                        wallet_id: winner_wallet.id,
                        game_id: Some(game_id),
                        kind: TxnKind::Win,
                        amount_cents: payout,
                        balance_before_cents: winner_wallet.balance_cents - payout,
                        balance_after_cents: winner_wallet.balance_cents,
                        description: Some(format!("Won game {game_id}")),
                    },
                )
                .await?;

                let loser_wallet =
                    wallets_repo::unlock_stake(txn, loser.user_id, stake).await?;
                wallets_repo::append_transaction(
                    txn,
                    wallets_repo::TxnCreate {
                        wallet_id: loser_wallet.id,
                        game_id: Some(game_id),
                        kind: TxnKind::Loss,
                        amount_cents: stake,
                        balance_before_cents: loser_wallet.balance_cents,
                        balance_after_cents: loser_wallet.balance_cents,
                        description: Some(format!("Lost game {game_id}")),
                    },
                )
                .await?;

                users_repo::record_win(txn, winner.user_id, payout).await?;
                users_repo::record_loss(txn, loser.user_id, stake).await?;

                players_repo::set_result(txn, winner.id, true, Some(payout)).await?;
                players_repo::set_result(txn, loser.id, false, Some(0)).await?;

                info!(
                    game_id,
                    winner = winner.user_id,
                    payout_cents = payout,
                    fee_cents,
                    ?reason,
                    "game settled"
                );
            }
            None => {
                for player in [&player_a, &player_b] {
                    let wallet =
                        wallets_repo::unlock_stake(txn, player.user_id, stake).await?;
                    wallets_repo::append_transaction(
                        txn,
                        wallets_repo::TxnCreate {
                            wallet_id: wallet.id,
                            game_id: Some(game_id),
                            kind: TxnKind::Refund,
                            amount_cents: stake,
                            balance_before_cents: wallet.balance_cents,
                            balance_after_cents: wallet.balance_cents,
                            description: Some(format!("Stake refund for drawn game {game_id}")),
                        },
                    )
                    .await?;
                    users_repo::record_draw(txn, player.user_id).await?;
                    players_repo::set_result(txn, player.id, false, Some(0)).await?;
                }
                info!(game_id, ?reason, "game settled as draw, stakes refunded");
            }
        }

        Ok(Some(GameEvent::GameEnded {
            game_id,
            winner_user_id,
            winner_payout_cents: payout_cents,
            reason,
        }))
    }
}
