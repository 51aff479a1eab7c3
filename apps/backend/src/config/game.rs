use std::env;
use std::time::Duration;

use crate::errors::domain::{DomainError, ValidationKind};

/// Game tunables, env-overridable with defaults matching production.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Accepted stake denominations, in cents.
    pub stake_levels_cents: Vec<i64>,
    /// House fee taken from the pot on a win, in basis points.
    pub house_fee_bps: i64,
    /// Advisory per-turn clock stamped onto new games.
    pub max_turn_secs: i32,
    /// How long a disconnected player has to return before forfeiting.
    pub forfeit_grace: Duration,
    /// Fixed window for the presence-channel rate limiter.
    pub event_rate_window: Duration,
    /// Events allowed per window per connection.
    pub event_rate_max: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            stake_levels_cents: vec![500, 1000, 1500],
            house_fee_bps: 1000,
            max_turn_secs: 30,
            forfeit_grace: Duration::from_secs(60),
            event_rate_window: Duration::from_secs(10),
            event_rate_max: 20,
        }
    }
}

impl GameConfig {
    /// Defaults overridden by `GAME_*` environment variables where set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(bps) = env_i64("GAME_HOUSE_FEE_BPS") {
            config.house_fee_bps = bps;
        }
        if let Some(secs) = env_i64("GAME_FORFEIT_GRACE_SECS") {
            config.forfeit_grace = Duration::from_secs(secs.max(0) as u64);
        }
        if let Some(secs) = env_i64("GAME_MAX_TURN_SECS") {
            config.max_turn_secs = secs as i32;
        }
        config
    }

    /// Reject stakes outside the accepted denominations.
    pub fn validate_stake(&self, stake_cents: i64) -> Result<(), DomainError> {
        if self.stake_levels_cents.contains(&stake_cents) {
            Ok(())
        } else {
            Err(DomainError::validation(
                ValidationKind::InvalidStake,
                format!(
                    "stake {stake_cents} not in accepted levels {:?}",
                    self.stake_levels_cents
                ),
            ))
        }
    }

    /// Split a pot into (winner payout, house fee). Integer cents; the fee
    /// rounds down so the remainder goes to the winner.
    pub fn split_pot(&self, pot_cents: i64) -> (i64, i64) {
        let fee = pot_cents * self.house_fee_bps / 10_000;
        (pot_cents - fee, fee)
    }
}

fn env_i64(name: &str) -> Option<i64> {
    env::var(name).ok()?.parse().ok()
}
