pub mod game_moves;
pub mod game_players;
pub mod games;
pub mod types;
pub mod users;
pub mod wallet_transactions;
pub mod wallets;
