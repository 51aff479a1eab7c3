//! Persistence layer: SeaORM queries generic over `ConnectionTrait`, so
//! every function runs inside the caller's transaction.

pub mod games;
pub mod moves;
pub mod players;
pub mod users;
pub mod wallets;
