//! In-process realtime concerns: event fan-out, presence tracking, and the
//! disconnect/forfeit monitor. The socket transport itself lives in the host
//! embedding this crate.

pub mod events;
pub mod presence;
pub mod rate_limit;
