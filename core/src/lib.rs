//! Game engine for a minesweeper-style puzzle: board configuration and validation, board generation with a
//! safe first move, flood reveal, marking, chording, a play clock and a best-times leaderboard.
//!
//! The engine never draws anything. Each move on a [`GameSession`] returns the [`GameEvent`]s a front end
//! has to apply.

pub use board::*;
pub use cell::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use leaderboard::*;
pub use session::*;
pub use types::*;

mod board;
mod cell;
mod clock;
mod config;
mod error;
mod event;
mod leaderboard;
mod session;
mod types;
