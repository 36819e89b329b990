//! Game rules, the state actor and REPL helpers.
//!
//! ## Layout
//!
//! ```text
//! REPL / subscription handlers → GameHandle (mpsc) → GameState (owned by one task)
//! ```

pub mod actor;
pub mod commands;
pub mod gamelog;
pub mod state;
pub mod types;

pub use actor::{ActorError, GameHandle};
pub use commands::{client_help, get_malicious_log, parse_words, print_prompt, server_help};
pub use gamelog::write_log;
pub use state::{GameState, MoveOutcome, WarOutcome, WarResolution};
pub use types::{ArmyMove, Location, Player, RecognitionOfWar, Unit, UnitRank};

/// Errors from player commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("unknown location '{0}'")]
    UnknownLocation(String),

    #[error("unknown rank '{0}'")]
    UnknownRank(String),

    #[error("invalid unit id '{0}'")]
    InvalidUnitId(String),

    #[error("unit {0} not found")]
    UnitNotFound(u32),

    #[error("the game is paused, you can not move units")]
    Paused,
}
