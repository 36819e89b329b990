//! Game state actor: one Tokio task owns the `GameState`.
//!
//! Subscription handlers and the REPL all run concurrently, so none of them
//! touch the state directly. They send commands through a [`GameHandle`]
//! and wait for the reply on a oneshot channel; the actor applies commands
//! one at a time in arrival order.

use tokio::sync::{mpsc, oneshot};

use super::state::{GameState, MoveOutcome, WarResolution};
use super::types::{ArmyMove, Player, RecognitionOfWar, Unit};
use super::GameError;
use crate::routing::PlayingState;

const COMMAND_BUFFER: usize = 64;

/// The actor task has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("game state actor is unavailable")]
pub struct ActorError;

enum GameCommand {
    Spawn {
        words: Vec<String>,
        reply: oneshot::Sender<Result<Unit, GameError>>,
    },
    Move {
        words: Vec<String>,
        reply: oneshot::Sender<Result<ArmyMove, GameError>>,
    },
    Status {
        reply: oneshot::Sender<String>,
    },
    Snapshot {
        reply: oneshot::Sender<Player>,
    },
    Pause {
        state: PlayingState,
        reply: oneshot::Sender<()>,
    },
    HandleMove {
        mv: ArmyMove,
        reply: oneshot::Sender<(MoveOutcome, Player)>,
    },
    HandleWar {
        rw: RecognitionOfWar,
        reply: oneshot::Sender<WarResolution>,
    },
}

/// Handle to the running game actor.
///
/// Cheap to clone; every clone talks to the same state.
#[derive(Clone)]
pub struct GameHandle {
    username: String,
    sender: mpsc::Sender<GameCommand>,
}

impl GameHandle {
    /// Spawn the actor task and return a handle to it.
    ///
    /// The task exits once every handle has been dropped.
    pub fn spawn(state: GameState) -> Self {
        let username = state.username().to_string();
        let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
        tokio::spawn(run(state, receiver));
        Self { username, sender }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> GameCommand,
    ) -> Result<T, ActorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(build(reply_tx))
            .await
            .map_err(|_| ActorError)?;
        reply_rx.await.map_err(|_| ActorError)
    }

    pub async fn spawn_unit(&self, words: Vec<String>) -> Result<Result<Unit, GameError>, ActorError> {
        self.request(|reply| GameCommand::Spawn { words, reply }).await
    }

    pub async fn move_units(&self, words: Vec<String>) -> Result<Result<ArmyMove, GameError>, ActorError> {
        self.request(|reply| GameCommand::Move { words, reply }).await
    }

    pub async fn status(&self) -> Result<String, ActorError> {
        self.request(|reply| GameCommand::Status { reply }).await
    }

    pub async fn snapshot(&self) -> Result<Player, ActorError> {
        self.request(|reply| GameCommand::Snapshot { reply }).await
    }

    pub async fn handle_pause(&self, state: PlayingState) -> Result<(), ActorError> {
        self.request(|reply| GameCommand::Pause { state, reply }).await
    }

    /// Apply an incoming move; also returns our snapshot taken in the same
    /// step so a war recognition carries consistent state.
    pub async fn handle_move(&self, mv: ArmyMove) -> Result<(MoveOutcome, Player), ActorError> {
        self.request(|reply| GameCommand::HandleMove { mv, reply }).await
    }

    pub async fn handle_war(&self, rw: RecognitionOfWar) -> Result<WarResolution, ActorError> {
        self.request(|reply| GameCommand::HandleWar { rw, reply }).await
    }
}

async fn run(mut state: GameState, mut receiver: mpsc::Receiver<GameCommand>) {
    tracing::debug!(username = %state.username(), "game actor started");

    while let Some(cmd) = receiver.recv().await {
        match cmd {
            GameCommand::Spawn { words, reply } => {
                let _ = reply.send(state.spawn(&words));
            }
            GameCommand::Move { words, reply } => {
                let _ = reply.send(state.move_units(&words));
            }
            GameCommand::Status { reply } => {
                let _ = reply.send(state.status());
            }
            GameCommand::Snapshot { reply } => {
                let _ = reply.send(state.player_snapshot());
            }
            GameCommand::Pause { state: playing, reply } => {
                state.handle_pause(playing);
                tracing::info!(paused = playing.is_paused, "game pause state changed");
                let _ = reply.send(());
            }
            GameCommand::HandleMove { mv, reply } => {
                let outcome = state.handle_move(&mv);
                let _ = reply.send((outcome, state.player_snapshot()));
            }
            GameCommand::HandleWar { rw, reply } => {
                let _ = reply.send(state.handle_war(&rw));
            }
        }
    }

    tracing::debug!(username = %state.username(), "game actor stopped");
}
