//! Subscription handlers for the client and the server.
//!
//! Each handler forwards the decoded message to the game actor, publishes
//! any follow-up message, and returns the [`AckType`] for the delivery:
//!
//! | message          | outcome                  | decision      |
//! |------------------|--------------------------|---------------|
//! | pause            | applied                  | `Ack`         |
//! | army move        | safe                     | `Ack`         |
//! | army move        | war (published)          | `Ack`         |
//! | army move        | war (publish failed)     | `NackRequeue` |
//! | army move        | our own move             | `NackDiscard` |
//! | war recognition  | not involved             | `NackRequeue` |
//! | war recognition  | no shared location       | `NackDiscard` |
//! | war recognition  | fought (log published)   | `Ack`         |
//! | war recognition  | fought (publish failed)  | `NackRequeue` |
//!
//! The server has a single handler, [`handler_game_log`], which appends to
//! the game log file and requeues on I/O errors.

use std::future::Future;
use std::path::PathBuf;

use futures::future::{BoxFuture, FutureExt};
use lapin::Channel;
use tracing::{error, info, warn};

use crate::gamelogic::{get_malicious_log, print_prompt, write_log, ArmyMove, GameHandle, MoveOutcome, RecognitionOfWar, WarOutcome};
use crate::pubsub::{error::Result, publish_bincode, publish_json, AckType};
use crate::routing::{
    user_key, GameLog, PlayingState, ARMY_MOVES_PREFIX, EXCHANGE_PERIL_TOPIC, GAME_LOG_SLUG,
    WAR_RECOGNITIONS_PREFIX,
};

/// Outbound messages a client publishes.
pub trait GamePublisher: Clone + Send + Sync + 'static {
    fn publish_move(&self, username: &str, mv: &ArmyMove) -> impl Future<Output = Result<()>> + Send;

    fn publish_war(&self, username: &str, rw: &RecognitionOfWar) -> impl Future<Output = Result<()>> + Send;

    fn publish_game_log(&self, log: &GameLog) -> impl Future<Output = Result<()>> + Send;
}

impl GamePublisher for Channel {
    fn publish_move(&self, username: &str, mv: &ArmyMove) -> impl Future<Output = Result<()>> + Send {
        let key = user_key(ARMY_MOVES_PREFIX, username);
        async move { publish_json(self, EXCHANGE_PERIL_TOPIC, &key, mv).await }
    }

    fn publish_war(&self, username: &str, rw: &RecognitionOfWar) -> impl Future<Output = Result<()>> + Send {
        let key = user_key(WAR_RECOGNITIONS_PREFIX, username);
        async move { publish_json(self, EXCHANGE_PERIL_TOPIC, &key, rw).await }
    }

    fn publish_game_log(&self, log: &GameLog) -> impl Future<Output = Result<()>> + Send {
        let key = user_key(GAME_LOG_SLUG, &log.username);
        async move { publish_bincode(self, EXCHANGE_PERIL_TOPIC, &key, log).await }
    }
}

/// Publish `count` spam game logs as `username`, stopping at the first
/// failure. Returns how many were published alongside that failure.
pub async fn publish_spam<P: GamePublisher>(publisher: &P, username: &str, count: usize) -> (usize, Result<()>) {
    for sent in 0..count {
        let log = GameLog::new(username, get_malicious_log());
        if let Err(e) = publisher.publish_game_log(&log).await {
            warn!(sent, requested = count, error = %e, "spam_publish_failed");
            return (sent, Err(e));
        }
    }
    (count, Ok(()))
}

/// Apply server pause/resume notifications.
pub fn handler_pause(
    game: GameHandle,
) -> impl Fn(PlayingState) -> BoxFuture<'static, AckType> + Send + Sync + 'static {
    move |state| {
        let game = game.clone();
        async move {
            let ack = match game.handle_pause(state).await {
                Ok(()) => {
                    println!();
                    if state.is_paused {
                        println!("==== Pause Detected ====");
                    } else {
                        println!("==== Resume Detected ====");
                    }
                    AckType::Ack
                }
                Err(e) => {
                    error!(error = %e, "pause_handler_failed");
                    AckType::NackRequeue
                }
            };
            print_prompt();
            ack
        }
        .boxed()
    }
}

/// React to another player's army move, declaring war on overlap.
pub fn handler_move<P: GamePublisher>(
    game: GameHandle,
    publisher: P,
) -> impl Fn(ArmyMove) -> BoxFuture<'static, AckType> + Send + Sync + 'static {
    move |mv| {
        let game = game.clone();
        let publisher = publisher.clone();
        async move {
            let ack = handle_move(&game, &publisher, mv).await;
            print_prompt();
            ack
        }
        .boxed()
    }
}

async fn handle_move<P: GamePublisher>(game: &GameHandle, publisher: &P, mv: ArmyMove) -> AckType {
    println!();
    println!("==== Move Detected ====");
    println!(
        "{} is moving {} unit(s) to {}",
        mv.player.username,
        mv.units.len(),
        mv.to_location
    );
    for unit in &mv.units {
        println!("* {}", unit.rank);
    }

    let attacker = mv.player.clone();
    let (outcome, defender) = match game.handle_move(mv).await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "move_handler_failed");
            return AckType::NackRequeue;
        }
    };

    match outcome {
        MoveOutcome::Safe => {
            println!("You are safe from {}'s units.", attacker.username);
            AckType::Ack
        }
        MoveOutcome::SamePlayer => AckType::NackDiscard,
        MoveOutcome::MakeWar => {
            println!("You are at war with {}!", attacker.username);
            let rw = RecognitionOfWar { attacker, defender };
            match publisher.publish_war(game.username(), &rw).await {
                Ok(()) => {
                    info!(
                        attacker = %rw.attacker.username,
                        defender = %rw.defender.username,
                        "war_recognition_published"
                    );
                    AckType::Ack
                }
                Err(e) => {
                    warn!(error = %e, "war_recognition_publish_failed");
                    AckType::NackRequeue
                }
            }
        }
    }
}

/// Fight wars we are the attacker in and log the result.
pub fn handler_war<P: GamePublisher>(
    game: GameHandle,
    publisher: P,
) -> impl Fn(RecognitionOfWar) -> BoxFuture<'static, AckType> + Send + Sync + 'static {
    move |rw| {
        let game = game.clone();
        let publisher = publisher.clone();
        async move {
            let ack = handle_war(&game, &publisher, rw).await;
            print_prompt();
            ack
        }
        .boxed()
    }
}

async fn handle_war<P: GamePublisher>(game: &GameHandle, publisher: &P, rw: RecognitionOfWar) -> AckType {
    let resolution = match game.handle_war(rw).await {
        Ok(resolution) => resolution,
        Err(e) => {
            error!(error = %e, "war_handler_failed");
            return AckType::NackRequeue;
        }
    };

    println!();
    println!("==== War Declared ====");
    print!("{}", resolution.report);

    match resolution.outcome {
        // Another client is the attacker; let it pick this up.
        WarOutcome::NotInvolved => AckType::NackRequeue,
        WarOutcome::NoUnits => AckType::NackDiscard,
        WarOutcome::Draw | WarOutcome::OpponentWon | WarOutcome::YouWon => {
            let Some(message) = resolution.log_message() else {
                return AckType::NackDiscard;
            };
            let log = GameLog::new(game.username(), message);
            match publisher.publish_game_log(&log).await {
                Ok(()) => AckType::Ack,
                Err(e) => {
                    warn!(error = %e, "game_log_publish_failed");
                    AckType::NackRequeue
                }
            }
        }
    }
}

/// Append incoming game logs to the file at `path` (server side).
pub fn handler_game_log(
    path: PathBuf,
) -> impl Fn(GameLog) -> BoxFuture<'static, AckType> + Send + Sync + 'static {
    move |log| {
        let path = path.clone();
        async move {
            let ack = match write_log(&path, &log).await {
                Ok(()) => {
                    info!(username = %log.username, path = %path.display(), "game_log_written");
                    AckType::Ack
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "game_log_write_failed");
                    AckType::NackRequeue
                }
            };
            print_prompt();
            ack
        }
        .boxed()
    }
}
