//! Peril - a multiplayer war game played over RabbitMQ.
//!
//! This library provides shared modules for the two Peril binaries:
//! - `peril-server`: Broadcasts pause/resume and records game logs
//! - `peril-client`: One per player; spawns and moves armies, fights wars
//!
//! ## Architecture
//!
//! ```text
//! server --pause--> peril_direct --> pause.<user>       --> client
//! client --move---> peril_topic  --> army_moves.<user>  --> other clients
//! client --war----> peril_topic  --> war (shared)       --> attacking client
//! client --log----> peril_topic  --> game_logs (shared) --> server --> game.log
//! ```

pub mod config;
pub mod gamelogic;
pub mod handlers;
pub mod pubsub;
pub mod routing;
pub mod shutdown;

// Re-export commonly used types
pub use config::Config;
pub use gamelogic::{GameHandle, GameState};
pub use handlers::GamePublisher;
pub use pubsub::{AckType, PubSubError, QueueType, Subscription};
pub use shutdown::shutdown_signal;
