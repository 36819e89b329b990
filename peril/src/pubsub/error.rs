//! Error type for broker operations.

use super::codec::CodecError;

/// Errors returned by the pub/sub helpers.
///
/// Each variant names the broker step that failed so callers can log a
/// precise event without inspecting the lapin error.
#[derive(Debug, thiserror::Error)]
pub enum PubSubError {
    #[error("failed to connect to broker: {0}")]
    Connect(#[source] lapin::Error),

    #[error("failed to open channel: {0}")]
    Channel(#[source] lapin::Error),

    #[error("failed to declare {kind} '{name}': {source}")]
    Declare {
        kind: &'static str,
        name: String,
        #[source]
        source: lapin::Error,
    },

    #[error("failed to bind queue '{queue}' to '{exchange}' with key '{key}': {source}")]
    Bind {
        queue: String,
        exchange: String,
        key: String,
        #[source]
        source: lapin::Error,
    },

    #[error("failed to set QoS: {0}")]
    Qos(#[source] lapin::Error),

    #[error("failed to start consuming from '{queue}': {source}")]
    Consume {
        queue: String,
        #[source]
        source: lapin::Error,
    },

    #[error("failed to publish to '{exchange}' with key '{key}': {source}")]
    Publish {
        exchange: String,
        key: String,
        #[source]
        source: lapin::Error,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub type Result<T> = std::result::Result<T, PubSubError>;
