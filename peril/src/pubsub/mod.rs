//! Pub/sub helpers over RabbitMQ.
//!
//! This module provides:
//! - Payload codecs (JSON and bincode) selected by type parameter
//! - Queue declaration and binding with a dead-letter exchange
//! - Typed publishing
//! - Typed subscriptions that route handler decisions to ack/nack
//!
//! ## Flow
//!
//! ```text
//! publish::<C, T>() → exchange → bound queue → subscribe::<C, T>() → handler → AckType
//! ```

pub mod codec;
pub mod declare;
pub mod error;
pub mod publish;
pub mod subscribe;
pub mod topology;

use lapin::{Connection, ConnectionProperties};
use tracing::info;

pub use codec::{BincodeCodec, Codec, CodecError, JsonCodec};
pub use declare::{declare_and_bind, queue_arguments, QueueType, DEAD_LETTER_ARG};
pub use error::PubSubError;
pub use publish::{publish, publish_bincode, publish_json};
pub use subscribe::{
    dispatch, settle, subscribe, subscribe_bincode, subscribe_json, AckType, Acknowledger,
    Subscription,
};
pub use topology::declare_topology;

/// Connect to the broker at `url`.
pub async fn connect(url: &str) -> error::Result<Connection> {
    info!(url_length = url.len(), "rabbitmq_connecting");

    let conn = Connection::connect(url, ConnectionProperties::default())
        .await
        .map_err(PubSubError::Connect)?;

    info!("rabbitmq_connected");
    Ok(conn)
}
