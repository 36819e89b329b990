//! Queue declaration and binding.

use lapin::{
    options::{QueueBindOptions, QueueDeclareOptions},
    types::{AMQPValue, FieldTable},
    Channel, Connection, Queue,
};
use tracing::info;

use super::error::{PubSubError, Result};
use crate::routing::EXCHANGE_PERIL_DLX;

/// Argument key RabbitMQ reads to route rejected messages.
pub const DEAD_LETTER_ARG: &str = "x-dead-letter-exchange";

/// Lifetime class of a declared queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueType {
    /// Survives broker restarts and is shared between consumers.
    Durable,
    /// Exclusive to the declaring connection, deleted once unused.
    Transient,
}

impl QueueType {
    /// Flag combination passed to `queue.declare`.
    pub fn declare_options(self) -> QueueDeclareOptions {
        match self {
            QueueType::Durable => QueueDeclareOptions {
                durable: true,
                auto_delete: false,
                exclusive: false,
                ..Default::default()
            },
            QueueType::Transient => QueueDeclareOptions {
                durable: false,
                auto_delete: true,
                exclusive: true,
                ..Default::default()
            },
        }
    }
}

/// Declare arguments shared by every Peril queue.
pub fn queue_arguments() -> FieldTable {
    let mut args = FieldTable::default();
    args.insert(
        DEAD_LETTER_ARG.into(),
        AMQPValue::LongString(EXCHANGE_PERIL_DLX.into()),
    );
    args
}

/// Open a channel, declare `queue_name` and bind it to `exchange` with `key`.
///
/// Re-declaring a queue with identical parameters is a no-op on the broker;
/// conflicting parameters come back as [`PubSubError::Declare`].
pub async fn declare_and_bind(
    conn: &Connection,
    exchange: &str,
    queue_name: &str,
    key: &str,
    queue_type: QueueType,
) -> Result<(Channel, Queue)> {
    let channel = conn.create_channel().await.map_err(PubSubError::Channel)?;

    let queue = channel
        .queue_declare(queue_name, queue_type.declare_options(), queue_arguments())
        .await
        .map_err(|source| PubSubError::Declare {
            kind: "queue",
            name: queue_name.to_string(),
            source,
        })?;

    channel
        .queue_bind(
            queue.name().as_str(),
            exchange,
            key,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(|source| PubSubError::Bind {
            queue: queue_name.to_string(),
            exchange: exchange.to_string(),
            key: key.to_string(),
            source,
        })?;

    info!(
        exchange = exchange,
        queue = queue_name,
        key = key,
        queue_type = ?queue_type,
        "rabbitmq_queue_bound"
    );

    Ok((channel, queue))
}
