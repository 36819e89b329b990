//! Exchange topology shared by the client and the server.
//!
//! ```text
//! peril_direct (direct) --pause--------------> pause.<user>
//! peril_topic  (topic)  --army_moves.*-------> army_moves.<user>
//!                       --war.*--------------> war
//!                       --game_logs.*--------> game_logs
//! peril_dlx    (fanout) ---------------------> peril_dlq
//! ```

use lapin::{
    options::{ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions},
    types::FieldTable,
    Channel, ExchangeKind,
};
use tracing::info;

use super::error::{PubSubError, Result};
use crate::routing::{
    DEAD_LETTER_QUEUE, EXCHANGE_PERIL_DIRECT, EXCHANGE_PERIL_DLX, EXCHANGE_PERIL_TOPIC,
};

/// Exchanges every Peril process relies on.
pub fn exchanges() -> [(&'static str, ExchangeKind); 3] {
    [
        (EXCHANGE_PERIL_DIRECT, ExchangeKind::Direct),
        (EXCHANGE_PERIL_TOPIC, ExchangeKind::Topic),
        (EXCHANGE_PERIL_DLX, ExchangeKind::Fanout),
    ]
}

/// Declare the exchanges and the dead-letter queue (idempotent operation).
pub async fn declare_topology(channel: &Channel) -> Result<()> {
    for (name, kind) in exchanges() {
        channel
            .exchange_declare(
                name,
                kind,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|source| PubSubError::Declare {
                kind: "exchange",
                name: name.to_string(),
                source,
            })?;
    }

    channel
        .queue_declare(
            DEAD_LETTER_QUEUE,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(|source| PubSubError::Declare {
            kind: "queue",
            name: DEAD_LETTER_QUEUE.to_string(),
            source,
        })?;

    channel
        .queue_bind(
            DEAD_LETTER_QUEUE,
            EXCHANGE_PERIL_DLX,
            "",
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(|source| PubSubError::Bind {
            queue: DEAD_LETTER_QUEUE.to_string(),
            exchange: EXCHANGE_PERIL_DLX.to_string(),
            key: String::new(),
            source,
        })?;

    info!(
        direct = EXCHANGE_PERIL_DIRECT,
        topic = EXCHANGE_PERIL_TOPIC,
        dead_letter = EXCHANGE_PERIL_DLX,
        "rabbitmq_topology_declared"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_kinds() {
        let exchanges = exchanges();
        assert!(matches!(exchanges[0], ("peril_direct", ExchangeKind::Direct)));
        assert!(matches!(exchanges[1], ("peril_topic", ExchangeKind::Topic)));
        assert!(matches!(exchanges[2], ("peril_dlx", ExchangeKind::Fanout)));
    }
}
