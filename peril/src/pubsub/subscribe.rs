//! Typed consumers with acknowledgment routing.
//!
//! [`subscribe`] binds a queue, applies a prefetch limit and spawns one
//! listener task. Every delivery is decoded, handed to the caller's handler
//! and then resolved with the broker according to the returned [`AckType`].

use std::future::Future;

use futures::StreamExt;
use lapin::{
    acker::Acker,
    options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions},
    types::FieldTable,
    Connection,
};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::codec::{BincodeCodec, Codec, JsonCodec};
use super::declare::{declare_and_bind, QueueType};
use super::error::{PubSubError, Result};

/// Decision a handler returns for one delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckType {
    /// Processed; remove from the queue.
    Ack,
    /// Not processed here; put it back for another consumer.
    NackRequeue,
    /// Invalid; drop it (dead-lettered by the broker).
    NackDiscard,
}

/// Settles a delivery with the broker.
///
/// Implemented for lapin's [`Acker`]; kept as a trait so the routing in
/// [`settle`] and [`dispatch`] can be exercised without a broker.
pub trait Acknowledger {
    fn ack(&self) -> impl Future<Output = lapin::Result<()>> + Send;

    fn nack(&self, requeue: bool) -> impl Future<Output = lapin::Result<()>> + Send;
}

impl Acknowledger for Acker {
    fn ack(&self) -> impl Future<Output = lapin::Result<()>> + Send {
        Acker::ack(self, BasicAckOptions::default())
    }

    fn nack(&self, requeue: bool) -> impl Future<Output = lapin::Result<()>> + Send {
        Acker::nack(
            self,
            BasicNackOptions {
                requeue,
                ..Default::default()
            },
        )
    }
}

/// Resolve a delivery according to `ack_type`.
pub async fn settle<A: Acknowledger>(acker: &A, ack_type: AckType) -> lapin::Result<()> {
    match ack_type {
        AckType::Ack => acker.ack().await,
        AckType::NackRequeue => acker.nack(true).await,
        AckType::NackDiscard => acker.nack(false).await,
    }
}

/// Decode one payload, run the handler and settle the delivery.
///
/// A payload that fails to decode never reaches the handler and is
/// rejected without requeue so it lands in the dead-letter queue instead of
/// sitting unacknowledged. Returns the decision that was applied.
pub async fn dispatch<C, T, F, Fut, A>(data: &[u8], handler: &F, acker: &A) -> AckType
where
    C: Codec,
    T: DeserializeOwned,
    F: Fn(T) -> Fut,
    Fut: Future<Output = AckType>,
    A: Acknowledger,
{
    let ack_type = match C::decode::<T>(data) {
        Ok(message) => handler(message).await,
        Err(e) => {
            error!(
                error = %e,
                message_type = std::any::type_name::<T>(),
                body_length = data.len(),
                "rabbitmq_message_decode_failed"
            );
            AckType::NackDiscard
        }
    };

    if let Err(e) = settle(acker, ack_type).await {
        error!(ack_type = ?ack_type, error = %e, "rabbitmq_settle_failed");
    }

    ack_type
}

/// Options for a single subscription.
#[derive(Debug, Clone)]
pub struct Subscription<'a> {
    pub exchange: &'a str,
    pub queue_name: &'a str,
    pub key: &'a str,
    pub queue_type: QueueType,
    pub prefetch_count: u16,
}

/// Bind a queue and consume it with a typed handler on a background task.
///
/// The returned task runs until the consumer stream closes or `shutdown`
/// flips to `true`. Shutdown is only observed between deliveries; a message
/// already being handled is always settled first.
pub async fn subscribe<C, T, F, Fut>(
    conn: &Connection,
    subscription: Subscription<'_>,
    mut shutdown: watch::Receiver<bool>,
    handler: F,
) -> Result<JoinHandle<()>>
where
    C: Codec,
    T: DeserializeOwned + Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AckType> + Send + 'static,
{
    let (channel, queue) = declare_and_bind(
        conn,
        subscription.exchange,
        subscription.queue_name,
        subscription.key,
        subscription.queue_type,
    )
    .await?;

    channel
        .basic_qos(subscription.prefetch_count, BasicQosOptions::default())
        .await
        .map_err(PubSubError::Qos)?;

    let queue_name = queue.name().as_str().to_string();
    let mut consumer = channel
        .basic_consume(
            &queue_name,
            "",
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(|source| PubSubError::Consume {
            queue: queue_name.clone(),
            source,
        })?;

    info!(
        queue = %queue_name,
        content_type = C::CONTENT_TYPE,
        prefetch_count = subscription.prefetch_count,
        "subscription_started"
    );

    let handle = tokio::spawn(async move {
        // Keeps the consumer's channel open for the life of the task.
        let _channel = channel;

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                delivery = consumer.next() => {
                    match delivery {
                        Some(Ok(delivery)) => {
                            dispatch::<C, T, _, _, _>(&delivery.data, &handler, &delivery.acker).await;
                        }
                        Some(Err(e)) => {
                            error!(queue = %queue_name, error = %e, "rabbitmq_delivery_error");
                        }
                        None => {
                            warn!(queue = %queue_name, "rabbitmq_consumer_closed");
                            break;
                        }
                    }
                }
            }
        }

        info!(queue = %queue_name, "subscription_stopped");
    });

    Ok(handle)
}

/// [`subscribe`] with JSON payloads.
pub async fn subscribe_json<T, F, Fut>(
    conn: &Connection,
    subscription: Subscription<'_>,
    shutdown: watch::Receiver<bool>,
    handler: F,
) -> Result<JoinHandle<()>>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AckType> + Send + 'static,
{
    subscribe::<JsonCodec, T, F, Fut>(conn, subscription, shutdown, handler).await
}

/// [`subscribe`] with bincode payloads.
pub async fn subscribe_bincode<T, F, Fut>(
    conn: &Connection,
    subscription: Subscription<'_>,
    shutdown: watch::Receiver<bool>,
    handler: F,
) -> Result<JoinHandle<()>>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AckType> + Send + 'static,
{
    subscribe::<BincodeCodec, T, F, Fut>(conn, subscription, shutdown, handler).await
}
