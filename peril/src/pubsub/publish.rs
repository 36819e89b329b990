//! Publishing typed values to an exchange.

use lapin::{options::BasicPublishOptions, BasicProperties, Channel};
use serde::Serialize;
use tracing::debug;

use super::codec::{BincodeCodec, Codec, JsonCodec};
use super::error::{PubSubError, Result};

/// Encode `value` with `C` and publish it to `exchange` under `key`.
///
/// The content type is taken from the codec so consumers can tell the two
/// encodings apart on the wire.
pub async fn publish<C, T>(channel: &Channel, exchange: &str, key: &str, value: &T) -> Result<()>
where
    C: Codec,
    T: Serialize,
{
    let body = C::encode(value)?;

    let publish_error = |source| PubSubError::Publish {
        exchange: exchange.to_string(),
        key: key.to_string(),
        source,
    };

    channel
        .basic_publish(
            exchange,
            key,
            BasicPublishOptions::default(),
            &body,
            BasicProperties::default().with_content_type(C::CONTENT_TYPE.into()),
        )
        .await
        .map_err(publish_error)?
        .await
        .map_err(publish_error)?;

    debug!(
        exchange = exchange,
        key = key,
        content_type = C::CONTENT_TYPE,
        body_length = body.len(),
        "rabbitmq_message_published"
    );

    Ok(())
}

/// Publish `value` as JSON.
pub async fn publish_json<T>(channel: &Channel, exchange: &str, key: &str, value: &T) -> Result<()>
where
    T: Serialize,
{
    publish::<JsonCodec, T>(channel, exchange, key, value).await
}

/// Publish `value` as bincode.
pub async fn publish_bincode<T>(channel: &Channel, exchange: &str, key: &str, value: &T) -> Result<()>
where
    T: Serialize,
{
    publish::<BincodeCodec, T>(channel, exchange, key, value).await
}
