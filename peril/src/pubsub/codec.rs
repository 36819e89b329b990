//! Payload encodings for published messages.
//!
//! A [`Codec`] turns a typed value into bytes plus a content-type label and
//! back again. Two encodings live side by side and are picked at the call
//! site through a type parameter:
//!
//! - [`JsonCodec`]: self-describing text, readable from any language
//! - [`BincodeCodec`]: compact binary, Rust-to-Rust only

use serde::{de::DeserializeOwned, Serialize};

/// Errors produced while encoding or decoding a payload.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to encode {content_type} payload: {reason}")]
    Encode {
        content_type: &'static str,
        reason: String,
    },

    #[error("failed to decode {content_type} payload: {reason}")]
    Decode {
        content_type: &'static str,
        reason: String,
    },
}

/// A serialization strategy for message payloads.
pub trait Codec: Send + Sync + 'static {
    /// Value stamped into the AMQP `content-type` property.
    const CONTENT_TYPE: &'static str;

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError>;

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError>;
}

/// JSON encoding via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    const CONTENT_TYPE: &'static str = "application/json";

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Encode {
            content_type: Self::CONTENT_TYPE,
            reason: e.to_string(),
        })
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode {
            content_type: Self::CONTENT_TYPE,
            reason: e.to_string(),
        })
    }
}

/// Binary encoding via `bincode`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    const CONTENT_TYPE: &'static str = "application/x-bincode";

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(value).map_err(|e| CodecError::Encode {
            content_type: Self::CONTENT_TYPE,
            reason: e.to_string(),
        })
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Decode {
            content_type: Self::CONTENT_TYPE,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamelogic::{ArmyMove, Location, Player, Unit, UnitRank};
    use crate::routing::{GameLog, PlayingState};

    fn sample_move() -> ArmyMove {
        let mut player = Player::new("alice");
        player.units.insert(
            1,
            Unit {
                id: 1,
                rank: UnitRank::Cavalry,
                location: Location::Europe,
            },
        );
        ArmyMove {
            units: player.units.values().cloned().collect(),
            player,
            to_location: Location::Asia,
        }
    }

    #[test]
    fn test_json_round_trip() {
        let mv = sample_move();
        let bytes = JsonCodec::encode(&mv).unwrap();
        let decoded: ArmyMove = JsonCodec::decode(&bytes).unwrap();
        assert_eq!(decoded, mv);
    }

    #[test]
    fn test_bincode_round_trip() {
        let log = GameLog::new("bob", "bob won a war against alice");
        let bytes = BincodeCodec::encode(&log).unwrap();
        let decoded: GameLog = BincodeCodec::decode(&bytes).unwrap();
        assert_eq!(decoded, log);
    }

    #[test]
    fn test_bincode_smaller_than_json() {
        let mv = sample_move();
        let json = JsonCodec::encode(&mv).unwrap();
        let bin = BincodeCodec::encode(&mv).unwrap();
        assert!(bin.len() < json.len());
    }

    #[test]
    fn test_pause_wire_format() {
        let bytes = JsonCodec::encode(&PlayingState { is_paused: true }).unwrap();
        assert_eq!(bytes, br#"{"isPaused":true}"#);
    }

    #[test]
    fn test_decode_failure_reported() {
        let err = JsonCodec::decode::<PlayingState>(b"{not json").unwrap_err();
        assert!(matches!(err, CodecError::Decode { content_type: "application/json", .. }));

        let err = BincodeCodec::decode::<GameLog>(&[0xff]).unwrap_err();
        assert!(matches!(err, CodecError::Decode { .. }));
    }
}
