//! Frame codec.
//!
//! [`decode`] turns a raw text payload into a [`Message`] or a
//! [`DecodeError`]; it never panics. [`encode`] is its inverse for
//! well-formed messages.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::Result;

use super::Message;

// ============================================================================
// Constants
// ============================================================================

/// Every `type` value this protocol defines.
pub const MESSAGE_TYPES: [&str; 8] = [
    "connection_init",
    "connection_ack",
    "ping",
    "pong",
    "subscribe",
    "next",
    "error",
    "complete",
];

/// Types that must carry an `id`.
const ID_TYPES: [&str; 4] = ["subscribe", "next", "error", "complete"];

// ============================================================================
// DecodeError
// ============================================================================

/// An inbound frame that is not a valid protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid message: {reason}")]
pub struct DecodeError {
    reason: String,
}

impl DecodeError {
    /// Creates a decode error with a human-readable reason.
    #[inline]
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Returns the reason the frame was rejected.
    #[inline]
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

// ============================================================================
// Decode / Encode
// ============================================================================

/// Decodes one raw frame.
///
/// # Errors
///
/// Returns [`DecodeError`] for non-JSON input, non-object JSON, a missing or
/// unrecognized `type`, and variants whose `id` or `payload` has the wrong
/// shape.
pub fn decode(raw: &str) -> std::result::Result<Message, DecodeError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| DecodeError::new(format!("malformed JSON: {e}")))?;

    let Value::Object(object) = &value else {
        return Err(DecodeError::new("frame is not a JSON object"));
    };

    let type_name = match object.get("type") {
        Some(Value::String(name)) => name.clone(),
        Some(_) => return Err(DecodeError::new("`type` is not a string")),
        None => return Err(DecodeError::new("missing `type` field")),
    };

    if !MESSAGE_TYPES.contains(&type_name.as_str()) {
        return Err(DecodeError::new(format!(
            "unknown message type `{type_name}`"
        )));
    }

    validate_shape(&type_name, object)?;

    serde_json::from_value(value)
        .map_err(|e| DecodeError::new(format!("invalid `{type_name}` message: {e}")))
}

/// Encodes a message as a JSON text frame.
///
/// # Errors
///
/// Returns [`crate::Error::Json`] if serialization fails.
pub fn encode(message: &Message) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

/// Checks the structural rules serde alone does not enforce.
fn validate_shape(
    type_name: &str,
    object: &Map<String, Value>,
) -> std::result::Result<(), DecodeError> {
    if ID_TYPES.contains(&type_name) {
        match object.get("id") {
            Some(Value::String(id)) if !id.is_empty() => {}
            Some(Value::String(_)) => {
                return Err(DecodeError::new(format!(
                    "`{type_name}` message has an empty `id`"
                )));
            }
            Some(_) => {
                return Err(DecodeError::new(format!(
                    "`{type_name}` message `id` is not a string"
                )));
            }
            None => {
                return Err(DecodeError::new(format!(
                    "`{type_name}` message is missing `id`"
                )));
            }
        }
    }

    match (type_name, object.get("payload")) {
        ("next", Some(Value::Object(_))) => Ok(()),
        ("next", _) => Err(DecodeError::new(
            "`next` message payload is not an object",
        )),
        ("error", Some(Value::Array(errors))) if errors.is_empty() => Err(DecodeError::new(
            "`error` message payload is an empty list",
        )),
        ("error", Some(Value::Array(errors))) => {
            let all_have_message = errors
                .iter()
                .all(|e| e.get("message").is_some_and(Value::is_string));
            if all_have_message {
                Ok(())
            } else {
                Err(DecodeError::new(
                    "`error` message payload holds an error without a `message`",
                ))
            }
        }
        ("error", _) => Err(DecodeError::new(
            "`error` message payload is not a list",
        )),
        _ => Ok(()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    use crate::identifiers::SubscriptionId;
    use crate::protocol::{ExecutionResult, GraphQLError, Location, SubscribePayload};

    fn sample_messages() -> Vec<Message> {
        let id = SubscriptionId::new("op-1");
        let mut payload = Map::new();
        payload.insert("token".into(), json!("secret"));

        vec![
            Message::ConnectionInit {
                payload: Some(payload.clone()),
            },
            Message::ConnectionAck { payload: None },
            Message::Ping {
                payload: Some(Map::new()),
            },
            Message::Pong { payload: None },
            Message::Subscribe {
                id: id.clone(),
                payload: SubscribePayload::new("subscription { tick }")
                    .with_operation_name("Tick")
                    .with_variables(payload),
            },
            Message::Next {
                id: id.clone(),
                payload: ExecutionResult::with_data(json!({ "a": 1 })),
            },
            Message::Next {
                id: id.clone(),
                payload: ExecutionResult {
                    errors: Some(vec![GraphQLError::new("partial")]),
                    ..ExecutionResult::with_data(Value::Null)
                },
            },
            Message::Next {
                id: id.clone(),
                payload: ExecutionResult::default(),
            },
            Message::Error {
                id: id.clone(),
                payload: vec![GraphQLError {
                    locations: Some(vec![Location { line: 1, column: 3 }]),
                    ..GraphQLError::new("boom")
                }],
            },
            Message::Complete { id },
        ]
    }

    #[test]
    fn test_round_trip_every_variant() {
        for message in sample_messages() {
            let raw = encode(&message).expect("encode");
            assert_eq!(decode(&raw).expect("decode"), message, "frame: {raw}");
        }
    }

    #[test]
    fn test_malformed_json() {
        let err = decode("{not json").unwrap_err();
        assert!(err.reason().starts_with("malformed JSON"));
    }

    #[test]
    fn test_non_object() {
        assert!(decode("[1, 2]").is_err());
        assert!(decode("\"ping\"").is_err());
    }

    #[test]
    fn test_missing_type() {
        let err = decode(r#"{"id": "1"}"#).unwrap_err();
        assert_eq!(err.reason(), "missing `type` field");
    }

    #[test]
    fn test_unknown_type() {
        let err = decode(r#"{"type": "start", "id": "1"}"#).unwrap_err();
        assert_eq!(err.reason(), "unknown message type `start`");
    }

    #[test]
    fn test_id_required() {
        assert!(decode(r#"{"type": "complete"}"#).is_err());
        assert!(decode(r#"{"type": "complete", "id": ""}"#).is_err());
        assert!(decode(r#"{"type": "complete", "id": 5}"#).is_err());
    }

    #[test]
    fn test_payload_shapes() {
        assert!(decode(r#"{"type": "next", "id": "1"}"#).is_err());
        assert!(decode(r#"{"type": "next", "id": "1", "payload": [1]}"#).is_err());
        assert!(decode(r#"{"type": "error", "id": "1", "payload": []}"#).is_err());
        assert!(decode(r#"{"type": "error", "id": "1", "payload": [{"code": 1}]}"#).is_err());
        assert!(decode(r#"{"type": "subscribe", "id": "1", "payload": {}}"#).is_err());
        assert!(decode(r#"{"type": "ping", "payload": 3}"#).is_err());
    }

    #[test]
    fn test_null_payload_is_absent() {
        let message = decode(r#"{"type": "ping", "payload": null}"#).expect("decode");
        assert_eq!(message, Message::Ping { payload: None });
    }

    #[test]
    fn test_error_display() {
        let err = DecodeError::new("bad");
        assert_eq!(err.to_string(), "invalid message: bad");
    }

    proptest! {
        #[test]
        fn test_decode_never_panics(raw in ".*") {
            let _ = decode(&raw);
        }

        #[test]
        fn test_next_round_trip(
            id in "[a-zA-Z0-9-]{1,36}",
            n in any::<i64>(),
            field in "[a-z]{1,8}",
            shape in 0u8..3,
        ) {
            let payload = match shape {
                0 => {
                    let mut data = Map::new();
                    data.insert(field, json!(n));
                    ExecutionResult::with_data(Value::Object(data))
                }
                1 => ExecutionResult::with_data(Value::Null),
                _ => ExecutionResult::default(),
            };
            let message = Message::Next {
                id: SubscriptionId::new(id),
                payload,
            };
            let raw = encode(&message).expect("encode");
            prop_assert_eq!(decode(&raw).expect("decode"), message);
        }
    }
}
