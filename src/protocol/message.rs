//! Protocol message types.
//!
//! Every frame is a JSON object tagged by `type`. Identifier-carrying
//! variants (`subscribe`, `next`, `error`, `complete`) hold an `id`; the
//! handshake and liveness variants never do.
//!
//! # Format
//!
//! ```json
//! { "type": "subscribe", "id": "1", "payload": { "query": "{ a }" } }
//! { "type": "next", "id": "1", "payload": { "data": { "a": 1 } } }
//! { "type": "complete", "id": "1" }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::identifiers::SubscriptionId;

// ============================================================================
// Types
// ============================================================================

/// Free-form object payload carried by handshake and liveness messages.
pub type Payload = Map<String, Value>;

// ============================================================================
// Message
// ============================================================================

/// A single protocol frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Client asks the server to accept the connection.
    ConnectionInit {
        /// Optional connection parameters.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Payload>,
    },

    /// Server accepted the connection.
    ConnectionAck {
        /// Optional acknowledgement details.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Payload>,
    },

    /// Liveness probe.
    Ping {
        /// Optional probe details.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Payload>,
    },

    /// Answer to a liveness probe.
    Pong {
        /// Optional answer details.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Payload>,
    },

    /// Starts an operation stream.
    Subscribe {
        /// Operation identifier.
        id: SubscriptionId,
        /// Operation to execute.
        payload: SubscribePayload,
    },

    /// One execution result of an operation.
    Next {
        /// Operation identifier.
        id: SubscriptionId,
        /// Execution result.
        payload: ExecutionResult,
    },

    /// Operation failed with errors.
    Error {
        /// Operation identifier.
        id: SubscriptionId,
        /// Errors raised by the operation.
        payload: Vec<GraphQLError>,
    },

    /// Operation finished or was cancelled.
    Complete {
        /// Operation identifier.
        id: SubscriptionId,
    },
}

impl Message {
    /// Returns the wire name of this message's `type`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ConnectionInit { .. } => "connection_init",
            Self::ConnectionAck { .. } => "connection_ack",
            Self::Ping { .. } => "ping",
            Self::Pong { .. } => "pong",
            Self::Subscribe { .. } => "subscribe",
            Self::Next { .. } => "next",
            Self::Error { .. } => "error",
            Self::Complete { .. } => "complete",
        }
    }

    /// Returns the subscription id, for variants that carry one.
    #[must_use]
    pub fn id(&self) -> Option<&SubscriptionId> {
        match self {
            Self::Subscribe { id, .. }
            | Self::Next { id, .. }
            | Self::Error { id, .. }
            | Self::Complete { id } => Some(id),
            _ => None,
        }
    }
}

// ============================================================================
// SubscribePayload
// ============================================================================

/// Executable request parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribePayload {
    /// Name of the operation to run when `query` holds several.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,

    /// GraphQL document.
    pub query: String,

    /// Operation variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Map<String, Value>>,

    /// Protocol extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl SubscribePayload {
    /// Creates a payload for a document with no variables.
    #[inline]
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Sets the operation name.
    #[inline]
    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Sets the operation variables.
    #[inline]
    #[must_use]
    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = Some(variables);
        self
    }
}

// ============================================================================
// ExecutionResult
// ============================================================================

/// Result of executing an operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Result data. `Some(Value::Null)` is an explicit `"data": null`,
    /// `None` an absent field.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Value>,

    /// Field errors raised during execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GraphQLError>>,

    /// Protocol extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl ExecutionResult {
    /// Creates a result carrying only data.
    #[inline]
    #[must_use]
    pub fn with_data(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }
}

/// Keeps an explicit `null` as `Some(Value::Null)`; only a missing field
/// falls back to `None` through `#[serde(default)]`.
fn present_value<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

// ============================================================================
// GraphQLError
// ============================================================================

/// A structured GraphQL error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    /// Human-readable description.
    pub message: String,

    /// Source locations the error refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Location>>,

    /// Response path the error refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,

    /// Implementation-specific details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl GraphQLError {
    /// Creates an error with only a message.
    #[inline]
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: None,
            path: None,
            extensions: None,
        }
    }
}

/// Line/column position inside a GraphQL document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

/// One step of a response path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object field name.
    Field(String),
    /// List index.
    Index(u64),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_complete_serialization() {
        let message = Message::Complete {
            id: SubscriptionId::new("1"),
        };
        let value = serde_json::to_value(&message).expect("serialize");
        assert_eq!(value, json!({ "type": "complete", "id": "1" }));
    }

    #[test]
    fn test_null_data_differs_from_absent_data() {
        let null: ExecutionResult = serde_json::from_value(json!({ "data": null })).expect("null");
        assert_eq!(null.data, Some(Value::Null));

        let absent: ExecutionResult = serde_json::from_value(json!({})).expect("absent");
        assert_eq!(absent.data, None);

        let value = serde_json::to_value(ExecutionResult::with_data(Value::Null)).expect("serialize");
        assert_eq!(value, json!({ "data": null }));
    }

    #[test]
    fn test_ping_without_payload_omits_field() {
        let value = serde_json::to_value(Message::Ping { payload: None }).expect("serialize");
        assert_eq!(value, json!({ "type": "ping" }));
    }

    #[test]
    fn test_subscribe_uses_camel_case() {
        let message = Message::Subscribe {
            id: SubscriptionId::new("7"),
            payload: SubscribePayload::new("subscription { tick }").with_operation_name("Tick"),
        };
        let value = serde_json::to_value(&message).expect("serialize");
        assert_eq!(value["payload"]["operationName"], "Tick");
        assert_eq!(value["payload"]["query"], "subscription { tick }");
    }

    #[test]
    fn test_error_path_segments() {
        let value = json!({ "message": "boom", "path": ["items", 0, "name"] });
        let error: GraphQLError = serde_json::from_value(value).expect("parse");
        assert_eq!(
            error.path,
            Some(vec![
                PathSegment::Field("items".into()),
                PathSegment::Index(0),
                PathSegment::Field("name".into()),
            ])
        );
    }

    #[test]
    fn test_id_accessor() {
        assert_eq!(Message::Ping { payload: None }.id(), None);
        let next = Message::Next {
            id: SubscriptionId::new("x"),
            payload: ExecutionResult::default(),
        };
        assert_eq!(next.id().map(SubscriptionId::as_str), Some("x"));
        assert_eq!(next.type_name(), "next");
    }
}
