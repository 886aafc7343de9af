//! JSON-RPC 2.0 message types for LSP communication.

use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier reserved for the `initialize` request of every handshake.
pub const INITIALIZE_REQUEST_ID: i64 = 1;

/// First identifier handed out by [`next_request_id`]; keeps the
/// generated range clear of [`INITIALIZE_REQUEST_ID`].
const FIRST_GENERATED_ID: i64 = 1000;

/// Thread-safe request ID generator shared by every adapter in the process.
static REQUEST_ID: AtomicI64 = AtomicI64::new(FIRST_GENERATED_ID);

/// Generates a unique request ID.
///
/// IDs are monotonically increasing, thread-safe, and never reused.
#[must_use]
pub fn next_request_id() -> i64 {
    REQUEST_ID.fetch_add(1, Ordering::SeqCst)
}

/// A JSON-RPC 2.0 request message.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    /// Protocol version, always "2.0".
    pub jsonrpc: &'static str,
    /// Unique request identifier.
    pub id: i64,
    /// The method to invoke.
    pub method: String,
    /// Optional parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Creates a new request with an auto-generated ID.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self::with_id(next_request_id(), method, params)
    }

    /// Creates a new request with a specific ID.
    #[must_use]
    pub fn with_id(id: i64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 notification (no response expected).
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    /// Protocol version, always "2.0".
    pub jsonrpc: &'static str,
    /// The method to invoke.
    pub method: String,
    /// Optional parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Creates a new notification.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 response message.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version.
    #[serde(default)]
    pub jsonrpc: String,
    /// Request identifier this response corresponds to.
    #[serde(default)]
    pub id: Option<i64>,
    /// The result on success.
    #[serde(default)]
    pub result: Option<Value>,
    /// The error on failure.
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional data.
    #[serde(default)]
    pub data: Option<Value>,
}

/// A request the server sends to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerRequest {
    /// Identifier chosen by the server.
    pub id: Value,
    /// Requested method.
    pub method: String,
}

/// A notification pushed by the server, such as diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerNotification {
    /// Notification method.
    pub method: String,
}

/// Any message read from a server.
#[derive(Debug, Clone)]
pub enum JsonRpcMessage {
    /// A reply to one of our requests.
    Response(JsonRpcResponse),
    /// A server-initiated request.
    ServerRequest(ServerRequest),
    /// A server-initiated notification.
    Notification(ServerNotification),
}

impl JsonRpcMessage {
    /// Classifies a frame body.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the body is not a JSON object that
    /// deserializes as a response.
    pub fn from_bytes(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(body)?;
        let method = value.get("method").and_then(Value::as_str).map(str::to_owned);
        match (method, value.get("id")) {
            (Some(method), Some(id)) if !id.is_null() => Ok(Self::ServerRequest(ServerRequest {
                id: id.clone(),
                method,
            })),
            (Some(method), _) => Ok(Self::Notification(ServerNotification { method })),
            (None, _) => serde_json::from_value(value).map(Self::Response),
        }
    }

    /// Identifier of a response, if this is one.
    #[must_use]
    pub fn response_id(&self) -> Option<i64> {
        match self {
            Self::Response(response) => response.id,
            Self::ServerRequest(_) | Self::Notification(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::thread;

    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn serialises_request_with_params() {
        let request = JsonRpcRequest::with_id(
            7,
            "textDocument/completion",
            Some(json!({"textDocument": {"uri": "file:///main.go"}})),
        );
        let json = serde_json::to_string(&request).expect("serialization failed");

        assert!(json.contains(r#""jsonrpc":"2.0""#));
        assert!(json.contains(r#""method":"textDocument/completion""#));
        assert!(json.contains(r#""id":7"#));
        assert!(json.contains(r#""params""#));
    }

    #[rstest]
    fn serialises_request_without_params() {
        let request = JsonRpcRequest::with_id(42, "shutdown", None);
        let json = serde_json::to_string(&request).expect("serialization failed");

        assert!(json.contains(r#""id":42"#));
        assert!(!json.contains("params"));
    }

    #[rstest]
    fn serialises_notification_without_id() {
        let notification = JsonRpcNotification::new("initialized", Some(json!({})));
        let json = serde_json::to_string(&notification).expect("serialization failed");

        assert!(json.contains(r#""method":"initialized""#));
        assert!(!json.contains("\"id\""));
    }

    #[rstest]
    fn generated_ids_never_collide_with_initialize() {
        assert!(next_request_id() >= FIRST_GENERATED_ID);
        assert!(INITIALIZE_REQUEST_ID < FIRST_GENERATED_ID);
    }

    #[rstest]
    fn concurrent_ids_are_distinct_and_increasing() {
        let handles: Vec<_> = (0..8)
            .map(|_| thread::spawn(|| (0..200).map(|_| next_request_id()).collect::<Vec<_>>()))
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            let ids = handle.join().expect("id thread panicked");
            assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
            for id in ids {
                assert!(seen.insert(id), "id {id} issued twice");
            }
        }
        assert_eq!(seen.len(), 1600);
    }

    #[rstest]
    fn classifies_success_response() {
        let message = JsonRpcMessage::from_bytes(br#"{"jsonrpc":"2.0","id":1,"result":{}}"#)
            .expect("parse failed");

        assert_eq!(message.response_id(), Some(1));
    }

    #[rstest]
    fn classifies_error_response() {
        let body = br#"{"jsonrpc":"2.0","id":3,"error":{"code":-32600,"message":"Invalid request"}}"#;

        let JsonRpcMessage::Response(response) =
            JsonRpcMessage::from_bytes(body).expect("parse failed")
        else {
            panic!("expected a response");
        };
        let error = response.error.expect("error missing");
        assert_eq!(error.code, -32600);
        assert_eq!(error.message, "Invalid request");
    }

    #[rstest]
    fn classifies_server_push_traffic() {
        let notification = JsonRpcMessage::from_bytes(
            br#"{"jsonrpc":"2.0","method":"textDocument/publishDiagnostics","params":{}}"#,
        )
        .expect("parse failed");
        let request = JsonRpcMessage::from_bytes(
            br#"{"jsonrpc":"2.0","id":"cfg-1","method":"workspace/configuration","params":{}}"#,
        )
        .expect("parse failed");

        assert!(matches!(notification, JsonRpcMessage::Notification(ref n) if n.method == "textDocument/publishDiagnostics"));
        assert!(matches!(request, JsonRpcMessage::ServerRequest(ref r) if r.id == json!("cfg-1")));
        assert_eq!(request.response_id(), None);
    }

    #[rstest]
    fn rejects_non_json() {
        assert!(JsonRpcMessage::from_bytes(b"not json").is_err());
    }
}
