//! Queued completion requests and their `textDocument/completion` bodies.

use std::path::PathBuf;
use std::time::Instant;

use lsp_types::{CompletionContext as TriggerContext, CompletionTriggerKind, Position};
use serde::Serialize;

use crate::adapter::JsonRpcRequest;

/// Method name of completion requests.
pub const COMPLETION_METHOD: &str = "textDocument/completion";

/// Bytes that make a completion a trigger-character completion.
const TRIGGER_BYTES: [u8; 3] = [b'.', b':', b'>'];

/// One completion request, from enqueue until it settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Correlation id, also the JSON-RPC request id.
    pub id: i64,
    /// Document the completion is for.
    pub path: PathBuf,
    /// Zero-based line of the completion position.
    pub line: u32,
    /// Zero-based byte column of the completion position.
    pub character: u32,
    /// When the request was queued.
    pub enqueued_at: Instant,
}

impl CompletionRequest {
    /// Creates a request stamped with the current time.
    #[must_use]
    pub fn new(id: i64, path: impl Into<PathBuf>, line: u32, character: u32) -> Self {
        Self {
            id,
            path: path.into(),
            line,
            character,
            enqueued_at: Instant::now(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TextDocumentRef<'a> {
    uri: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequestParams<'a> {
    text_document: TextDocumentRef<'a>,
    position: Position,
    context: TriggerContext,
}

/// Trigger context for a completion preceded by `previous`.
#[must_use]
pub fn trigger_context(previous: Option<u8>) -> TriggerContext {
    match previous.filter(|byte| TRIGGER_BYTES.contains(byte)) {
        Some(byte) => TriggerContext {
            trigger_kind: CompletionTriggerKind::TRIGGER_CHARACTER,
            trigger_character: Some(char::from(byte).to_string()),
        },
        None => TriggerContext {
            trigger_kind: CompletionTriggerKind::INVOKED,
            trigger_character: None,
        },
    }
}

/// Serializes a `textDocument/completion` request.
///
/// # Errors
///
/// Returns the serialization error.
pub fn completion_body(
    id: i64,
    uri: &str,
    position: Position,
    previous: Option<u8>,
) -> Result<Vec<u8>, serde_json::Error> {
    let params = CompletionRequestParams {
        text_document: TextDocumentRef { uri },
        position,
        context: trigger_context(previous),
    };
    let request = JsonRpcRequest::with_id(id, COMPLETION_METHOD, Some(serde_json::to_value(params)?));
    serde_json::to_vec(&request)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;

    #[rstest]
    #[case(Some(b'.'), 2, Some("."))]
    #[case(Some(b':'), 2, Some(":"))]
    #[case(Some(b'>'), 2, Some(">"))]
    #[case(Some(b'a'), 1, None)]
    #[case(None, 1, None)]
    fn chooses_trigger_kind(
        #[case] previous: Option<u8>,
        #[case] kind: i32,
        #[case] character: Option<&str>,
    ) {
        let context = trigger_context(previous);

        assert_eq!(
            serde_json::to_value(context.trigger_kind).expect("kind serializes"),
            json!(kind)
        );
        assert_eq!(context.trigger_character.as_deref(), character);
    }

    #[rstest]
    fn builds_completion_request() {
        let body = completion_body(1042, "file:///tmp/a%20b.luau", Position::new(3, 7), Some(b'.'))
            .expect("body serializes");
        let value: Value = serde_json::from_slice(&body).expect("valid json");

        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 1042);
        assert_eq!(value["method"], COMPLETION_METHOD);
        assert_eq!(value["params"]["textDocument"]["uri"], "file:///tmp/a%20b.luau");
        assert_eq!(value["params"]["position"], json!({ "line": 3, "character": 7 }));
        assert_eq!(value["params"]["context"]["triggerKind"], 2);
        assert_eq!(value["params"]["context"]["triggerCharacter"], ".");
    }
}
