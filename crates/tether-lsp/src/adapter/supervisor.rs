//! Subprocess spawning, the initialize handshake, and teardown.

use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use lsp_types::{
    ClientCapabilities, CompletionClientCapabilities, CompletionItemCapability,
    GeneralClientCapabilities, HoverClientCapabilities, InitializeResult, MarkupKind,
    PositionEncodingKind, TextDocumentClientCapabilities, TextDocumentSyncClientCapabilities,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::config::ServerCommand;
use super::error::AdapterError;
use super::inbox::{FrameInbox, Received, spawn_reader};
use super::jsonrpc::{INITIALIZE_REQUEST_ID, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest};
use super::lifecycle::{ADAPTER_TARGET, terminate_child};
use super::transport::write_frame;
use crate::Language;
use crate::config::PollBudget;
use crate::uri::file_uri;

/// A running language server with its pipes and reader thread.
#[derive(Debug)]
pub struct ServerProcess {
    child: Child,
    writer: BufWriter<ChildStdin>,
    inbox: FrameInbox,
    _reader: JoinHandle<()>,
    language: Language,
}

impl ServerProcess {
    /// Spawns the server with piped stdin/stdout and starts its reader.
    ///
    /// Stderr is discarded. Rust creates the pipes close-on-exec, so the
    /// child never holds our ends and EOF is observed as soon as it exits.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::BinaryNotFound`] when the executable does not
    /// exist and [`AdapterError::SpawnFailed`] for any other launch failure.
    pub fn spawn(
        command: &ServerCommand,
        language: Language,
        inbox_capacity: usize,
    ) -> Result<Self, AdapterError> {
        debug!(
            target: ADAPTER_TARGET,
            language = %language,
            command = %command.command.display(),
            args = ?command.args,
            "spawning language server process"
        );

        let mut process = Command::new(&command.command);
        process
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        if let Some(dir) = &command.working_dir {
            process.current_dir(dir);
        }

        let mut child = process.spawn().map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                AdapterError::BinaryNotFound {
                    command: command.command.display().to_string(),
                    source,
                }
            } else {
                AdapterError::SpawnFailed {
                    context: format!("spawning {}", command.command.display()),
                    source,
                }
            }
        })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(AdapterError::SpawnFailed {
                context: String::from("capturing stdio pipes"),
                source: std::io::Error::other("missing stdio handle"),
            });
        };

        let inbox = FrameInbox::new(inbox_capacity);
        let reader = match spawn_reader(stdout, inbox.clone(), language) {
            Ok(handle) => handle,
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AdapterError::SpawnFailed {
                    context: String::from("starting reader thread"),
                    source,
                });
            }
        };

        debug!(
            target: ADAPTER_TARGET,
            language = %language,
            pid = child.id(),
            "language server process spawned"
        );

        Ok(Self {
            child,
            writer: BufWriter::new(stdin),
            inbox,
            _reader: reader,
            language,
        })
    }

    /// Operating-system process id.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Handle onto the frames read from the server.
    #[must_use]
    pub fn inbox(&self) -> &FrameInbox {
        &self.inbox
    }

    /// Writes one frame to the server.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Transport`] when the pipe is broken.
    pub fn send(&mut self, body: &[u8]) -> Result<(), AdapterError> {
        write_frame(&mut self.writer, body)?;
        Ok(())
    }

    /// Runs the initialize/initialized exchange.
    ///
    /// # Errors
    ///
    /// See [`handshake`].
    pub fn handshake(
        &mut self,
        workspace: Option<&Path>,
        budget: PollBudget,
    ) -> Result<(), AdapterError> {
        handshake(&mut self.writer, &self.inbox, workspace, budget, self.language)
    }

    /// Stops the server: `shutdown` request, `exit` notification, close
    /// stdin, then wait up to `grace` before killing it.
    pub fn shutdown(self, grace: Duration) {
        let Self {
            mut child,
            mut writer,
            language,
            ..
        } = self;
        debug!(
            target: ADAPTER_TARGET,
            language = %language,
            pid = child.id(),
            "initiating graceful shutdown"
        );

        let shutdown = JsonRpcRequest::new("shutdown", None);
        let exit = JsonRpcNotification::new("exit", None);
        for (method, body) in [
            ("shutdown", serde_json::to_vec(&shutdown)),
            ("exit", serde_json::to_vec(&exit)),
        ] {
            let sent = body
                .map_err(AdapterError::from)
                .and_then(|body| write_frame(&mut writer, &body).map_err(AdapterError::from));
            if let Err(error) = sent {
                debug!(
                    target: ADAPTER_TARGET,
                    language = %language,
                    method,
                    error = %error,
                    "best-effort shutdown message failed"
                );
            }
        }
        drop(writer);

        terminate_child(&mut child, language, grace);
    }
}

#[derive(Debug, Serialize)]
struct WorkspaceFolderParam {
    uri: String,
    name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeRequestParams {
    process_id: u32,
    position_encoding: PositionEncodingKind,
    root_uri: Option<String>,
    workspace_folders: Option<Vec<WorkspaceFolderParam>>,
    capabilities: ClientCapabilities,
}

fn client_capabilities() -> ClientCapabilities {
    let markup = || vec![MarkupKind::Markdown, MarkupKind::PlainText];
    ClientCapabilities {
        general: Some(GeneralClientCapabilities {
            position_encodings: Some(vec![PositionEncodingKind::UTF8]),
            ..GeneralClientCapabilities::default()
        }),
        text_document: Some(TextDocumentClientCapabilities {
            synchronization: Some(TextDocumentSyncClientCapabilities {
                did_save: Some(true),
                ..TextDocumentSyncClientCapabilities::default()
            }),
            completion: Some(CompletionClientCapabilities {
                completion_item: Some(CompletionItemCapability {
                    snippet_support: Some(true),
                    documentation_format: Some(markup()),
                    ..CompletionItemCapability::default()
                }),
                context_support: Some(true),
                ..CompletionClientCapabilities::default()
            }),
            hover: Some(HoverClientCapabilities {
                content_format: Some(markup()),
                ..HoverClientCapabilities::default()
            }),
            ..TextDocumentClientCapabilities::default()
        }),
        ..ClientCapabilities::default()
    }
}

/// Builds the `initialize` request body.
///
/// # Errors
///
/// Returns the serialization error, which only occurs for non-UTF-8-safe
/// values that cannot appear here in practice.
pub fn initialize_request(workspace: Option<&Path>) -> Result<Vec<u8>, serde_json::Error> {
    let root_uri = workspace.map(file_uri);
    let workspace_folders = workspace.map(|root| {
        let name = root
            .file_name()
            .map_or_else(|| root.display().to_string(), |name| name.to_string_lossy().into_owned());
        vec![WorkspaceFolderParam {
            uri: file_uri(root),
            name,
        }]
    });
    let params = InitializeRequestParams {
        process_id: std::process::id(),
        position_encoding: PositionEncodingKind::UTF8,
        root_uri,
        workspace_folders,
        capabilities: client_capabilities(),
    };
    let request = JsonRpcRequest::with_id(
        INITIALIZE_REQUEST_ID,
        "initialize",
        Some(serde_json::to_value(params)?),
    );
    serde_json::to_vec(&request)
}

/// Sends `initialize`, waits for its result, then sends `initialized`.
///
/// Frames other than the `initialize` reply are discarded. The wait is
/// bounded by the budget's total duration.
///
/// # Errors
///
/// Returns [`AdapterError::HandshakeTimeout`] when no result arrives in
/// time, [`AdapterError::ProcessExited`] when the server closes its output,
/// [`AdapterError::ServerError`] when the server rejects the request, and
/// transport or codec errors from writing.
pub fn handshake<W: Write>(
    writer: &mut W,
    inbox: &FrameInbox,
    workspace: Option<&Path>,
    budget: PollBudget,
    language: Language,
) -> Result<(), AdapterError> {
    write_frame(writer, &initialize_request(workspace)?)?;
    debug!(
        target: ADAPTER_TARGET,
        language = %language,
        workspace = ?workspace,
        "initialize sent"
    );

    let deadline = Instant::now() + budget.total();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(AdapterError::HandshakeTimeout {
                attempts: budget.attempts,
            });
        }
        let frame = match inbox.recv_timeout(remaining.min(budget.interval())) {
            Received::Frame(frame) => frame,
            Received::Timeout => continue,
            Received::Closed => return Err(AdapterError::ProcessExited),
        };
        let message = match JsonRpcMessage::from_bytes(&frame) {
            Ok(message) => message,
            Err(error) => {
                debug!(
                    target: ADAPTER_TARGET,
                    language = %language,
                    error = %error,
                    "discarding unparsable frame during handshake"
                );
                continue;
            }
        };
        if message.response_id() != Some(INITIALIZE_REQUEST_ID) {
            continue;
        }
        let JsonRpcMessage::Response(response) = message else {
            continue;
        };
        if let Some(error) = response.error {
            return Err(AdapterError::from(error));
        }
        let Some(result) = response.result else {
            continue;
        };
        log_server_info(language, result);
        break;
    }

    let initialized = JsonRpcNotification::new("initialized", Some(serde_json::json!({})));
    write_frame(writer, &serde_json::to_vec(&initialized)?)?;
    Ok(())
}

fn log_server_info(language: Language, result: Value) {
    match serde_json::from_value::<InitializeResult>(result) {
        Ok(result) => {
            let trigger_characters = result
                .capabilities
                .completion_provider
                .and_then(|options| options.trigger_characters)
                .unwrap_or_default();
            info!(
                target: ADAPTER_TARGET,
                language = %language,
                server = result.server_info.as_ref().map_or("unknown", |info| info.name.as_str()),
                position_encoding = result
                    .capabilities
                    .position_encoding
                    .as_ref()
                    .map_or("utf-16", |kind| kind.as_str()),
                trigger_characters = ?trigger_characters,
                "language server initialized"
            );
        }
        Err(error) => {
            warn!(
                target: ADAPTER_TARGET,
                language = %language,
                error = %error,
                "initialize result did not match the LSP schema"
            );
        }
    }
}
