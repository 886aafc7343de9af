//! Document synchronisation notifications.
//!
//! Each notification selects the adapter for the file, initializes it on
//! first use, and sends the JSON-RPC notification through the shared
//! manager. `didChange` is debounced: an identical buffer resent within the
//! debounce window is not forwarded.

use std::path::{Path, PathBuf};
use std::sync::MutexGuard;
use std::time::{Duration, Instant};

use serde_json::{Value, json};
use tracing::{debug, trace, warn};

use crate::adapter::JsonRpcNotification;
use crate::config::ClientConfig;
use crate::manager::{LspManager, SharedManager, lock_manager};
use crate::uri::{file_uri, workspace_root_for};

/// Log target for document synchronisation.
pub(crate) const SYNC_TARGET: &str = "tether_lsp::sync";

/// Version reported by `didOpen`.
const OPEN_VERSION: i32 = 1;

#[derive(Debug)]
struct LastChange {
    path: PathBuf,
    content: String,
    at: Instant,
}

/// Emits `didOpen`, `didChange`, `didSave`, and `didClose`.
#[derive(Debug)]
pub struct DocumentSync {
    manager: SharedManager,
    debounce: Duration,
    last_change: Option<LastChange>,
}

impl DocumentSync {
    /// Creates a dispatcher with an explicit debounce window.
    #[must_use]
    pub fn new(manager: SharedManager, debounce: Duration) -> Self {
        Self {
            manager,
            debounce,
            last_change: None,
        }
    }

    /// Creates a dispatcher using the configured debounce window.
    #[must_use]
    pub fn from_config(manager: SharedManager, config: &ClientConfig) -> Self {
        Self::new(manager, config.debounce())
    }

    /// Announces an opened document. Returns whether it was sent.
    pub fn did_open(&mut self, path: &Path, content: &str) -> bool {
        let Some(mut manager) = self.ready_manager(path) else {
            return false;
        };
        let params = json!({
            "textDocument": {
                "uri": file_uri(path),
                "languageId": manager.language_id(path),
                "version": OPEN_VERSION,
                "text": content,
            }
        });
        send(&mut manager, "textDocument/didOpen", params)
    }

    /// Sends the full new content of a document.
    ///
    /// Returns `false` without sending when the same content for the same
    /// file was sent less than the debounce window ago.
    pub fn did_change(&mut self, path: &Path, version: i32, content: &str) -> bool {
        let now = Instant::now();
        if let Some(last) = &self.last_change {
            if now.duration_since(last.at) < self.debounce
                && last.path == path
                && last.content == content
            {
                trace!(
                    target: SYNC_TARGET,
                    path = %path.display(),
                    version,
                    "didChange debounced"
                );
                return false;
            }
        }
        self.last_change = Some(LastChange {
            path: path.to_path_buf(),
            content: content.to_owned(),
            at: now,
        });

        let Some(mut manager) = self.ready_manager(path) else {
            return false;
        };
        let params = json!({
            "textDocument": { "uri": file_uri(path), "version": version },
            "contentChanges": [ { "text": content } ],
        });
        send(&mut manager, "textDocument/didChange", params)
    }

    /// Announces a save, including the saved text when supplied.
    pub fn did_save(&mut self, path: &Path, content: Option<&str>) -> bool {
        let Some(mut manager) = self.ready_manager(path) else {
            return false;
        };
        let mut params = json!({ "textDocument": { "uri": file_uri(path) } });
        if let (Some(text), Some(object)) = (content, params.as_object_mut()) {
            object.insert(String::from("text"), Value::from(text));
        }
        send(&mut manager, "textDocument/didSave", params)
    }

    /// Announces a closed document.
    pub fn did_close(&mut self, path: &Path) -> bool {
        let Some(mut manager) = self.ready_manager(path) else {
            return false;
        };
        let params = json!({ "textDocument": { "uri": file_uri(path) } });
        send(&mut manager, "textDocument/didClose", params)
    }

    /// Selects the adapter for `path` and initializes it when needed,
    /// deriving the workspace from the file's directory if none is set.
    fn ready_manager(&self, path: &Path) -> Option<MutexGuard<'_, LspManager>> {
        let mut manager = lock_manager(&self.manager);
        if !manager.select_adapter_for_file(path) {
            return None;
        }
        if !manager.is_initialized() {
            let workspace = manager
                .workspace()
                .map_or_else(|| workspace_root_for(path), Path::to_path_buf);
            if !manager.initialize(&workspace) {
                debug!(
                    target: SYNC_TARGET,
                    path = %path.display(),
                    workspace = %workspace.display(),
                    "adapter not ready for document"
                );
                return None;
            }
        }
        Some(manager)
    }
}

fn send(manager: &mut LspManager, method: &'static str, params: Value) -> bool {
    let notification = JsonRpcNotification::new(method, Some(params));
    let body = match serde_json::to_vec(&notification) {
        Ok(body) => body,
        Err(error) => {
            warn!(target: SYNC_TARGET, method, error = %error, "failed to encode notification");
            return false;
        }
    };
    let sent = manager.send_request(&body);
    debug!(target: SYNC_TARGET, method, sent, "document notification");
    sent
}
