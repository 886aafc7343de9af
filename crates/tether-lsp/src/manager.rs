//! Registry of per-language adapters with one active selection.
//!
//! The manager owns one adapter per language and tracks which one is
//! active for the file being edited. Every fallible step is logged and
//! reduced to `false`/`None`, so the editor stays usable with no working
//! server at all.
//!
//! Callers on other threads share the manager as a [`SharedManager`]. The
//! completion worker uses the language-scoped operations
//! ([`LspManager::is_ready`], [`LspManager::send_to`],
//! [`LspManager::responses`]) so a concurrent switch of the active adapter
//! cannot redirect a request already in flight.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::adapter::{FrameInbox, ProcessAdapter};
use crate::config::ClientConfig;
use crate::errors::ManagerError;
use crate::language::Language;
use crate::server::LanguageAdapter;

/// Log target for manager operations.
pub(crate) const MANAGER_TARGET: &str = "tether_lsp::manager";

/// Language id reported when no adapter is active.
pub const PLAINTEXT_LANGUAGE_ID: &str = "plaintext";

/// Manager shared between the editor thread and the completion worker.
pub type SharedManager = Arc<Mutex<LspManager>>;

/// Locks a shared manager, recovering from poisoning.
pub fn lock_manager(manager: &SharedManager) -> MutexGuard<'_, LspManager> {
    manager.lock().unwrap_or_else(|poison| poison.into_inner())
}

/// Selects, initializes, and delegates to per-language adapters.
#[derive(Debug, Default)]
pub struct LspManager {
    adapters: HashMap<Language, Box<dyn LanguageAdapter>>,
    active: Option<Language>,
    workspace: Option<PathBuf>,
}

impl LspManager {
    /// Builds an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a manager holding the built-in process adapter for every
    /// language, with configured overrides applied.
    #[must_use]
    pub fn with_defaults(config: &ClientConfig) -> Self {
        let mut manager = Self::new();
        for language in Language::ALL {
            manager
                .adapters
                .insert(language, Box::new(ProcessAdapter::for_language(language, config)));
        }
        manager
    }

    /// Wraps the manager for sharing across threads.
    #[must_use]
    pub fn into_shared(self) -> SharedManager {
        Arc::new(Mutex::new(self))
    }

    /// Registers an adapter under the language it reports.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::DuplicateLanguage`] when the language already
    /// has an adapter.
    pub fn register(&mut self, adapter: Box<dyn LanguageAdapter>) -> Result<(), ManagerError> {
        let language = adapter.language();
        if self.adapters.contains_key(&language) {
            return Err(ManagerError::duplicate(language));
        }
        self.adapters.insert(language, adapter);
        Ok(())
    }

    /// Registered language whose adapter serves `path`.
    #[must_use]
    pub fn language_for(&self, path: &Path) -> Option<Language> {
        Language::from_path(path).filter(|language| self.adapters.contains_key(language))
    }

    /// Makes the adapter for `path` active.
    ///
    /// Returns `false` and leaves the active adapter unchanged when the
    /// extension is not recognised. Switching away from an adapter does not
    /// stop its server.
    pub fn select_adapter_for_file(&mut self, path: &Path) -> bool {
        let Some(language) = Language::from_path(path) else {
            debug!(
                target: MANAGER_TARGET,
                path = %path.display(),
                "no adapter for file extension"
            );
            return false;
        };
        if !self.adapters.contains_key(&language) {
            let error = ManagerError::unknown(language);
            debug!(target: MANAGER_TARGET, error = %error, "cannot select adapter");
            return false;
        }
        if self.active != Some(language) {
            info!(
                target: MANAGER_TARGET,
                from = ?self.active,
                to = %language,
                "switching active adapter"
            );
            self.active = Some(language);
        }
        true
    }

    /// Initializes the active adapter for `workspace`.
    ///
    /// Returns `true` at once when the adapter is already ready. Returns
    /// `false` for an empty workspace path, when no adapter is active, or
    /// when the handshake fails; a failed adapter may be retried later.
    pub fn initialize(&mut self, workspace: &Path) -> bool {
        if workspace.as_os_str().is_empty() {
            return false;
        }
        self.workspace = Some(workspace.to_path_buf());
        let Some(adapter) = self.active_adapter_mut() else {
            return false;
        };
        if adapter.is_initialized() {
            return true;
        }
        let language = adapter.language();
        match adapter.initialize(workspace) {
            Ok(()) => {
                info!(
                    target: MANAGER_TARGET,
                    language = %language,
                    workspace = %workspace.display(),
                    "adapter initialized"
                );
                true
            }
            Err(error) => {
                warn!(
                    target: MANAGER_TARGET,
                    language = %language,
                    error = %error,
                    "adapter initialization failed"
                );
                false
            }
        }
    }

    /// Whether the active adapter is ready.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.active_adapter()
            .is_some_and(|adapter| adapter.is_initialized())
    }

    /// Whether any registered adapter is ready.
    #[must_use]
    pub fn has_working_adapter(&self) -> bool {
        self.adapters.values().any(|adapter| adapter.is_initialized())
    }

    /// Whether the adapter for `language` is ready.
    #[must_use]
    pub fn is_ready(&self, language: Language) -> bool {
        self.adapters
            .get(&language)
            .is_some_and(|adapter| adapter.is_initialized())
    }

    /// Sends a framed message through the active adapter.
    pub fn send_request(&mut self, body: &[u8]) -> bool {
        match self.active {
            Some(language) => self.send_to(language, body),
            None => false,
        }
    }

    /// Sends a framed message through the adapter for `language`.
    pub fn send_to(&mut self, language: Language, body: &[u8]) -> bool {
        let Some(adapter) = self.adapters.get_mut(&language) else {
            return false;
        };
        match adapter.send(body) {
            Ok(()) => true,
            Err(error) => {
                warn!(
                    target: MANAGER_TARGET,
                    language = %language,
                    error = %error,
                    "send failed"
                );
                false
            }
        }
    }

    /// Waits up to `timeout` for the next frame from the active adapter.
    ///
    /// The frame is taken from the same inbox a [`CompletionEngine`] waits
    /// on, so it is no longer visible to the worker. Do not call this while
    /// a completion for the active language is in flight; the worker would
    /// miss its reply and time out.
    ///
    /// [`CompletionEngine`]: crate::completion::CompletionEngine
    pub fn read_response(&mut self, timeout: Duration) -> Option<Vec<u8>> {
        let adapter = self.active_adapter_mut()?;
        match adapter.read_response(timeout) {
            Ok(frame) => frame,
            Err(error) => {
                debug!(
                    target: MANAGER_TARGET,
                    language = %adapter.language(),
                    error = %error,
                    "read failed"
                );
                None
            }
        }
    }

    /// Inbox of the ready adapter for `language`.
    #[must_use]
    pub fn responses(&self, language: Language) -> Option<FrameInbox> {
        self.adapters
            .get(&language)
            .and_then(|adapter| adapter.responses())
    }

    /// LSP `languageId` for `path` according to the active adapter.
    #[must_use]
    pub fn language_id(&self, path: &Path) -> &'static str {
        self.active_adapter()
            .map_or(PLAINTEXT_LANGUAGE_ID, |adapter| adapter.language_id(path))
    }

    /// Language of the active adapter.
    #[must_use]
    pub fn active_language(&self) -> Option<Language> {
        self.active
    }

    /// Workspace root of the last initialization.
    #[must_use]
    pub fn workspace(&self) -> Option<&Path> {
        self.workspace.as_deref()
    }

    /// Adapter registered for `language`.
    #[must_use]
    pub fn adapter(&self, language: Language) -> Option<&dyn LanguageAdapter> {
        self.adapters.get(&language).map(|adapter| &**adapter)
    }

    /// Stops every running server.
    pub fn shutdown(&mut self) {
        for (language, adapter) in &mut self.adapters {
            if adapter.is_initialized() {
                debug!(target: MANAGER_TARGET, language = %language, "stopping adapter");
            }
            adapter.shutdown();
        }
    }

    fn active_adapter(&self) -> Option<&dyn LanguageAdapter> {
        self.active.and_then(|language| self.adapter(language))
    }

    fn active_adapter_mut(&mut self) -> Option<&mut Box<dyn LanguageAdapter>> {
        let language = self.active?;
        self.adapters.get_mut(&language)
    }
}
