//! Shared fixtures and helpers for crate-level tests.

mod document;
mod recording_adapter;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rstest::fixture;

use crate::completion::CompletionEngine;
use crate::config::{ClientConfig, PollBudget};
use crate::language::Language;
use crate::manager::{LspManager, SharedManager, lock_manager};

pub use document::MemoryDocument;
pub use recording_adapter::{RecordingAdapter, RecordingHandle, Reply};

/// Generous bound for waits on the completion worker.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Workspace root used by tests.
pub fn workspace() -> PathBuf {
    PathBuf::from("/workspace/game")
}

/// Path of a document inside [`workspace`].
pub fn document_path(name: &str) -> PathBuf {
    workspace().join(name)
}

/// Manager holding recording adapters plus handles onto them.
pub struct Harness {
    /// Shared manager under test.
    pub manager: SharedManager,
    handles: HashMap<Language, RecordingHandle>,
}

impl Harness {
    /// Registers one recording adapter per language.
    pub fn new(languages: &[Language]) -> Self {
        let mut manager = LspManager::new();
        let mut handles = HashMap::new();
        for &language in languages {
            let adapter = RecordingAdapter::new(language);
            handles.insert(language, adapter.handle());
            manager
                .register(Box::new(adapter))
                .expect("register recording adapter");
        }
        Self {
            manager: manager.into_shared(),
            handles,
        }
    }

    /// Handle for the adapter serving `language`.
    pub fn handle(&self, language: Language) -> &RecordingHandle {
        self.handles.get(&language).expect("language registered")
    }

    /// Selects and initializes the adapter for `path`.
    pub fn open(&self, path: &Path) {
        let mut manager = lock_manager(&self.manager);
        assert!(manager.select_adapter_for_file(path), "no adapter for {}", path.display());
        assert!(manager.initialize(&workspace()), "initialize failed");
    }

    /// Starts a completion engine over `document`.
    pub fn engine(&self, document: Arc<MemoryDocument>, config: &ClientConfig) -> CompletionEngine {
        CompletionEngine::new(Arc::clone(&self.manager), document, config)
            .expect("spawn completion worker")
    }
}

/// Manager with Go and Luau recording adapters.
#[fixture]
pub fn harness() -> Harness {
    Harness::new(&[Language::Go, Language::Luau])
}

/// Configuration with a short completion budget.
#[fixture]
pub fn fast_config() -> ClientConfig {
    ClientConfig {
        completion: PollBudget::new(4, 25),
        ..ClientConfig::default()
    }
}
