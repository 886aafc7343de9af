//! Implementation of [`LanguageAdapter`] for [`ProcessAdapter`].

use std::path::Path;

use tracing::trace;

use super::error::AdapterError;
use super::inbox::FrameInbox;
use super::lifecycle::ADAPTER_TARGET;
use super::process::ProcessAdapter;
use crate::Language;
use crate::server::LanguageAdapter;

impl LanguageAdapter for ProcessAdapter {
    fn language(&self) -> Language {
        self.language_of_profile()
    }

    fn initialize(&mut self, workspace: &Path) -> Result<(), AdapterError> {
        self.start(workspace)
    }

    fn is_initialized(&self) -> bool {
        self.running().is_some()
    }

    fn send(&mut self, body: &[u8]) -> Result<(), AdapterError> {
        let language = self.language_of_profile();
        let process = self.running_mut().ok_or(AdapterError::NotReady)?;
        trace!(
            target: ADAPTER_TARGET,
            language = %language,
            bytes = body.len(),
            "sending frame"
        );
        process.send(body)
    }

    fn responses(&self) -> Option<FrameInbox> {
        self.inbox()
    }

    fn language_id(&self, path: &Path) -> &'static str {
        self.profile().language_id(path)
    }

    fn shutdown(&mut self) {
        self.stop();
    }
}
