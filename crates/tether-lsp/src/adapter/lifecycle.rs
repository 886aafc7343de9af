//! Process teardown for language server subprocesses.

use std::process::Child;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::Language;

/// Log target for adapter operations.
pub(crate) const ADAPTER_TARGET: &str = "tether_lsp::adapter";

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Polls the child until it exits or `grace` elapses.
fn wait_for_exit(child: &mut Child, language: Language, grace: Duration) -> bool {
    let deadline = Instant::now() + grace;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(
                    target: ADAPTER_TARGET,
                    language = %language,
                    ?status,
                    "language server exited"
                );
                return true;
            }
            Ok(None) if Instant::now() < deadline => thread::sleep(EXIT_POLL_INTERVAL),
            Ok(None) => return false,
            Err(error) => {
                warn!(
                    target: ADAPTER_TARGET,
                    language = %language,
                    error = %error,
                    "failed to check process status"
                );
                return false;
            }
        }
    }
}

/// Waits up to `grace` for the child to exit, then kills it.
///
/// Never blocks for longer than the grace period plus the time the
/// operating system takes to reap a killed process.
pub(super) fn terminate_child(child: &mut Child, language: Language, grace: Duration) {
    if wait_for_exit(child, language, grace) {
        return;
    }
    warn!(
        target: ADAPTER_TARGET,
        language = %language,
        grace_ms = grace.as_millis(),
        "language server did not exit gracefully, killing"
    );
    if let Err(error) = child.kill() {
        warn!(
            target: ADAPTER_TARGET,
            language = %language,
            error = %error,
            "failed to kill language server process"
        );
    }
    let _ = child.wait();
}
