//! Completion pipeline: queueing, correlation, and ranking.
//!
//! [`CompletionEngine`] owns the worker thread and the UI-facing
//! [`CompletionView`]. The remaining modules are the pure stages the worker
//! runs on each response:
//!
//! - [`context`]: the word being completed and the syntactic context
//! - [`item`]: per-entry extraction, filtering, and priority grading
//! - [`ranking`]: deduplication, ordering, capping, and pre-selection
//! - [`snippet`]: snippet placeholder removal

pub mod context;
mod engine;
pub mod item;
mod pending;
pub mod ranking;
mod request;
pub mod snippet;
mod view;

pub use context::{CompletionContext, CursorContext, classify, word_start};
pub use engine::CompletionEngine;
pub use item::{CompletionItem, ReplacementRange, priority_prefix};
pub use pending::PendingTable;
pub use ranking::{RankedCompletions, rank_items, result_entries};
pub use request::{COMPLETION_METHOD, CompletionRequest, completion_body, trigger_context};
pub use snippet::clean_snippet;
pub use view::{CompletionView, RequestOutcome};
