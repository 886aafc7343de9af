//! UI-facing completion state.

use serde::Serialize;

use super::item::CompletionItem;

/// How a completion request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum RequestOutcome {
    /// A matching result was parsed into `count` items.
    Resolved {
        /// Items kept after filtering and ranking.
        count: usize,
    },
    /// No matching response arrived within the budget.
    TimedOut,
    /// The server returned an error, an unusable result, or went away.
    Failed,
    /// The request was never sent; no ready adapter served the file.
    Dropped,
}

/// Snapshot of the completion list for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompletionView {
    /// Ranked items in display order.
    pub items: Vec<CompletionItem>,
    /// Highlighted item.
    pub selected_index: usize,
    /// Whether the list should be shown.
    pub visible: bool,
    /// Highest request id that has settled.
    pub settled_request: Option<i64>,
    /// Outcome of that request.
    pub last_outcome: Option<RequestOutcome>,
}

impl CompletionView {
    /// Item currently highlighted, if the list is showing.
    #[must_use]
    pub fn selected(&self) -> Option<&CompletionItem> {
        self.visible
            .then(|| self.items.get(self.selected_index))
            .flatten()
    }

    /// Whether request `id`, or a later one, has settled.
    #[must_use]
    pub fn has_settled(&self, id: i64) -> bool {
        self.settled_request.is_some_and(|settled| settled >= id)
    }

    pub(crate) fn show(&mut self, items: Vec<CompletionItem>, selected: usize) {
        self.visible = !items.is_empty();
        self.selected_index = selected;
        self.items = items;
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.selected_index = 0;
        self.visible = false;
    }

    pub(crate) fn settle(&mut self, id: i64, outcome: RequestOutcome) {
        if !self.has_settled(id) {
            self.settled_request = Some(id);
        }
        self.last_outcome = Some(outcome);
    }
}
