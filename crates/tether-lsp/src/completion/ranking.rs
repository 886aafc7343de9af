//! Deduplication, ranking, and capping of parsed completion entries.

use std::collections::HashMap;

use serde_json::Value;

use super::context::CursorContext;
use super::item::CompletionItem;

/// Ranked list plus the index the UI should highlight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedCompletions {
    /// Items in display order.
    pub items: Vec<CompletionItem>,
    /// Index of the pre-selected item; `0` for an empty list.
    pub selected: usize,
}

/// Entries of a completion result: a bare array or a list object.
///
/// Returns `None` for any other JSON shape. `null` yields an empty list.
#[must_use]
pub fn result_entries(result: &Value) -> Option<&[Value]> {
    match result {
        Value::Array(entries) => Some(entries),
        Value::Object(list) => list
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice),
        Value::Null => Some(&[]),
        _ => None,
    }
}

/// Turns raw server entries into the list shown to the user.
///
/// Irrelevant entries are dropped first. Among entries sharing a label and
/// kind the one with the smallest server sort text survives, keeping the
/// position of the first occurrence. Survivors are sorted by priority
/// prefix plus sort text and the list is cut to `max` items.
#[must_use]
pub fn rank_items(entries: &[Value], cursor: &CursorContext, max: usize) -> RankedCompletions {
    let mut items: Vec<CompletionItem> = Vec::with_capacity(entries.len());
    let mut seen: HashMap<(String, i64), usize> = HashMap::new();

    for entry in entries {
        let item = CompletionItem::from_entry(entry, cursor);
        if !item.is_relevant(cursor.context) {
            continue;
        }
        let (label, kind) = item.identity();
        let key = (label.to_owned(), kind);
        match seen.get(&key).and_then(|&index| items.get_mut(index)) {
            Some(existing) => {
                if item.sort_key < existing.sort_key {
                    *existing = item;
                }
            }
            None => {
                seen.insert(key, items.len());
                items.push(item);
            }
        }
    }

    for item in &mut items {
        item.apply_priority(cursor.context, &cursor.word);
    }
    items.sort_by(|left, right| left.sort_key.cmp(&right.sort_key));
    items.truncate(max);

    let selected = items
        .iter()
        .position(|item| item.label.starts_with(cursor.word.as_str()))
        .unwrap_or(0);
    RankedCompletions { items, selected }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::document::DocumentSnapshot;

    #[fixture]
    fn global_cursor() -> CursorContext {
        let snapshot = DocumentSnapshot::from_text("local x = pri", 13);
        CursorContext::resolve(&snapshot, 0, 13)
    }

    fn labels(ranked: &RankedCompletions) -> Vec<&str> {
        ranked.items.iter().map(|item| item.label.as_str()).collect()
    }

    #[rstest]
    fn keeps_smallest_sort_text_and_boosts_prefix_matches(global_cursor: CursorContext) {
        let entries = [
            json!({ "label": "print", "kind": 2, "sortText": "b" }),
            json!({ "label": "print", "kind": 2, "sortText": "a" }),
            json!({ "label": "local", "kind": 14, "sortText": "c" }),
        ];

        let ranked = rank_items(&entries, &global_cursor, 25);

        assert_eq!(labels(&ranked), vec!["print", "local"]);
        assert_eq!(ranked.items.first().map(|item| item.sort_key.as_str()), Some("!Ca"));
        assert_eq!(ranked.items.get(1).map(|item| item.sort_key.as_str()), Some("Ac"));
        assert_eq!(ranked.selected, 0);
    }

    #[rstest]
    fn distinct_kinds_are_not_merged(global_cursor: CursorContext) {
        let entries = [
            json!({ "label": "print", "kind": 2 }),
            json!({ "label": "print", "kind": 3 }),
        ];

        let ranked = rank_items(&entries, &global_cursor, 25);

        assert_eq!(ranked.items.len(), 2);
    }

    #[rstest]
    fn selects_first_prefix_match(global_cursor: CursorContext) {
        let entries = [
            json!({ "label": "Private", "sortText": "a" }),
            json!({ "label": "game", "sortText": "z" }),
            json!({ "label": "printf", "sortText": "b" }),
        ];

        let ranked = rank_items(&entries, &global_cursor, 25);

        assert_eq!(labels(&ranked), vec!["printf", "Private", "game"]);
        assert_eq!(ranked.selected, 0);
    }

    #[rstest]
    fn falls_back_to_first_item_without_prefix_match() {
        let snapshot = DocumentSnapshot::from_text("zz", 2);
        let cursor = CursorContext::resolve(&snapshot, 0, 2);
        let entries = [json!({ "label": "alpha" }), json!({ "label": "beta" })];

        let ranked = rank_items(&entries, &cursor, 25);

        assert_eq!(ranked.selected, 0);
        assert_eq!(labels(&ranked), vec!["alpha", "beta"]);
    }

    #[rstest]
    fn caps_list_length(global_cursor: CursorContext) {
        let entries: Vec<Value> = (0..40)
            .map(|index| json!({ "label": format!("item{index:02}") }))
            .collect();

        let ranked = rank_items(&entries, &global_cursor, 25);

        assert_eq!(ranked.items.len(), 25);
        assert_eq!(ranked.items.last().map(|item| item.label.as_str()), Some("item24"));
    }

    #[rstest]
    fn contained_word_outranks_unrelated_labels() {
        let snapshot = DocumentSnapshot::from_text("local x = int", 13);
        let cursor = CursorContext::resolve(&snapshot, 0, 13);
        let entries = [
            json!({ "label": "abc", "kind": 6, "sortText": "a" }),
            json!({ "label": "hint", "kind": 6, "sortText": "b" }),
        ];

        let ranked = rank_items(&entries, &cursor, 25);

        let keys: Vec<_> = ranked
            .items
            .iter()
            .map(|item| (item.label.as_str(), item.sort_key.as_str()))
            .collect();
        assert_eq!(keys, vec![("hint", "#Zb"), ("abc", "Za")]);
        assert_eq!(ranked.selected, 0);
    }

    #[rstest]
    fn property_access_keeps_methods_and_fields_only() {
        let snapshot = DocumentSnapshot::from_text("part:", 5);
        let cursor = CursorContext::resolve(&snapshot, 0, 5);
        let entries = [
            json!({ "label": "Name", "kind": 5, "sortText": "1" }),
            json!({ "label": "Destroy", "kind": 2, "sortText": "2" }),
            json!({ "label": "local", "kind": 14, "sortText": "0" }),
        ];

        let ranked = rank_items(&entries, &cursor, 25);

        assert_eq!(labels(&ranked), vec!["Destroy", "Name"]);
    }

    #[rstest]
    #[case(json!([{ "label": "a" }]), Some(1))]
    #[case(json!({ "isIncomplete": true, "items": [{ "label": "a" }, { "label": "b" }] }), Some(2))]
    #[case(json!(null), Some(0))]
    #[case(json!({ "isIncomplete": false }), None)]
    #[case(json!("items"), None)]
    fn reads_result_shapes(#[case] result: Value, #[case] expected: Option<usize>) {
        assert_eq!(result_entries(&result).map(<[Value]>::len), expected);
    }
}
