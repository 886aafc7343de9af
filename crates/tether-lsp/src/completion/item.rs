//! Completion items: extraction from server JSON, filtering, and priority.

use lsp_types::Position;
use serde::Serialize;
use serde_json::Value;

use super::context::{CompletionContext, CursorContext};
use super::snippet::clean_snippet;

/// LSP `CompletionItemKind` numbers the ranking cares about.
pub mod kind {
    /// `Method`.
    pub const METHOD: i64 = 2;
    /// `Function`.
    pub const FUNCTION: i64 = 3;
    /// `Constructor`.
    pub const CONSTRUCTOR: i64 = 4;
    /// `Field`.
    pub const FIELD: i64 = 5;
    /// `Variable`.
    pub const VARIABLE: i64 = 6;
    /// `Keyword`.
    pub const KEYWORD: i64 = 14;
}

const NO_LABEL: &str = "[No Label]";
const EDITOR_COMMAND_PREFIX: &str = "editor.action.";
const STRING_METHOD_FRAGMENTS: [&str; 6] = ["sub", "find", "gsub", "match", "upper", "lower"];

/// Span of the document an accepted item replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplacementRange {
    /// First replaced position.
    pub start: Position,
    /// Position just past the replaced text.
    pub end: Position,
}

/// One ranked completion ready for display and insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionItem {
    /// Text shown in the list.
    pub label: String,
    /// Secondary text, such as a signature.
    pub detail: String,
    /// LSP `CompletionItemKind` number, `0` when absent.
    pub kind: i64,
    /// Literal text inserted on acceptance.
    pub insert_text: String,
    /// Span replaced on acceptance.
    pub range: ReplacementRange,
    /// Ranking key: priority prefix followed by the server's sort text.
    pub sort_key: String,
}

fn string_field(entry: &Value, field: &str) -> Option<String> {
    entry.get(field).and_then(Value::as_str).map(str::to_owned)
}

fn parse_position(value: &Value) -> Option<Position> {
    let line = u32::try_from(value.get("line")?.as_u64()?).ok()?;
    let character = u32::try_from(value.get("character")?.as_u64()?).ok()?;
    Some(Position::new(line, character))
}

fn parse_range(value: &Value) -> Option<ReplacementRange> {
    Some(ReplacementRange {
        start: parse_position(value.get("start")?)?,
        end: parse_position(value.get("end")?)?,
    })
}

impl CompletionItem {
    /// Builds an item from one server entry.
    ///
    /// A `textEdit` with a complete range supplies the insert text and
    /// span. Otherwise the item replaces the current word up to the cursor
    /// with its cleaned `insertText`, or with its raw label. `sort_key`
    /// holds the server's sort text (the label when absent) until
    /// [`CompletionItem::apply_priority`] runs.
    #[must_use]
    pub fn from_entry(entry: &Value, cursor: &CursorContext) -> Self {
        let label = string_field(entry, "label").unwrap_or_else(|| NO_LABEL.to_owned());
        let detail = string_field(entry, "detail").unwrap_or_default();
        let kind = entry.get("kind").and_then(Value::as_i64).unwrap_or(0);
        let sort_key = string_field(entry, "sortText").unwrap_or_else(|| label.clone());

        let edit = entry
            .get("textEdit")
            .filter(|edit| edit.is_object())
            .and_then(|edit| {
                let text = edit.get("newText")?.as_str()?;
                Some((clean_snippet(text), edit.get("range").and_then(parse_range)))
            });

        let (insert_text, range) = match edit {
            Some((text, Some(range))) => (text, range),
            _ => {
                let text = entry
                    .get("insertText")
                    .and_then(Value::as_str)
                    .map_or_else(|| label.clone(), clean_snippet);
                let range = ReplacementRange {
                    start: cursor.word_start_position,
                    end: cursor.position,
                };
                (text, range)
            }
        };

        Self {
            label,
            detail,
            kind,
            insert_text,
            range,
            sort_key,
        }
    }

    /// Deduplication key.
    #[must_use]
    pub fn identity(&self) -> (&str, i64) {
        (self.label.as_str(), self.kind)
    }

    /// Whether the item is worth showing in `context`.
    #[must_use]
    pub fn is_relevant(&self, context: CompletionContext) -> bool {
        if self.label.is_empty() || self.label.starts_with(EDITOR_COMMAND_PREFIX) {
            return false;
        }
        if let [only] = self.label.as_bytes() {
            if !only.is_ascii_alphabetic() {
                return false;
            }
        }
        match context {
            CompletionContext::PropertyAccess => matches!(self.kind, kind::METHOD | kind::FIELD),
            CompletionContext::FunctionCall => {
                matches!(self.kind, kind::METHOD | kind::FUNCTION)
            }
            CompletionContext::StringMethod => STRING_METHOD_FRAGMENTS
                .iter()
                .any(|fragment| self.label.contains(fragment)),
            CompletionContext::Global
            | CompletionContext::TableAccess
            | CompletionContext::Unknown => true,
        }
    }

    /// Prefixes `sort_key` with the item's priority for `context` and
    /// `word`.
    pub fn apply_priority(&mut self, context: CompletionContext, word: &str) {
        let prefix = priority_prefix(&self.label, self.kind, context, word);
        self.sort_key.insert_str(0, &prefix);
    }
}

/// Letter grade for an item, tightened by `!` for a case-sensitive prefix
/// match, `@` for a case-insensitive one and `#` when the label merely
/// contains the word.
#[must_use]
pub fn priority_prefix(label: &str, kind: i64, context: CompletionContext, word: &str) -> String {
    let grade = match context {
        CompletionContext::PropertyAccess => match kind {
            kind::METHOD => 'A',
            kind::FIELD => 'B',
            _ => 'Z',
        },
        CompletionContext::FunctionCall => match kind {
            kind::METHOD => 'A',
            kind::FUNCTION => 'B',
            _ => 'Z',
        },
        CompletionContext::Global => match label {
            "function" | "local" | "game" | "workspace" => 'A',
            _ if label.starts_with("local ") => 'B',
            "print" => 'C',
            _ => 'Z',
        },
        CompletionContext::StringMethod => match label {
            "sub" | "find" => 'A',
            "gsub" | "match" => 'B',
            _ => 'Z',
        },
        CompletionContext::TableAccess | CompletionContext::Unknown => 'Z',
    };

    let mut prefix = String::with_capacity(2);
    if !word.is_empty() {
        let label_lower = label.to_ascii_lowercase();
        let word_lower = word.to_ascii_lowercase();
        if label.starts_with(word) {
            prefix.push('!');
        } else if label_lower.starts_with(&word_lower) {
            prefix.push('@');
        } else if label_lower.contains(&word_lower) {
            prefix.push('#');
        }
    }
    prefix.push(grade);
    prefix
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::document::DocumentSnapshot;

    #[fixture]
    fn cursor() -> CursorContext {
        let snapshot = DocumentSnapshot::from_text("x = pri", 7);
        CursorContext::resolve(&snapshot, 0, 7)
    }

    #[rstest]
    fn applies_defaults_for_sparse_entries(cursor: CursorContext) {
        let item = CompletionItem::from_entry(&json!({}), &cursor);

        assert_eq!(item.label, NO_LABEL);
        assert_eq!(item.detail, "");
        assert_eq!(item.kind, 0);
        assert_eq!(item.sort_key, NO_LABEL);
        assert_eq!(item.insert_text, NO_LABEL);
    }

    #[rstest]
    fn prefers_complete_text_edit(cursor: CursorContext) {
        let entry = json!({
            "label": "print",
            "textEdit": {
                "newText": "print(${1:value})",
                "range": {
                    "start": { "line": 0, "character": 4 },
                    "end": { "line": 0, "character": 7 }
                }
            },
            "insertText": "ignored"
        });

        let item = CompletionItem::from_entry(&entry, &cursor);

        assert_eq!(item.insert_text, "print(");
        assert_eq!(item.range.start, Position::new(0, 4));
        assert_eq!(item.range.end, Position::new(0, 7));
    }

    #[rstest]
    fn incomplete_text_edit_falls_back_to_word_span(cursor: CursorContext) {
        let entry = json!({
            "label": "printf",
            "textEdit": { "newText": "printf(${1})", "range": { "start": { "line": 0 } } },
            "insertText": "printf($0)"
        });

        let item = CompletionItem::from_entry(&entry, &cursor);

        assert_eq!(item.insert_text, "printf(");
        assert_eq!(item.range.start, Position::new(0, 4));
        assert_eq!(item.range.end, Position::new(0, 7));
    }

    #[rstest]
    fn label_fallback_is_not_cleaned(cursor: CursorContext) {
        let item = CompletionItem::from_entry(&json!({ "label": "f(x)" }), &cursor);

        assert_eq!(item.insert_text, "f(x)");
    }

    #[rstest]
    #[case("", 3, CompletionContext::Global, false)]
    #[case("editor.action.triggerSuggest", 1, CompletionContext::Global, false)]
    #[case("+", 0, CompletionContext::Global, false)]
    #[case("x", 6, CompletionContext::Global, true)]
    #[case("Name", kind::FIELD, CompletionContext::PropertyAccess, true)]
    #[case("Name", kind::VARIABLE, CompletionContext::PropertyAccess, false)]
    #[case("new", kind::FUNCTION, CompletionContext::FunctionCall, true)]
    #[case("new", kind::CONSTRUCTOR, CompletionContext::FunctionCall, false)]
    #[case("upper", kind::METHOD, CompletionContext::StringMethod, true)]
    #[case("len", kind::METHOD, CompletionContext::StringMethod, false)]
    fn filters_by_context(
        #[case] label: &str,
        #[case] item_kind: i64,
        #[case] context: CompletionContext,
        #[case] expected: bool,
    ) {
        let item = CompletionItem {
            label: label.to_owned(),
            detail: String::new(),
            kind: item_kind,
            insert_text: label.to_owned(),
            range: ReplacementRange {
                start: Position::new(0, 0),
                end: Position::new(0, 0),
            },
            sort_key: label.to_owned(),
        };

        assert_eq!(item.is_relevant(context), expected);
    }

    #[rstest]
    #[case("print", 3, CompletionContext::Global, "pri", "!C")]
    #[case("Print", 3, CompletionContext::Global, "pri", "@Z")]
    #[case("hint", kind::VARIABLE, CompletionContext::Global, "int", "#Z")]
    #[case("sprint", 3, CompletionContext::Global, "PRI", "#Z")]
    #[case("abc", kind::VARIABLE, CompletionContext::Global, "int", "Z")]
    #[case("local", kind::KEYWORD, CompletionContext::Global, "pri", "A")]
    #[case("local x", kind::KEYWORD, CompletionContext::Global, "", "B")]
    #[case("GetChildren", kind::METHOD, CompletionContext::PropertyAccess, "Get", "!A")]
    #[case("Parent", kind::FIELD, CompletionContext::PropertyAccess, "", "B")]
    #[case("new", kind::FUNCTION, CompletionContext::FunctionCall, "", "B")]
    #[case("gsub", kind::METHOD, CompletionContext::StringMethod, "", "B")]
    #[case("anything", 1, CompletionContext::TableAccess, "", "Z")]
    fn grades_priority(
        #[case] label: &str,
        #[case] item_kind: i64,
        #[case] context: CompletionContext,
        #[case] word: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(priority_prefix(label, item_kind, context, word), expected);
    }
}
