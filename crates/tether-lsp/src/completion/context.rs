//! Cursor analysis: the word being completed and the syntactic context.

use std::fmt;

use lsp_types::Position;

use crate::document::DocumentSnapshot;

/// Syntactic situation of the cursor, used for filtering and ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionContext {
    /// Nothing special precedes the cursor.
    Global,
    /// After a `:` accessor.
    PropertyAccess,
    /// After an opening parenthesis.
    FunctionCall,
    /// After an opening bracket.
    TableAccess,
    /// Inside a string method call.
    StringMethod,
    /// Not classified.
    Unknown,
}

impl fmt::Display for CompletionContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Global => "global",
            Self::PropertyAccess => "property_access",
            Self::FunctionCall => "function_call",
            Self::TableAccess => "table_access",
            Self::StringMethod => "string_method",
            Self::Unknown => "unknown",
        };
        formatter.write_str(label)
    }
}

/// Classifies the text before `cursor`.
///
/// Scans backwards over whitespace and `-`; the first other byte decides.
/// `:` means property access, `[` table access, `(` a call, and anything
/// else is global scope. The scan never yields
/// [`CompletionContext::StringMethod`].
#[must_use]
pub fn classify(text: &[u8], cursor: usize) -> CompletionContext {
    let end = cursor.min(text.len());
    for &byte in text.iter().take(end).rev() {
        match byte {
            b':' => return CompletionContext::PropertyAccess,
            b'[' => return CompletionContext::TableAccess,
            b'(' => return CompletionContext::FunctionCall,
            b'-' => {}
            other if other.is_ascii_whitespace() || other == 0x0b => {}
            _ => break,
        }
    }
    CompletionContext::Global
}

fn is_identifier_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Offset at which the word ending at `cursor` starts.
///
/// If a `.` or `:` accessor is reached while scanning back over identifier
/// bytes, the word starts right after it. Otherwise the word extends back
/// over identifier bytes and `:`, `$`, `#`, `@`.
#[must_use]
pub fn word_start(text: &[u8], cursor: usize) -> usize {
    let end = cursor.min(text.len());
    for index in (0..end).rev() {
        let byte = text.get(index).copied().unwrap_or_default();
        if byte == b'.' || byte == b':' {
            return index + 1;
        }
        if !is_identifier_byte(byte) {
            break;
        }
    }

    let mut start = end;
    while let Some(&byte) = start.checked_sub(1).and_then(|index| text.get(index)) {
        if !(is_identifier_byte(byte) || matches!(byte, b':' | b'$' | b'#' | b'@')) {
            break;
        }
        start -= 1;
    }
    start
}

/// Everything the ranking stage needs to know about the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorContext {
    /// Byte offset of the completion position.
    pub cursor: usize,
    /// Completion position as line and column.
    pub position: Position,
    /// Byte offset where the current word starts.
    pub word_start: usize,
    /// Line and column of `word_start`.
    pub word_start_position: Position,
    /// Text between `word_start` and `cursor`.
    pub word: String,
    /// Syntactic context of the cursor.
    pub context: CompletionContext,
}

impl CursorContext {
    /// Resolves the requested position against a snapshot.
    ///
    /// A position that does not exist in the snapshot falls back to the
    /// snapshot's cursor.
    #[must_use]
    pub fn resolve(snapshot: &DocumentSnapshot, line: u32, character: u32) -> Self {
        let (cursor, position) = match snapshot.offset_of(line, character) {
            Some(offset) => (offset, Position::new(line, character)),
            None => {
                let cursor = snapshot.cursor.min(snapshot.text.len());
                (cursor, snapshot.position_of(cursor))
            }
        };
        let bytes = snapshot.text.as_bytes();
        let start = word_start(bytes, cursor);
        let word = bytes
            .get(start..cursor)
            .map(|word| String::from_utf8_lossy(word).into_owned())
            .unwrap_or_default();
        Self {
            cursor,
            position,
            word_start: start,
            word_start_position: snapshot.position_of(start),
            word,
            context: classify(bytes, cursor),
        }
    }

    /// Byte immediately before the completion position.
    #[must_use]
    pub fn trigger_byte(&self, snapshot: &DocumentSnapshot) -> Option<u8> {
        snapshot.byte_before(self.cursor)
    }
}
