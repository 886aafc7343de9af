//! Reduction of LSP snippet syntax to literal insert text.

/// Strips snippet placeholders and cuts function snippets after `(`.
///
/// `${n:default}` becomes `default`, `${n}` and `$n` disappear, `$(...)`
/// disappears, and any `$` followed by something else is kept. Finally
/// everything after the first `(` is dropped, so `insert(${1:name})`
/// becomes `insert(`.
#[must_use]
pub fn clean_snippet(text: &str) -> String {
    let mut result = text.to_owned();
    let mut pos = 0;
    while let Some(found) = result.get(pos..).and_then(|rest| rest.find('$')) {
        pos += found;
        let Some(&next) = result.as_bytes().get(pos + 1) else {
            break;
        };
        match next {
            b'{' => strip_braced(&mut result, pos),
            b'0'..=b'9' => {
                let digits = result
                    .bytes()
                    .skip(pos + 1)
                    .take_while(u8::is_ascii_digit)
                    .count();
                result.replace_range(pos..=pos + digits, "");
            }
            b'(' => match result.get(pos..).and_then(|rest| rest.find(')')) {
                Some(close) => result.replace_range(pos..=pos + close, ""),
                None => result.replace_range(pos..pos + 2, ""),
            },
            _ => pos += 1,
        }
    }
    if let Some(open) = result.find('(') {
        result.truncate(open + 1);
    }
    result
}

/// Replaces `${...}` starting at `pos` with its default text, if any.
fn strip_braced(result: &mut String, pos: usize) {
    let Some(close) = result.get(pos..).and_then(|rest| rest.find('}')) else {
        result.replace_range(pos..pos + 2, "");
        return;
    };
    let end = pos + close;
    let default = result
        .get(pos..end)
        .and_then(|placeholder| placeholder.find(':'))
        .and_then(|colon| result.get(pos + colon + 1..end))
        .unwrap_or_default()
        .to_owned();
    result.replace_range(pos..=end, &default);
}
