//! Escape-aware substring scanning shared by the block and inline passes.
//!
//! The dialect escapes a special character with a single preceding
//! backslash; a literal backslash is written as the numeric entity `&#92;`,
//! so escape detection never has to count backslash runs.

/// Returns true when the character starting at `idx` is preceded by a
/// backslash.
pub(crate) fn is_escaped(text: &str, idx: usize) -> bool {
    idx > 0 && text.as_bytes()[idx - 1] == b'\\'
}

/// First occurrence of `needle` at or after `from`.
pub(crate) fn find_from(text: &str, needle: &str, from: usize) -> Option<usize> {
    if from > text.len() {
        return None;
    }
    text[from..].find(needle).map(|pos| pos + from)
}

/// First unescaped occurrence of `needle` at or after `from`.
pub(crate) fn find_unescaped_from(text: &str, needle: &str, from: usize) -> Option<usize> {
    let mut cursor = from;
    while let Some(pos) = find_from(text, needle, cursor) {
        if !is_escaped(text, pos) {
            return Some(pos);
        }
        cursor = pos + 1;
    }
    None
}

/// Last unescaped occurrence of `needle` at or after `from`.
pub(crate) fn rfind_unescaped_from(text: &str, needle: &str, from: usize) -> Option<usize> {
    let mut best = None;
    let mut cursor = from;
    while let Some(pos) = find_from(text, needle, cursor) {
        if !is_escaped(text, pos) {
            best = Some(pos);
        }
        cursor = pos + 1;
    }
    best
}

/// Last unescaped occurrence of `needle` strictly before `before`.
pub(crate) fn rfind_unescaped_before(text: &str, needle: &str, before: usize) -> Option<usize> {
    let end = before.min(text.len());
    let mut best = None;
    let mut cursor = 0;
    while let Some(pos) = find_from(text, needle, cursor) {
        if pos >= end {
            break;
        }
        if !is_escaped(text, pos) {
            best = Some(pos);
        }
        cursor = pos + 1;
    }
    best
}

/// Splits on unescaped occurrences of `sep`, keeping empty tokens.
pub(crate) fn split_unescaped(text: &str, sep: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut cursor = 0;
    while let Some(pos) = find_from(text, sep, cursor) {
        if is_escaped(text, pos) {
            cursor = pos + 1;
            continue;
        }
        parts.push(text[start..pos].to_string());
        start = pos + sep.len();
        cursor = start;
    }
    parts.push(text[start..].to_string());
    parts
}
