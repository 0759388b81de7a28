//! Inline markup, applied to content pieces after block handling.
//!
//! Stage order is fixed: entity escaping, inline code spans, toggle-pair
//! formatting, href extraction, rule cross-references, unescaping. Escaping
//! runs first so code-span content is escaped too; unescaping runs strictly
//! last so backslash escapes survive every earlier stage untouched.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::language::Language;
use crate::scan::{
    find_from, find_unescaped_from, is_escaped, rfind_unescaped_before, rfind_unescaped_from,
};

static ENTITY_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^&(?:[a-zA-Z][a-zA-Z0-9]*;|#[0-9]+;|#[xX][0-9a-fA-F]+;)").unwrap());
static RULE_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bS(\d+)\b").unwrap());

const TOGGLES: [(char, &str, &str); 3] = [
    ('*', "<strong>", "</strong>"),
    ('_', "<em>", "</em>"),
    ('-', "<del>", "</del>"),
];

const ESCAPABLE: &[char] = &[
    '|', '_', '*', '!', '?', '+', '{', '}', '^', '~', '-', '[', ']',
];

/// Runs the whole inline pipeline over one piece of content.
pub(crate) fn apply(content: &str, language: Option<Language>) -> String {
    let mut text = escape_entities(content);
    text = mark_code_spans(&text);
    for (indicator, open_tag, close_tag) in TOGGLES {
        text = apply_toggles(&text, indicator, open_tag, close_tag);
    }
    text = extract_hrefs(&text);
    if let Some(language) = language {
        text = link_rule_keys(&text, language);
    }
    unescape(&text)
}

/// Escapes `&`, `<` and `>` and substitutes a few literal symbols. An `&`
/// that already begins a named entity or numeric character reference is
/// kept as written.
fn escape_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (idx, ch) in text.char_indices() {
        match ch {
            '&' if ENTITY_REF.is_match(&text[idx..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '§' => out.push_str("&sect;"),
            '©' => out.push_str("&copy;"),
            '®' => out.push_str("&reg;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Plain escaping for kept code lines: every `&`, `<` and `>` becomes an
/// entity so sample code renders verbatim, entities included.
pub(crate) fn escape_code(text: &str) -> String {
    let mut out = String::new();
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Rewrites `{{…}}` spans to `<code>…</code>`.
///
/// Literal `<code>` tags in the source arrive here already escaped; they
/// are folded back into the brace form first so both spellings behave the
/// same. Each opener takes the last unescaped `}}` between it and the next
/// opener as its closer, so a trailing stray `}}` wins over an inner one
/// while one before any opener stays literal; an opener with no closer at
/// all closes at end of content.
fn mark_code_spans(text: &str) -> String {
    let mut work = text
        .replace("&lt;code&gt;", "{{")
        .replace("&lt;/code&gt;", "}}");
    while let Some(open) = find_unescaped_from(&work, "{{", 0) {
        work.replace_range(open..open + 2, "<code>");
        let tail = open + "<code>".len();
        let bound = find_unescaped_from(&work, "{{", tail).unwrap_or(work.len());
        match rfind_unescaped_from(&work[..bound], "}}", tail) {
            Some(close) => work.replace_range(close..close + 2, "</code>"),
            None => work.push_str("</code>"),
        }
    }
    work
}

/// Byte ranges covering `<code>…</code>` runs, wrapper tags included.
fn code_span_ranges(text: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut cursor = 0;
    while let Some(start) = find_from(text, "<code>", cursor) {
        let end = match find_from(text, "</code>", start + "<code>".len()) {
            Some(pos) => pos + "</code>".len(),
            None => text.len(),
        };
        ranges.push((start, end));
        cursor = end;
    }
    ranges
}

fn in_ranges(ranges: &[(usize, usize)], idx: usize) -> bool {
    ranges.iter().any(|&(start, end)| idx >= start && idx < end)
}

/// Applies one indicator's open/close scan.
///
/// Opening is strict: unescaped, outside code spans, preceded by
/// start-of-content or whitespace, followed by non-whitespace, with a
/// matching close still ahead. Closing is loose: the next unescaped
/// occurrence outside code spans closes, whatever its spacing. The
/// asymmetry is part of the dialect; `5*x*2` stays untouched because
/// neither `*` can open.
fn apply_toggles(text: &str, indicator: char, open_tag: &str, close_tag: &str) -> String {
    let spans = code_span_ranges(text);
    let mut out = String::with_capacity(text.len());
    let mut open = false;
    for (idx, ch) in text.char_indices() {
        if ch != indicator || is_escaped(text, idx) || in_ranges(&spans, idx) {
            out.push(ch);
            continue;
        }
        if open {
            out.push_str(close_tag);
            open = false;
        } else if can_open(text, idx, indicator, &spans) {
            out.push_str(open_tag);
            open = true;
        } else {
            out.push(ch);
        }
    }
    out
}

fn can_open(text: &str, idx: usize, indicator: char, spans: &[(usize, usize)]) -> bool {
    let before_ok = text[..idx]
        .chars()
        .next_back()
        .is_none_or(|ch| ch.is_whitespace());
    let after_ok = text[idx + indicator.len_utf8()..]
        .chars()
        .next()
        .is_some_and(|ch| !ch.is_whitespace());
    before_ok && after_ok && has_close(text, idx + indicator.len_utf8(), indicator, spans)
}

fn has_close(text: &str, from: usize, indicator: char, spans: &[(usize, usize)]) -> bool {
    text.char_indices()
        .skip_while(|&(idx, _)| idx < from)
        .any(|(idx, ch)| ch == indicator && !is_escaped(text, idx) && !in_ranges(spans, idx))
}

/// Rewrites `[label|http://…]` and `[http://…]` to anchors.
///
/// The opening bracket is the right-most unescaped `[` before the match;
/// the URL runs to the first unescaped `]` after it. Matches without a
/// usable opener or closer are left alone.
fn extract_hrefs(text: &str) -> String {
    let mut work = text.to_string();
    let mut from = 0;
    loop {
        let labeled = find_from(&work, "|http", from);
        let bare = find_from(&work, "[http", from);
        let (mark, has_label) = match (labeled, bare) {
            (Some(l), Some(b)) => {
                if l < b {
                    (l, true)
                } else {
                    (b, false)
                }
            }
            (Some(l), None) => (l, true),
            (None, Some(b)) => (b, false),
            (None, None) => break,
        };
        let Some(close) = find_unescaped_from(&work, "]", mark) else {
            from = mark + 1;
            continue;
        };
        let open = if has_label {
            match rfind_unescaped_before(&work, "[", mark) {
                Some(pos) => pos,
                None => {
                    from = mark + 1;
                    continue;
                }
            }
        } else {
            if is_escaped(&work, mark) {
                from = mark + 1;
                continue;
            }
            mark
        };
        let url = work[mark + 1..close].to_string();
        let label = if has_label {
            work[open + 1..mark].to_string()
        } else {
            url.clone()
        };
        let anchor = format!("<a href=\"{}\">{}</a>", url, label);
        work.replace_range(open..close + 1, &anchor);
        from = open + anchor.len();
    }
    work
}

/// Rewrites bare rule keys (`S1234`) to registry macros.
fn link_rule_keys(text: &str, language: Language) -> String {
    let replacement = format!("{{rule:{}:S${{1}}}}", language.key());
    RULE_KEY.replace_all(text, replacement.as_str()).to_string()
}

/// Removes backslash escapes for the fixed escapable set, then folds the
/// backslash entity itself.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(&next) = chars.peek() {
                if ESCAPABLE.contains(&next) {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(ch);
    }
    out.replace("&#92;", "\\")
}

#[cfg(test)]
mod tests {
    use super::{apply, escape_entities, mark_code_spans};

    #[test]
    fn existing_entities_are_not_doubled() {
        assert_eq!(escape_entities("a & b"), "a &amp; b");
        assert_eq!(escape_entities("&amp; &#160; &#x1F;"), "&amp; &#160; &#x1F;");
        assert_eq!(escape_entities("1 < 2 > 0"), "1 &lt; 2 &gt; 0");
        assert_eq!(escape_entities("§ 42"), "&sect; 42");
    }

    #[test]
    fn code_spans_pair_left_to_right() {
        assert_eq!(mark_code_spans("{{a}}"), "<code>a</code>");
        assert_eq!(
            mark_code_spans("{{a}} and {{b}}"),
            "<code>a</code> and <code>b</code>"
        );
    }

    #[test]
    fn trailing_close_wins_over_an_inner_one() {
        assert_eq!(mark_code_spans("{{a}} b}}"), "<code>a}} b</code>");
        assert_eq!(
            mark_code_spans("{{a}} b}} {{c"),
            "<code>a}} b</code> <code>c</code>"
        );
    }

    #[test]
    fn stray_close_before_the_first_opener_stays_literal() {
        assert_eq!(mark_code_spans("a}} b{{c"), "a}} b<code>c</code>");
        assert_eq!(mark_code_spans("}}{{"), "}}<code></code>");
    }

    #[test]
    fn unclosed_span_closes_at_end_of_content() {
        assert_eq!(mark_code_spans("{{tail"), "<code>tail</code>");
    }

    #[test]
    fn literal_code_tags_fold_into_braces() {
        assert_eq!(
            mark_code_spans("&lt;code&gt;x&lt;/code&gt;"),
            "<code>x</code>"
        );
    }

    #[test]
    fn toggles_respect_code_spans() {
        assert_eq!(
            apply("{{a * b}} *c*", None),
            "<code>a * b</code> <strong>c</strong>"
        );
    }

    #[test]
    fn close_is_loose_about_spacing() {
        assert_eq!(apply("*b *", None), "<strong>b </strong>");
        assert_eq!(apply("a *b* c", None), "a <strong>b</strong> c");
    }

    #[test]
    fn multiplication_is_not_bold() {
        assert_eq!(apply("5*x*2", None), "5*x*2");
    }

    #[test]
    fn escaped_indicators_stay_literal() {
        assert_eq!(apply(r"\*not bold\*", None), "*not bold*");
        assert_eq!(apply(r"\{quote\}", None), "{quote}");
    }

    #[test]
    fn backslash_entity_survives_to_the_end() {
        assert_eq!(apply("&#92;", None), "\\");
    }
}
