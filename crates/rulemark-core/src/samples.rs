//! Code-sample selection.
//!
//! A description may carry one `{code}` block per language variant. One
//! scan over the whole document decides, before any line is emitted, which
//! variant survives for the requested target language; the block machinery
//! then only has to ask whether a given opening marker is kept.

use once_cell::sync::Lazy;
use regex::Regex;

static CODE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{code").unwrap());
static CODE_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\{code:title="?([^",|}]*)"?"#).unwrap());

/// True for any line that opens or closes a code block.
pub(crate) fn is_code_marker(line: &str) -> bool {
    CODE_MARKER.is_match(line)
}

/// The `title=` token of an opening marker, if it carries one.
///
/// The token ends at the first `"`, `,`, `|` or `}`. Markers without a
/// `title=` parameter (bare `{code}` included) yield `None`.
pub(crate) fn marker_title(line: &str) -> Option<&str> {
    CODE_TITLE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|title| title.as_str().trim())
}

/// Which `{code}` variants survive for one conversion.
#[derive(Debug)]
pub(crate) struct SampleFilter {
    target: String,
    has_explicit_match: bool,
}

impl SampleFilter {
    /// Scans every line once. An empty `target` disables selection, keeping
    /// all blocks.
    pub(crate) fn scan(lines: &[&str], target: &str) -> SampleFilter {
        let target = target.trim().to_string();
        let has_explicit_match = !target.is_empty()
            && lines.iter().any(|line| {
                marker_title(line).is_some_and(|title| title.eq_ignore_ascii_case(&target))
            });
        SampleFilter {
            target,
            has_explicit_match,
        }
    }

    /// Whether the block opened by this marker line is emitted.
    ///
    /// Titled markers must match the target token exactly (case aside); the
    /// untitled marker is the fallback, kept only when no titled marker
    /// matched anywhere in the document.
    pub(crate) fn keeps(&self, line: &str) -> bool {
        if self.target.is_empty() {
            return true;
        }
        match marker_title(line) {
            Some(title) => title.eq_ignore_ascii_case(&self.target),
            None => !self.has_explicit_match,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SampleFilter, marker_title};

    #[test]
    fn titles_are_extracted_from_marker_variants() {
        assert_eq!(marker_title("{code:title=java}"), Some("java"));
        assert_eq!(marker_title(r#"{code:title="C++"}"#), Some("C++"));
        assert_eq!(marker_title("{code:title=python,linenumbers=true}"), Some("python"));
        assert_eq!(marker_title("{code:title=swift|borderStyle=solid}"), Some("swift"));
        assert_eq!(marker_title("{code}"), None);
        assert_eq!(marker_title("{code:borderStyle=solid}"), None);
    }

    #[test]
    fn explicit_match_suppresses_the_fallback() {
        let lines = ["{code:title=java}", "x", "{code}", "{code}", "y", "{code}"];
        let filter = SampleFilter::scan(&lines, "Java");
        assert!(filter.keeps("{code:title=java}"));
        assert!(!filter.keeps("{code}"));
    }

    #[test]
    fn fallback_survives_without_an_explicit_match() {
        let lines = ["{code:title=java}", "{code}", "{code}", "{code}"];
        let filter = SampleFilter::scan(&lines, "cpp");
        assert!(!filter.keeps("{code:title=java}"));
        assert!(filter.keeps("{code}"));
    }

    #[test]
    fn empty_target_keeps_everything() {
        let lines = ["{code:title=java}", "{code}"];
        let filter = SampleFilter::scan(&lines, "");
        assert!(filter.keeps("{code:title=java}"));
        assert!(filter.keeps("{code}"));
    }
}
