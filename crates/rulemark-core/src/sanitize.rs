//! Fragment sanitization.

use std::collections::{HashMap, HashSet};

use ammonia::Builder;

use crate::convert::transform;

/// Sanitizes a fragment against the allow-list of tags the converter can
/// emit. Anything else, attributes included, is stripped.
pub fn sanitize_fragment(html: &str) -> String {
    let tags: HashSet<&'static str> = [
        "a",
        "blockquote",
        "br",
        "code",
        "del",
        "em",
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "h7",
        "h8",
        "h9",
        "li",
        "ol",
        "p",
        "pre",
        "strong",
        "table",
        "td",
        "th",
        "tr",
        "ul",
    ]
    .iter()
    .copied()
    .collect();

    let mut tag_attributes = HashMap::new();
    tag_attributes.insert("a", ["href"].iter().copied().collect());

    Builder::new()
        .tags(tags)
        .tag_attributes(tag_attributes)
        .clean(html)
        .to_string()
}

/// [`transform`] followed by [`sanitize_fragment`].
pub fn transform_sanitized(markdown: &str, target_language: &str) -> String {
    sanitize_fragment(&transform(markdown, target_language))
}
