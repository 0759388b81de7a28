//! Line-oriented conversion driver.
//!
//! Each call builds a fresh [`Converter`], so conversions are pure and can
//! run concurrently. The driver walks the document once; code-block state
//! is handled first, then the block rules fire in a fixed order (heading,
//! single-line quote, quote toggles, tables, lists) before the remaining
//! text falls through to paragraph handling. Whatever is still open at the
//! end is force-closed, so the fragment is always balanced.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::inline;
use crate::language::Language;
use crate::samples::{self, SampleFilter};
use crate::scan::{find_unescaped_from, is_escaped, split_unescaped};

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^h([1-9])\.(.*)$").unwrap());
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([*#]+)\s+(.*)$").unwrap());
static BLOCK_QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^bq\.\s+(.*)$").unwrap());

/// Converts one rule description to an HTML fragment.
///
/// Empty input is returned unchanged. `target_language` is a free-text
/// label; it selects which `{code}` sample survives and which registry code
/// rule keys link to. An empty label keeps every sample and leaves rule
/// keys alone. The conversion never fails; malformed markup degrades to
/// plain output with all open constructs closed.
pub fn transform(markdown: &str, target_language: &str) -> String {
    if markdown.is_empty() {
        return String::new();
    }
    Converter::new(markdown, target_language).run()
}

enum CodeState {
    Outside,
    Kept,
    Foreign,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn from_marker(marker: char) -> ListKind {
        if marker == '#' {
            ListKind::Ordered
        } else {
            ListKind::Unordered
        }
    }

    fn open_tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "<ul>",
            ListKind::Ordered => "<ol>",
        }
    }

    fn close_tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "</ul>",
            ListKind::Ordered => "</ol>",
        }
    }
}

struct ListLevel {
    kind: ListKind,
    item_open: bool,
}

struct Converter<'a> {
    lines: Vec<&'a str>,
    language: Option<Language>,
    filter: SampleFilter,
    code: CodeState,
    table_open: bool,
    quote_open: bool,
    expect_paragraph: bool,
    lists: Vec<ListLevel>,
    out: Vec<String>,
}

impl<'a> Converter<'a> {
    fn new(markdown: &'a str, target_language: &str) -> Converter<'a> {
        let lines = split_lines(markdown);
        let filter = SampleFilter::scan(&lines, target_language);
        Converter {
            lines,
            language: Language::from_label(target_language),
            filter,
            code: CodeState::Outside,
            table_open: false,
            quote_open: false,
            expect_paragraph: true,
            lists: Vec::new(),
            out: Vec::new(),
        }
    }

    fn run(mut self) -> String {
        let mut index = 0;
        while index < self.lines.len() {
            let line = self.lines[index];
            index += 1;
            if samples::is_code_marker(line) {
                self.handle_code_marker(line);
                continue;
            }
            match self.code {
                CodeState::Foreign => continue,
                CodeState::Kept => {
                    self.out.push(inline::escape_code(line));
                    continue;
                }
                CodeState::Outside => {}
            }
            index = self.handle_content_line(line, index);
        }
        self.finish();
        self.out.join("\n")
    }

    /// Marker lines toggle the code state; content is never emitted for
    /// them beyond the `<pre>` wrapper of a kept block.
    fn handle_code_marker(&mut self, line: &str) {
        match self.code {
            CodeState::Outside => {
                if self.filter.keeps(line) {
                    self.out.push("<pre>".to_string());
                    self.code = CodeState::Kept;
                } else {
                    self.code = CodeState::Foreign;
                }
            }
            CodeState::Kept => {
                self.out.push("</pre>".to_string());
                self.code = CodeState::Outside;
                self.expect_paragraph = true;
            }
            CodeState::Foreign => {
                self.code = CodeState::Outside;
            }
        }
    }

    /// Applies the block rules to one line outside code. Returns the index
    /// of the next line to process, which may skip lines a multi-line table
    /// row absorbed.
    fn handle_content_line(&mut self, line: &'a str, next_index: usize) -> usize {
        if self.table_open && !line.starts_with('|') {
            self.out.push("</table>".to_string());
            self.table_open = false;
        }
        if !self.lists.is_empty() && !line.trim().is_empty() && !LIST_ITEM.is_match(line) {
            let mut closings = String::new();
            self.unwind_lists_to(0, &mut closings);
            self.out.push(closings);
        }

        if let Some(caps) = HEADING.captures(line) {
            let level = caps[1].to_string();
            let content = self.render_inline(caps[2].trim());
            self.out.push(format!("<h{level}>{content}</h{level}>"));
            self.expect_paragraph = true;
            return next_index;
        }

        if let Some(caps) = BLOCK_QUOTE.captures(line) {
            let content = self.render_inline(caps[1].trim());
            self.out.push(format!("<blockquote>{content}</blockquote>"));
            self.expect_paragraph = true;
            return next_index;
        }

        if find_unescaped_from(line, "{quote}", 0).is_some() {
            let rendered = self.replace_quote_markers(line);
            self.out.push(rendered);
            self.expect_paragraph = true;
            return next_index;
        }

        if line.starts_with('|') {
            if !self.table_open {
                self.out.push("<table>".to_string());
                self.table_open = true;
            }
            let (row, resume) = self.absorb_row(line, next_index);
            let rendered = self.render_row(&row);
            self.out.push(rendered);
            self.expect_paragraph = false;
            return resume;
        }

        if let Some(caps) = LIST_ITEM.captures(line) {
            let markers = caps[1].to_string();
            let content = caps[2].to_string();
            let rendered = self.render_list_item(&markers, &content);
            self.out.push(rendered);
            self.expect_paragraph = false;
            return next_index;
        }

        let rendered = self.render_inline(line);
        if rendered.trim().is_empty() {
            self.expect_paragraph = true;
            return next_index;
        }
        if self.expect_paragraph && self.lists.is_empty() {
            self.out.push(format!("<p>{rendered}</p>"));
        } else {
            self.out.push(rendered);
            self.expect_paragraph = true;
        }
        next_index
    }

    /// Each unescaped `{quote}` occurrence toggles the open state; the text
    /// around the markers is still inline-transformed.
    fn replace_quote_markers(&mut self, line: &str) -> String {
        let mut out = String::new();
        let mut cursor = 0;
        while let Some(pos) = find_unescaped_from(line, "{quote}", cursor) {
            out.push_str(&self.render_inline(line[cursor..pos].trim()));
            out.push_str(if self.quote_open {
                "</blockquote>"
            } else {
                "<blockquote>"
            });
            self.quote_open = !self.quote_open;
            cursor = pos + "{quote}".len();
        }
        out.push_str(&self.render_inline(line[cursor..].trim()));
        out
    }

    /// Collects continuation lines of a multi-line row until a line ends
    /// with an unescaped `|` or the document runs out.
    fn absorb_row(&self, line: &str, mut index: usize) -> (String, usize) {
        if row_is_complete(line) {
            return (line.to_string(), index);
        }
        let mut row = line.to_string();
        while index < self.lines.len() {
            let next = self.lines[index];
            index += 1;
            row.push('\n');
            row.push_str(next);
            if row_is_complete(next) {
                break;
            }
        }
        (row, index)
    }

    /// Splits a row into cells and renders them. `||` starts a header row.
    fn render_row(&self, row: &str) -> String {
        let trimmed = row.trim_end();
        let header = trimmed.starts_with("||");
        let separator = if header { "||" } else { "|" };
        let mut cells = split_unescaped(trimmed, separator);
        if cells.first().is_some_and(|cell| cell.trim().is_empty()) {
            cells.remove(0);
        }
        if cells.last().is_some_and(|cell| cell.trim().is_empty()) {
            cells.pop();
        }
        let (open_tag, close_tag) = if header {
            ("<th>", "</th>")
        } else {
            ("<td>", "</td>")
        };
        let mut out = String::from("<tr>");
        for cell in &cells {
            out.push_str(open_tag);
            out.push_str(&self.render_cell(cell));
            out.push_str(close_tag);
        }
        out.push_str("</tr>");
        out
    }

    /// Pieces of a multi-line cell are joined with `<br/>` after each piece
    /// went through the inline pipeline on its own.
    fn render_cell(&self, cell: &str) -> String {
        cell.trim()
            .split('\n')
            .map(|piece| self.render_inline(piece.trim()))
            .collect::<Vec<_>>()
            .join("<br/>")
    }

    /// Adjusts the list stack for one item line and renders the item. The
    /// `</li>` of an item is withheld until a sibling arrives or the stack
    /// unwinds past it.
    fn render_list_item(&mut self, markers: &str, content: &str) -> String {
        let depth = markers.chars().count();
        let kinds: Vec<ListKind> = markers.chars().map(ListKind::from_marker).collect();
        let mut out = String::new();
        self.unwind_lists_to(depth, &mut out);
        if self.lists.len() == depth {
            // a sibling with the other marker kind restarts the level
            let kind = kinds[depth - 1];
            if self.lists.last().is_some_and(|level| level.kind != kind) {
                self.unwind_lists_to(depth - 1, &mut out);
            }
        }
        while self.lists.len() < depth {
            let kind = kinds[self.lists.len()];
            out.push_str(kind.open_tag());
            self.lists.push(ListLevel {
                kind,
                item_open: false,
            });
        }
        if let Some(level) = self.lists.last_mut() {
            if level.item_open {
                out.push_str("</li>");
            }
            level.item_open = true;
        }
        out.push_str("<li>");
        out.push_str(&self.render_inline(content));
        out
    }

    fn unwind_lists_to(&mut self, depth: usize, out: &mut String) {
        while self.lists.len() > depth {
            if let Some(level) = self.lists.pop() {
                if level.item_open {
                    out.push_str("</li>");
                }
                out.push_str(level.kind.close_tag());
            }
        }
    }

    fn render_inline(&self, content: &str) -> String {
        inline::apply(content, self.language)
    }

    /// Force-closes whatever is still open: lists innermost first, then the
    /// table, then the code block, then the quote.
    fn finish(&mut self) {
        let mut closings = String::new();
        self.unwind_lists_to(0, &mut closings);
        if self.table_open {
            closings.push_str("</table>");
            self.table_open = false;
        }
        if let CodeState::Kept = self.code {
            closings.push_str("</pre>");
            self.code = CodeState::Outside;
        }
        if self.quote_open {
            closings.push_str("</blockquote>");
            self.quote_open = false;
        }
        if !closings.is_empty() {
            self.out.push(closings);
        }
    }
}

/// Splits into lines, tolerating CRLF endings.
fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

fn row_is_complete(line: &str) -> bool {
    let trimmed = line.trim_end();
    trimmed.ends_with('|') && !is_escaped(trimmed, trimmed.len() - 1)
}
