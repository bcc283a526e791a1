//! Code fence tracking for line-based rewrites.
//!
//! Preprocessing passes work on raw Markdown lines and must not touch
//! anything inside fenced code blocks or inline code spans.

/// Tracks code fence state during line-by-line processing.
///
/// Code fences in `CommonMark` can use backticks or tildes (three or more).
/// The closing fence must use the same character and be at least as long
/// as the opening fence.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    /// Character used for the current fence (backtick or tilde).
    fence_char: Option<char>,
    /// Length of the opening fence (minimum length for closing).
    fence_len: usize,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Check if currently inside a fenced code block.
    pub(crate) fn in_fence(&self) -> bool {
        self.fence_char.is_some()
    }

    /// Update fence state based on a line.
    ///
    /// Returns `true` if the line is a fence marker (opening or closing).
    pub(crate) fn update(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();

        if let Some(fence_char) = self.fence_char {
            if is_closing_fence(trimmed, fence_char, self.fence_len) {
                self.fence_char = None;
                self.fence_len = 0;
                return true;
            }
            false
        } else if let Some(open) = OpeningFence::parse(line) {
            self.fence_char = Some(open.fence_char);
            self.fence_len = open.marker.len();
            true
        } else {
            false
        }
    }
}

/// An opening code fence line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpeningFence<'a> {
    /// Fence character.
    pub(crate) fence_char: char,
    /// The run of fence characters, e.g. "```" or "~~~~".
    pub(crate) marker: &'a str,
    /// Info string after the marker, trimmed.
    pub(crate) info: &'a str,
}

impl<'a> OpeningFence<'a> {
    /// Parse a line as an opening fence.
    pub(crate) fn parse(line: &'a str) -> Option<Self> {
        let trimmed = line.trim_start();
        let fence_char = trimmed.chars().next()?;
        if fence_char != '`' && fence_char != '~' {
            return None;
        }

        let len = trimmed.chars().take_while(|&c| c == fence_char).count();
        if len < 3 {
            return None;
        }

        let info = trimmed[len..].trim();
        // Backtick fences cannot carry backticks in the info string
        if fence_char == '`' && info.contains('`') {
            return None;
        }

        Some(Self {
            fence_char,
            marker: &trimmed[..len],
            info,
        })
    }

    /// First word of the info string.
    pub(crate) fn language(&self) -> Option<&'a str> {
        self.info.split_whitespace().next()
    }

    /// Check whether `line` closes this fence.
    pub(crate) fn is_closed_by(&self, line: &str) -> bool {
        is_closing_fence(line.trim_start(), self.fence_char, self.marker.len())
    }
}

/// Check if a line is a valid closing fence.
///
/// The closing fence must use the same character as the opening one, be at
/// least as long, and carry nothing but whitespace after the fence run.
fn is_closing_fence(trimmed: &str, expected_char: char, min_len: usize) -> bool {
    if !trimmed.starts_with(expected_char) {
        return false;
    }

    let count = trimmed.chars().take_while(|&c| c == expected_char).count();
    if count < min_len {
        return false;
    }

    trimmed[count..].chars().all(char::is_whitespace)
}

/// Apply `f` to every stretch of text outside fenced code blocks.
///
/// Fence lines and their contents are copied unchanged. Stretches always
/// consist of whole lines, so patterns that never cross a newline see the
/// same matches they would see on the full text.
pub(crate) fn map_prose<F>(text: &str, mut f: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(text.len());
    let mut tracker = FenceTracker::new();
    let mut prose_start: Option<usize> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let was_in_fence = tracker.in_fence();
        let is_marker = tracker.update(line);
        let is_code = was_in_fence || is_marker;

        if is_code {
            if let Some(start) = prose_start.take() {
                out.push_str(&f(&text[start..offset]));
            }
            out.push_str(line);
        } else if prose_start.is_none() {
            prose_start = Some(offset);
        }
        offset += line.len();
    }

    if let Some(start) = prose_start {
        out.push_str(&f(&text[start..]));
    }

    out
}

/// Apply `f` to text outside fenced code blocks and inline code spans.
pub(crate) fn map_plain_text<F>(text: &str, mut f: F) -> String
where
    F: FnMut(&str) -> String,
{
    map_prose(text, |segment| map_outside_code_spans(segment, &mut f))
}

/// Apply `f` to every stretch of text outside inline code spans.
///
/// A span opens with a run of backticks not preceded by a backslash and
/// closes with a run of the same length within the same paragraph. A run
/// with no matching close is literal text.
pub(crate) fn map_outside_code_spans<F>(text: &str, mut f: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(text.len());
    let mut plain_start = 0;
    let mut pos = 0;

    while let Some(found) = text[pos..].find('`') {
        let open = pos + found;
        if is_escaped(&text[..open]) {
            pos = open + 1;
            continue;
        }

        let run = backtick_run(&text[open..]);
        let body_start = open + run;
        let limit = paragraph_end(text, body_start);
        match find_closing_run(&text[body_start..limit], run) {
            Some(close) => {
                let end = body_start + close + run;
                out.push_str(&f(&text[plain_start..open]));
                out.push_str(&text[open..end]);
                plain_start = end;
                pos = end;
            }
            None => pos = body_start,
        }
    }

    out.push_str(&f(&text[plain_start..]));
    out
}

fn backtick_run(text: &str) -> usize {
    text.bytes().take_while(|&b| b == b'`').count()
}

/// Odd number of trailing backslashes.
fn is_escaped(before: &str) -> bool {
    before.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

/// Offset of the first run of exactly `len` backticks in `text`.
fn find_closing_run(text: &str, len: usize) -> Option<usize> {
    let mut pos = 0;
    while let Some(found) = text[pos..].find('`') {
        let start = pos + found;
        let run = backtick_run(&text[start..]);
        if run == len {
            return Some(start);
        }
        pos = start + run;
    }
    None
}

/// Offset of the first blank line at or after `from`, or the end of `text`.
fn paragraph_end(text: &str, from: usize) -> usize {
    let mut pos = from;
    while let Some(found) = text[pos..].find('\n') {
        let next = pos + found + 1;
        let line_end = text[next..].find('\n').map_or(text.len(), |i| next + i);
        if text[next..line_end].trim().is_empty() {
            return next;
        }
        pos = next;
    }
    text.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_fence_initially() {
        let tracker = FenceTracker::new();
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_backtick_fence() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("```rust"));
        assert!(tracker.in_fence());
        assert!(!tracker.update("fn main() {}"));
        assert!(tracker.in_fence());
        assert!(tracker.update("```"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_tilde_fence() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("~~~python"));
        assert!(!tracker.update("print('hello')"));
        assert!(tracker.update("~~~"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_shorter_fence_not_closing() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("````"));
        assert!(!tracker.update("```"));
        assert!(tracker.in_fence());
        assert!(tracker.update("`````"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_mixed_chars_not_closing() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("```"));
        assert!(!tracker.update("~~~"));
        assert!(tracker.in_fence());
    }

    #[test]
    fn test_closing_fence_with_info_not_closing() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("```"));
        assert!(!tracker.update("```rust"));
        assert!(tracker.in_fence());
    }

    #[test]
    fn test_two_backticks_not_fence() {
        let mut tracker = FenceTracker::new();
        assert!(!tracker.update("``code``"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_parse_opening_fence() {
        let fence = OpeningFence::parse("  ~~~~mermaid  theme=dark").unwrap();
        assert_eq!(fence.fence_char, '~');
        assert_eq!(fence.marker, "~~~~");
        assert_eq!(fence.info, "mermaid  theme=dark");
        assert_eq!(fence.language(), Some("mermaid"));
        assert!(fence.is_closed_by("~~~~~"));
        assert!(!fence.is_closed_by("~~~"));
    }

    #[test]
    fn test_backtick_info_with_backtick_rejected() {
        assert_eq!(OpeningFence::parse("``` foo`bar"), None);
        assert!(OpeningFence::parse("~~~ foo`bar").is_some());
    }

    #[test]
    fn test_map_prose_skips_code() {
        let text = "a\n```\na\n```\na\n";
        let result = map_prose(text, |s| s.replace('a', "b"));
        assert_eq!(result, "b\n```\na\n```\nb\n");
    }

    #[test]
    fn test_map_prose_unclosed_fence_runs_to_end() {
        let text = "a\n~~~\na\na";
        let result = map_prose(text, |s| s.replace('a', "b"));
        assert_eq!(result, "b\n~~~\na\na");
    }

    #[test]
    fn test_map_prose_without_fences() {
        let result = map_prose("x y", |s| s.to_uppercase());
        assert_eq!(result, "X Y");
    }

    #[test]
    fn test_code_spans_skipped() {
        let result = map_outside_code_spans("a `a` a ``a ` a`` a", |s| s.replace('a', "b"));
        assert_eq!(result, "b `a` b ``a ` a`` b");
    }

    #[test]
    fn test_unmatched_backticks_are_literal() {
        let result = map_outside_code_spans("a ``a` a", |s| s.replace('a', "b"));
        assert_eq!(result, "b ``b` b");
    }

    #[test]
    fn test_escaped_backtick_does_not_open_span() {
        let result = map_outside_code_spans(r"a \`a` a", |s| s.replace('a', "b"));
        assert_eq!(result, r"b \`b` b");
    }

    #[test]
    fn test_code_span_ends_at_blank_line() {
        let text = "a `a\n\na` a";
        let result = map_outside_code_spans(text, |s| s.replace('a', "b"));
        assert_eq!(result, "b `b\n\nb` b");
    }

    #[test]
    fn test_code_span_may_cross_single_newline() {
        let result = map_outside_code_spans("a `a\na` a", |s| s.replace('a', "b"));
        assert_eq!(result, "b `a\na` b");
    }

    #[test]
    fn test_map_plain_text_skips_fences_and_spans() {
        let text = "a `a`\n```\na\n```\na\n";
        let result = map_plain_text(text, |s| s.replace('a', "b"));
        assert_eq!(result, "b `a`\n```\na\n```\nb\n");
    }
}
