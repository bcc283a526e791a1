//! Placeholder vault.
//!
//! Hides spans of text from the Markdown converter by swapping them for
//! sentinel tokens, then puts rendered content back after HTML generation.
//!
//! A sentinel has the form `{PREFIX}_{kind}_{index}_Q`. The prefix is a fixed
//! string that neither authored content nor the converter produces, the kind
//! keeps tokens of different vaults apart, and the index is the ordinal of the
//! span within its vault. The trailing `_Q` terminates the index so that
//! `_1_Q` never matches inside `_10_Q`. Underscores between letters and
//! digits are intraword for `CommonMark`, so the converter never turns a
//! sentinel into emphasis.

use std::convert::Infallible;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::warn;

/// Fixed sentinel prefix.
pub(crate) const SENTINEL_PREFIX: &str = "MDKMSVQX7";

static SENTINEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"MDKMSVQX7_[a-z]+_\d+_Q").unwrap());

/// Kind of protected content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    /// Folding block.
    Fold,
    /// Fenced diagram source.
    Diagram,
    /// Image reference.
    Image,
    /// Run of task list items.
    TaskList,
}

impl PlaceholderKind {
    /// Name used inside the sentinel token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fold => "fold",
            Self::Diagram => "diagram",
            Self::Image => "image",
            Self::TaskList => "tasks",
        }
    }
}

/// A protected span and the token standing in for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Sentinel token.
    pub token: String,
    /// Discovery ordinal within the vault.
    pub index: usize,
    /// Kind of protected content.
    pub kind: PlaceholderKind,
    /// Original text of the span.
    pub original: String,
}

/// Content to put back in place of a sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restored {
    /// Block-level markup.
    ///
    /// Replaces the sentinel together with the paragraph or inline-code
    /// wrapper the converter put around it.
    Block(String),
    /// Inline markup. Replaces only the sentinel itself.
    Inline(String),
}

/// Stores protected spans for one kind of content within one run.
#[derive(Debug)]
pub struct PlaceholderVault {
    kind: PlaceholderKind,
    records: Vec<Placeholder>,
}

impl PlaceholderVault {
    /// Create an empty vault.
    pub fn new(kind: PlaceholderKind) -> Self {
        Self {
            kind,
            records: Vec::new(),
        }
    }

    /// Store a span and return its sentinel token.
    pub fn stash(&mut self, original: &str) -> String {
        let index = self.records.len();
        let token = format!("{SENTINEL_PREFIX}_{}_{index}_Q", self.kind.as_str());
        self.records.push(Placeholder {
            token: token.clone(),
            index,
            kind: self.kind,
            original: original.to_owned(),
        });
        token
    }

    /// Replace every non-overlapping match of `pattern` with a sentinel.
    pub fn protect(&mut self, pattern: &Regex, text: &str) -> String {
        pattern
            .replace_all(text, |caps: &Captures<'_>| self.stash(&caps[0]))
            .into_owned()
    }

    /// Protected spans in discovery order.
    pub fn records(&self) -> &[Placeholder] {
        &self.records
    }

    /// Whether nothing was protected.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Put rendered content back in place of every sentinel.
    ///
    /// A record the renderer returns `None` for keeps its sentinel, which the
    /// pipeline later reports as [`RenderError::UnresolvedPlaceholder`].
    ///
    /// [`RenderError::UnresolvedPlaceholder`]: crate::RenderError::UnresolvedPlaceholder
    pub fn restore<F>(&self, text: &str, mut render: F) -> String
    where
        F: FnMut(&Placeholder) -> Option<Restored>,
    {
        let restored: Result<String, Infallible> =
            self.try_restore(text, |record| Ok(render(record)));
        match restored {
            Ok(text) => text,
        }
    }

    /// Like [`restore`](Self::restore), with a renderer that can fail.
    pub fn try_restore<F, E>(&self, text: &str, mut render: F) -> Result<String, E>
    where
        F: FnMut(&Placeholder) -> Result<Option<Restored>, E>,
    {
        let mut text = text.to_owned();
        for record in &self.records {
            match render(record)? {
                Some(content) => text = substitute(&text, &record.token, &content),
                None => warn!(token = %record.token, "No content for placeholder"),
            }
        }
        Ok(text)
    }
}

/// Replace `token` in `text` with restored content.
pub(crate) fn substitute(text: &str, token: &str, content: &Restored) -> String {
    match content {
        Restored::Block(markup) => {
            let mut out = text.to_owned();
            for wrapped in [
                format!("<p><code>{token}</code></p>"),
                format!("<p>{token}</p>"),
                format!("<code>{token}</code>"),
            ] {
                out = out.replace(&wrapped, markup);
            }
            out.replace(token, markup)
        }
        Restored::Inline(markup) => text.replace(token, markup),
    }
}

/// Find the first sentinel left in `text`.
pub fn find_unresolved(text: &str) -> Option<&str> {
    SENTINEL.find(text).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn word_pattern() -> Regex {
        Regex::new(r"\*\*[^*]+\*\*").unwrap()
    }

    #[test]
    fn test_stash_generates_sequential_tokens() {
        let mut vault = PlaceholderVault::new(PlaceholderKind::Fold);
        assert_eq!(vault.stash("a"), "MDKMSVQX7_fold_0_Q");
        assert_eq!(vault.stash("b"), "MDKMSVQX7_fold_1_Q");
        assert_eq!(vault.records().len(), 2);
        assert_eq!(vault.records()[1].original, "b");
        assert_eq!(vault.records()[1].index, 1);
    }

    #[test]
    fn test_tokens_of_different_kinds_differ() {
        let mut folds = PlaceholderVault::new(PlaceholderKind::Fold);
        let mut images = PlaceholderVault::new(PlaceholderKind::Image);
        assert_ne!(folds.stash("x"), images.stash("x"));
    }

    #[test]
    fn test_protect_replaces_matches() {
        let mut vault = PlaceholderVault::new(PlaceholderKind::Image);
        let text = vault.protect(&word_pattern(), "a **b** c **d**");
        assert_eq!(text, "a MDKMSVQX7_image_0_Q c MDKMSVQX7_image_1_Q");
        let originals: Vec<_> = vault.records().iter().map(|r| r.original.as_str()).collect();
        assert_eq!(originals, vec!["**b**", "**d**"]);
    }

    #[test]
    fn test_identity_round_trip() {
        let inputs = [
            "",
            "no matches here",
            "**a**",
            "**a****b**",
            "x **one** y **two** z **three**\n**four**12",
            "**a**0 **b**1 **c**2 **d**3 **e**4 **f**5 **g**6 **h**7 **i**8 **j**9 **k**10",
        ];
        for input in inputs {
            let mut vault = PlaceholderVault::new(PlaceholderKind::Fold);
            let protected = vault.protect(&word_pattern(), input);
            let restored =
                vault.restore(&protected, |r| Some(Restored::Inline(r.original.clone())));
            assert_eq!(restored, input);
        }
    }

    #[test]
    fn test_restore_does_not_confuse_single_and_double_digit_indexes() {
        let mut vault = PlaceholderVault::new(PlaceholderKind::Image);
        let tokens: Vec<_> = (0..11).map(|i| vault.stash(&i.to_string())).collect();
        let text = tokens.join(" ");
        let restored = vault.restore(&text, |r| Some(Restored::Inline(format!("<{}>", r.original))));
        assert_eq!(restored, "<0> <1> <2> <3> <4> <5> <6> <7> <8> <9> <10>");
    }

    #[test]
    fn test_block_restore_removes_paragraph_wrapper() {
        let mut vault = PlaceholderVault::new(PlaceholderKind::Fold);
        let token = vault.stash("x");
        let html = format!("<p>before</p>\n<p>{token}</p>\n<p>after</p>\n");
        let restored = vault.restore(&html, |_| Some(Restored::Block("<div/>".to_owned())));
        assert_eq!(restored, "<p>before</p>\n<div/>\n<p>after</p>\n");
    }

    #[test]
    fn test_block_restore_removes_code_wrappers() {
        let mut vault = PlaceholderVault::new(PlaceholderKind::Diagram);
        let token = vault.stash("x");
        let html = format!("<p><code>{token}</code></p><li><code>{token}</code></li>");
        let restored = vault.restore(&html, |_| Some(Restored::Block("M".to_owned())));
        assert_eq!(restored, "M<li>M</li>");
    }

    #[test]
    fn test_inline_restore_keeps_wrapper() {
        let mut vault = PlaceholderVault::new(PlaceholderKind::Image);
        let token = vault.stash("x");
        let html = format!("<p>{token}</p>");
        let restored = vault.restore(&html, |_| Some(Restored::Inline("<img/>".to_owned())));
        assert_eq!(restored, "<p><img/></p>");
    }

    #[test]
    fn test_missing_rendering_leaves_sentinel() {
        let mut vault = PlaceholderVault::new(PlaceholderKind::Fold);
        let token = vault.stash("x");
        let restored = vault.restore(&format!("<p>{token}</p>"), |_| None);
        assert_eq!(find_unresolved(&restored), Some(token.as_str()));
    }

    #[test]
    fn test_try_restore_propagates_error() {
        let mut vault = PlaceholderVault::new(PlaceholderKind::Image);
        let token = vault.stash("x");
        let result: Result<String, &str> = vault.try_restore(&token, |_| Err("boom"));
        assert_eq!(result, Err("boom"));
    }

    #[test]
    fn test_find_unresolved_ignores_plain_text() {
        assert_eq!(find_unresolved("<p>MDKMSVQX7 is not a token</p>"), None);
        assert_eq!(find_unresolved("id=\"mdkmsvqx7-fold-0-q\""), None);
    }
}
