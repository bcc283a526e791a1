//! Folding blocks.
//!
//! ```text
//! ---Details---
//! hidden *content*
//! ---Details---
//! ```
//!
//! A block opens with `---title---` on its own line and closes at the next
//! line carrying the identical delimiter. The legacy untitled form uses the
//! fixed title `折叠`. An opening delimiter without a matching close is left
//! as literal text.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{BlockTransformer, Capabilities, RunContext};
use crate::error::RenderError;
use crate::fence::FenceTracker;
use crate::macros;
use crate::vault::{PlaceholderKind, PlaceholderVault, Restored};

static DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^---([^\-\r\n][^\r\n]*?)---[ \t]*$").unwrap());

/// Title of the legacy untitled fold.
const LEGACY_TITLE: &str = "折叠";
/// Panel title shown for legacy folds.
const LEGACY_DISPLAY_TITLE: &str = "点击展开";

/// An extracted folding block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldBlock {
    /// Title as written in the delimiter.
    pub title: String,
    /// Raw Markdown body, trimmed.
    pub body: String,
}

impl FoldBlock {
    /// Title shown on the expandable panel.
    pub fn display_title(&self) -> &str {
        if self.title == LEGACY_TITLE {
            LEGACY_DISPLAY_TITLE
        } else {
            &self.title
        }
    }
}

/// Turns folding blocks into expandable panels.
#[derive(Debug)]
pub struct FoldingTransformer {
    vault: PlaceholderVault,
    blocks: Vec<FoldBlock>,
}

impl FoldingTransformer {
    /// Create a transformer with no extracted blocks.
    pub fn new() -> Self {
        Self {
            vault: PlaceholderVault::new(PlaceholderKind::Fold),
            blocks: Vec::new(),
        }
    }

    /// Blocks extracted by the last preprocess.
    pub fn blocks(&self) -> &[FoldBlock] {
        &self.blocks
    }
}

impl Default for FoldingTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockTransformer for FoldingTransformer {
    fn name(&self) -> &'static str {
        "folding"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::BOTH
    }

    fn preprocess(&mut self, text: &str) -> String {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut out: Vec<String> = Vec::with_capacity(lines.len());
        let mut fence = FenceTracker::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            let was_in_fence = fence.in_fence();
            let in_code = fence.update(line) || was_in_fence;
            if !in_code
                && let Some(title) = delimiter_title(line)
                && let Some(close) = find_close(&lines, i + 1, title)
            {
                let body = lines[i + 1..close].join("\n").trim().to_owned();
                let original = lines[i..=close].join("\n");
                let token = self.vault.stash(&original);
                debug!(title, token = %token, "Extracted fold block");
                self.blocks.push(FoldBlock {
                    title: title.to_owned(),
                    body,
                });
                out.push(String::new());
                out.push(token);
                out.push(String::new());
                i = close + 1;
                continue;
            }
            out.push(line.to_owned());
            i += 1;
        }

        out.join("\n")
    }

    fn postprocess(&mut self, html: &str, ctx: &mut RunContext<'_>) -> Result<String, RenderError> {
        let mut rendered = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            let body = ctx.render_fragment(&block.body);
            rendered.push(macros::expand(block.display_title(), &body));
        }

        let html = self.vault.restore(html, |record| {
            rendered.get(record.index).cloned().map(Restored::Block)
        });
        for (record, markup) in self.vault.records().iter().zip(rendered) {
            ctx.publish(&record.token, Restored::Block(markup));
        }
        Ok(html)
    }
}

/// Title of a fold delimiter line.
fn delimiter_title(line: &str) -> Option<&str> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    DELIMITER
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Index of the line closing a fold with `title`, skipping fenced code.
fn find_close(lines: &[&str], from: usize, title: &str) -> Option<usize> {
    let mut fence = FenceTracker::new();
    for (offset, line) in lines[from..].iter().enumerate() {
        let was_in_fence = fence.in_fence();
        if fence.update(line) || was_in_fence {
            continue;
        }
        if delimiter_title(line) == Some(title) {
            return Some(from + offset);
        }
    }
    None
}
