//! Mermaid diagrams.
//!
//! Fenced `mermaid` blocks are lifted out before conversion so the converter
//! never escapes their source, then re-embedded verbatim in a markdown macro
//! that the remote system renders.

use tracing::debug;

use super::{BlockTransformer, Capabilities, RunContext};
use crate::error::RenderError;
use crate::fence::{FenceTracker, OpeningFence};
use crate::macros;
use crate::vault::{PlaceholderKind, PlaceholderVault, Restored};

/// Info string language that marks a diagram.
const DIAGRAM_LANGUAGE: &str = "mermaid";

#[derive(Debug, Clone, PartialEq, Eq)]
struct DiagramBlock {
    /// Fence marker of the source block.
    fence: String,
    /// Full info string.
    info: String,
    /// Diagram source, verbatim.
    source: String,
}

impl DiagramBlock {
    fn fenced(&self) -> String {
        if self.source.is_empty() {
            format!("{}{}\n{}", self.fence, self.info, self.fence)
        } else {
            format!("{}{}\n{}\n{}", self.fence, self.info, self.source, self.fence)
        }
    }
}

/// Turns fenced Mermaid blocks into markdown macros.
#[derive(Debug)]
pub struct DiagramTransformer {
    vault: PlaceholderVault,
    blocks: Vec<DiagramBlock>,
}

impl DiagramTransformer {
    /// Create a transformer with no extracted blocks.
    pub fn new() -> Self {
        Self {
            vault: PlaceholderVault::new(PlaceholderKind::Diagram),
            blocks: Vec::new(),
        }
    }
}

impl Default for DiagramTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockTransformer for DiagramTransformer {
    fn name(&self) -> &'static str {
        "diagram"
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
            if !fence.in_fence()
                && let Some(open) = OpeningFence::parse(line)
                && open.language() == Some(DIAGRAM_LANGUAGE)
                && let Some(close) = (i + 1..lines.len()).find(|&j| open.is_closed_by(lines[j]))
            {
                let block = DiagramBlock {
                    fence: open.marker.to_owned(),
                    info: open.info.to_owned(),
                    source: lines[i + 1..close].join("\n"),
                };
                let token = self.vault.stash(&lines[i..=close].join("\n"));
                debug!(token = %token, lines = close - i - 1, "Extracted diagram");
                self.blocks.push(block);

                let indent = &line[..line.len() - line.trim_start().len()];
                out.push(String::new());
                out.push(format!("{indent}{token}"));
                out.push(String::new());
                i = close + 1;
                continue;
            }
            fence.update(line);
            out.push(line.to_owned());
            i += 1;
        }

        out.join("\n")
    }

    fn postprocess(&mut self, html: &str, ctx: &mut RunContext<'_>) -> Result<String, RenderError> {
        let rendered: Vec<String> = self
            .blocks
            .iter()
            .map(|block| macros::markdown(&block.fenced()))
            .collect();

        let html = self.vault.restore(html, |record| {
            rendered.get(record.index).cloned().map(Restored::Block)
        });
        for (record, markup) in self.vault.records().iter().zip(rendered) {
            ctx.publish(&record.token, Restored::Block(markup));
        }
        Ok(html)
    }
}
