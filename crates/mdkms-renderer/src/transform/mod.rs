//! Block transformers.
//!
//! Each transformer is a two-phase rewrite stage. The preprocess phase runs
//! on raw Markdown before conversion, usually hiding a construct behind a
//! placeholder; the postprocess phase runs on the converted HTML and puts
//! the final markup in. A transformer declares which phases it implements
//! and the pipeline only calls those.
//!
//! Postprocess phases run in the same order as preprocess phases. Content a
//! stage renders for a placeholder is also published to the [`RunContext`],
//! so a later stage that renders a fragment of its own (a fold body) sees
//! the final markup of everything nested in it.

mod diagram;
mod fold;
mod highlight;
mod table;

pub use diagram::DiagramTransformer;
pub use fold::{FoldBlock, FoldingTransformer};
pub use highlight::HighlightTransformer;
pub use table::TableTransformer;

use crate::code_block::macroize_code_blocks;
use crate::converter::MarkupConverter;
use crate::error::RenderError;
use crate::vault::{Restored, substitute};

/// Phases a transformer implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Runs before Markdown conversion.
    pub preprocess: bool,
    /// Runs after Markdown conversion.
    pub postprocess: bool,
}

impl Capabilities {
    /// Both phases.
    pub const BOTH: Self = Self {
        preprocess: true,
        postprocess: true,
    };
    /// Postprocess only.
    pub const POST: Self = Self {
        preprocess: false,
        postprocess: true,
    };
}

/// A two-phase rewrite stage.
///
/// A transformer instance serves exactly one pipeline run: placeholders
/// recorded by `preprocess` are consumed by the matching `postprocess`.
pub trait BlockTransformer {
    /// Stage name for diagnostics.
    fn name(&self) -> &'static str;

    /// Phases this transformer implements.
    fn capabilities(&self) -> Capabilities;

    /// Rewrite raw Markdown before conversion.
    fn preprocess(&mut self, text: &str) -> String {
        text.to_owned()
    }

    /// Rewrite converted HTML.
    fn postprocess(
        &mut self,
        html: &str,
        _ctx: &mut RunContext<'_>,
    ) -> Result<String, RenderError> {
        Ok(html.to_owned())
    }
}

/// The fixed set of stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Fenced Mermaid diagrams.
    Diagram,
    /// `---title---` folding blocks.
    Folding,
    /// `<mark>` highlight spans.
    Highlight,
    /// Table repair.
    Table,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Self; 4] = [Self::Diagram, Self::Folding, Self::Highlight, Self::Table];

    /// Create a fresh transformer for one run.
    pub fn instantiate(self) -> Box<dyn BlockTransformer> {
        match self {
            Self::Diagram => Box::new(DiagramTransformer::new()),
            Self::Folding => Box::new(FoldingTransformer::new()),
            Self::Highlight => Box::new(HighlightTransformer),
            Self::Table => Box::new(TableTransformer),
        }
    }
}

/// State shared by the postprocess phases of one run.
pub struct RunContext<'a> {
    converter: &'a MarkupConverter,
    published: Vec<(String, Restored)>,
}

impl<'a> RunContext<'a> {
    /// Create a context around the run's converter.
    pub fn new(converter: &'a MarkupConverter) -> Self {
        Self {
            converter,
            published: Vec::new(),
        }
    }

    /// Record final markup for a placeholder token.
    pub fn publish(&mut self, token: &str, content: Restored) {
        self.published.push((token.to_owned(), content));
    }

    /// Substitute every published token in `html`.
    pub fn settle(&self, html: &str) -> String {
        self.published
            .iter()
            .fold(html.to_owned(), |text, (token, content)| {
                substitute(&text, token, content)
            })
    }

    /// Convert a Markdown fragment to final markup.
    ///
    /// The fragment goes through the converter and the code macroizer only;
    /// block transformers are not re-applied, which limits custom block
    /// nesting to one level. Placeholders published so far are resolved.
    pub fn render_fragment(&self, markdown: &str) -> String {
        let html = macroize_code_blocks(&self.converter.convert(markdown));
        self.settle(&html)
    }
}
