//! Markdown to Confluence storage format conversion.
//!
//! Converts Obsidian-flavored Markdown into the XHTML-based storage format
//! Confluence pages are stored in. Besides plain `CommonMark` the pipeline
//! understands:
//!
//! - folding blocks (`---title---` ... `---title---`) as expand macros
//! - fenced `mermaid` blocks as markdown macros
//! - `<mark>` highlights as colored spans
//! - wikilink (`![[a.png|300]]`) and bracket images, uploaded as attachments
//! - task lists as native task lists
//!
//! The underlying converter only produces HTML, so every extension is
//! implemented as text rewriting around it. Constructs the converter would
//! mangle are hidden behind placeholder tokens (see [`PlaceholderVault`])
//! and re-inserted as macros afterwards.
//!
//! # Example
//!
//! ```
//! use mdkms_renderer::{Document, Pipeline};
//!
//! let doc = Document::new("---Notes---\nsome *text*\n---Notes---\n", ".");
//! let output = Pipeline::new().with_toc(false).render(&doc, None)?;
//! assert!(output.markup.contains(r#"ac:name="expand""#));
//! # Ok::<(), mdkms_renderer::RenderError>(())
//! ```

mod code_block;
mod converter;
mod document;
mod error;
mod fence;
mod images;
mod links;
mod macros;
mod markup;
mod pipeline;
mod preprocess;
pub mod transform;
mod vault;

pub use code_block::macroize_code_blocks;
pub use converter::{ConverterOptions, MarkupConverter};
pub use document::Document;
pub use error::{ImageError, RenderError, UploadError};
pub use images::{
    AttachmentUploader, ImageReference, ImageResolver, ImageSize, ImageSizing, ImageUpload,
    UploadedImageCache,
};
pub use links::sanitize_links;
pub use macros::TOC_MACRO;
pub use pipeline::{Pipeline, RenderOutput};
pub use preprocess::{FrontMatter, split_front_matter};
pub use vault::{Placeholder, PlaceholderKind, PlaceholderVault, Restored, find_unresolved};
