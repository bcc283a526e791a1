//! Conversion pipeline.
//!
//! Drives one document through every stage in a fixed order:
//!
//! 1. strip front matter
//! 2. protect image references and task lists behind placeholders
//! 3. escape ampersands in Markdown link destinations
//! 4. block transformer preprocess phases
//! 5. Markdown to HTML
//! 6. code blocks to code macros
//! 7. block transformer postprocess phases, in the same order
//! 8. restore task lists and images
//! 9. escape ampersands in `href` attributes
//! 10. check that no placeholder survived
//! 11. prepend the table of contents

use tracing::{debug, warn};

use crate::code_block::macroize_code_blocks;
use crate::converter::{ConverterOptions, MarkupConverter};
use crate::document::Document;
use crate::error::RenderError;
use crate::fence::map_plain_text;
use crate::images::{IMAGE, ImageReference, ImageResolver, offline_markup};
use crate::links::sanitize_links;
use crate::macros::{self, TOC_MACRO};
use crate::preprocess::{
    FrontMatter, escape_link_urls, parse_task_item, protect_task_lists, split_front_matter,
};
use crate::transform::{BlockTransformer, RunContext, Stage};
use crate::vault::{PlaceholderKind, PlaceholderVault, Restored, find_unresolved};

/// Result of converting one document.
#[derive(Debug)]
pub struct RenderOutput {
    /// Confluence storage format markup.
    pub markup: String,
    /// Front matter, if the document had a parsable block.
    pub front_matter: Option<FrontMatter>,
    /// Problems that were recovered from.
    pub warnings: Vec<String>,
    /// Number of images uploaded during this conversion.
    pub images_uploaded: usize,
}

impl RenderOutput {
    /// Title from front matter.
    pub fn title(&self) -> Option<&str> {
        self.front_matter.as_ref()?.title.as_deref()
    }
}

/// Markdown to Confluence storage format converter.
#[derive(Debug, Clone)]
pub struct Pipeline {
    converter: MarkupConverter,
    stages: Vec<Stage>,
    toc: bool,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Create a pipeline with all stages and the table of contents enabled.
    pub fn new() -> Self {
        Self {
            converter: MarkupConverter::default(),
            stages: Stage::ALL.to_vec(),
            toc: true,
        }
    }

    /// Enable or disable the table of contents.
    #[must_use]
    pub fn with_toc(mut self, toc: bool) -> Self {
        self.toc = toc;
        self
    }

    /// Use different converter extensions.
    #[must_use]
    pub fn with_converter_options(mut self, options: ConverterOptions) -> Self {
        self.converter = MarkupConverter::new(options);
        self
    }

    /// Underlying Markdown converter.
    pub fn converter(&self) -> &MarkupConverter {
        &self.converter
    }

    /// Convert a document.
    ///
    /// With an image resolver, local images are uploaded and referenced by
    /// URL. Without one, they are referenced as attachments by file name.
    pub fn render(
        &self,
        doc: &Document,
        mut images: Option<&mut ImageResolver<'_>>,
    ) -> Result<RenderOutput, RenderError> {
        let (front_matter, body) = split_front_matter(doc.text());

        let mut image_vault = PlaceholderVault::new(PlaceholderKind::Image);
        let text = map_plain_text(body, |segment| image_vault.protect(&IMAGE, segment));
        let mut task_vault = PlaceholderVault::new(PlaceholderKind::TaskList);
        let text = protect_task_lists(&text, &mut task_vault);
        let mut text = escape_link_urls(&text);

        let mut transformers: Vec<Box<dyn BlockTransformer>> =
            self.stages.iter().map(|stage| stage.instantiate()).collect();
        for transformer in &mut transformers {
            if transformer.capabilities().preprocess {
                text = transformer.preprocess(&text);
                debug!(stage = transformer.name(), "Preprocessed");
            }
        }

        let mut html = macroize_code_blocks(&self.converter.convert(&text));

        let mut ctx = RunContext::new(&self.converter);
        for transformer in &mut transformers {
            if transformer.capabilities().postprocess {
                html = transformer.postprocess(&html, &mut ctx)?;
                debug!(stage = transformer.name(), "Postprocessed");
            }
        }

        let html = task_vault.restore(&html, |record| {
            Some(Restored::Block(self.render_tasks(&record.original)))
        });

        let uploads_before = images.as_ref().map_or(0, |r| r.uploads());
        let mut warnings = Vec::new();
        let html = image_vault.try_restore(&html, |record| -> Result<_, RenderError> {
            let Some(reference) = ImageReference::parse(&record.original) else {
                return Ok(Some(Restored::Inline(record.original.clone())));
            };
            let markup = match images.as_deref_mut() {
                Some(resolver) => resolver.resolve(&reference, doc.dir())?.unwrap_or_else(|| {
                    warnings.push(format!("image not found: {}", reference.raw_path));
                    String::new()
                }),
                None => offline_markup(&reference),
            };
            Ok(Some(Restored::Inline(markup)))
        })?;
        let images_uploaded = images.as_ref().map_or(0, |r| r.uploads()) - uploads_before;

        let html = sanitize_links(&html);

        if let Some(token) = find_unresolved(&html) {
            warn!(token, "Placeholder survived conversion");
            return Err(RenderError::UnresolvedPlaceholder {
                token: token.to_owned(),
            });
        }

        let markup = if self.toc {
            format!("{TOC_MACRO}{html}")
        } else {
            html
        };

        Ok(RenderOutput {
            markup,
            front_matter,
            warnings,
            images_uploaded,
        })
    }

    fn render_tasks(&self, original: &str) -> String {
        let items: Vec<(bool, String)> = original
            .lines()
            .filter_map(parse_task_item)
            .map(|item| (item.done, self.converter.convert_inline(item.text)))
            .collect();
        macros::task_list(items.iter().map(|(done, body)| (*done, body.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UploadError;
    use crate::images::{AttachmentUploader, ImageSizing, ImageUpload};
    use pretty_assertions::assert_eq;
    use quick_xml::Reader;
    use quick_xml::events::Event;
    use std::cell::Cell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingUploader {
        calls: Cell<usize>,
    }

    impl AttachmentUploader for CountingUploader {
        fn attach(&self, upload: &ImageUpload<'_>) -> Result<String, UploadError> {
            self.calls.set(self.calls.get() + 1);
            Ok(format!("/download/attachments/{}/{}", upload.page_id, upload.filename))
        }
    }

    fn render(text: &str) -> RenderOutput {
        Pipeline::new()
            .with_toc(false)
            .render(&Document::new(text, "."), None)
            .unwrap()
    }

    fn assert_well_formed(markup: &str) {
        let wrapped = format!("<root>{markup}</root>");
        let mut reader = Reader::from_str(&wrapped);
        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => panic!("malformed markup at {}: {e}\n{markup}", reader.buffer_position()),
            }
        }
    }

    #[test]
    fn test_plain_markdown_equals_converter_output_with_toc() {
        let text = "# Title\n\nSome *emphasis* and **strong**.\n\n- a\n- b\n\n> quote\n\n---\n\n1. one\n2. two\n";
        let pipeline = Pipeline::new();
        let output = pipeline.render(&Document::new(text, "."), None).unwrap();
        assert_eq!(
            output.markup,
            format!("{TOC_MACRO}{}", pipeline.converter().convert(text))
        );
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_toc_disabled() {
        let output = render("text");
        assert_eq!(output.markup, "<p>text</p>\n");
    }

    #[test]
    fn test_fold_scenario() {
        let output = render("---Notes---\nsome *text*\n---Notes---");
        assert!(output.markup.contains(r#"<ac:structured-macro ac:name="expand">"#));
        assert!(output.markup.contains(r#"<ac:parameter ac:name="title">Notes</ac:parameter>"#));
        assert!(output.markup.contains("<ac:rich-text-body><p>some <em>text</em></p>"));
    }

    #[test]
    fn test_diagram_inside_fold_survives() {
        let output = render(
            "intro\n\n---Details---\n```mermaid\ngraph TD\n  A-->B\n```\n---Details---\n\nend\n",
        );
        let markup = &output.markup;
        let expand = markup.find(r#"ac:name="expand""#).unwrap();
        let diagram = markup.find(r#"ac:name="markdown""#).unwrap();
        let body_end = markup.find("</ac:rich-text-body>").unwrap();
        assert!(expand < diagram && diagram < body_end);
        assert!(markup.contains("<![CDATA[```mermaid\ngraph TD\n  A-->B\n```]]>"));
        assert!(!markup.contains("MDKMSVQX7"));
        assert_well_formed(markup);
    }

    #[test]
    fn test_code_fence_inside_diagram() {
        let output = render("~~~~mermaid\n```\nx\n```\n~~~~\n");
        assert!(output.markup.contains("<![CDATA[~~~~mermaid\n```\nx\n```\n~~~~]]>"));
    }

    #[test]
    fn test_code_block_macro() {
        let output = render("```js\nif (a < b && c) {}\n```\n");
        assert_eq!(
            output.markup,
            concat!(
                r#"<ac:structured-macro ac:name="code" ac:schema-version="1">"#,
                r#"<ac:parameter ac:name="language">js</ac:parameter>"#,
                "<ac:plain-text-body><![CDATA[if (a < b && c) {}]]></ac:plain-text-body>",
                "</ac:structured-macro>\n"
            )
        );
    }

    #[test]
    fn test_task_list() {
        let output = render("Plan:\n- [x] done *well*\n- [ ] todo\n");
        assert_eq!(
            output.markup,
            concat!(
                "<p>Plan:</p>\n",
                "<ac:task-list>\n",
                "<ac:task><ac:task-status>complete</ac:task-status><ac:task-body>done <em>well</em></ac:task-body></ac:task>\n",
                "<ac:task><ac:task-status>incomplete</ac:task-status><ac:task-body>todo</ac:task-body></ac:task>\n",
                "</ac:task-list>\n"
            )
        );
    }

    #[test]
    fn test_link_ampersands_escaped() {
        let output = render("[query](https://x.example/?a=1&b=2)\n");
        assert_eq!(
            output.markup,
            "<p><a href=\"https://x.example/?a=1&amp;b=2\">query</a></p>\n"
        );
    }

    #[test]
    fn test_highlight_and_table_inside_fold() {
        let output = render(
            "---T---\n<mark style=\"background:#ADCCFFA6\">hi</mark>\n\n| a |\n|---|\n| x<br>y |\n---T---\n",
        );
        assert!(output.markup.contains(r#"<span style="background-color: #DEEBFF">hi</span>"#));
        assert!(output.markup.contains("<td>x<br></br>y</td>"));
        assert_well_formed(&output.markup);
    }

    #[test]
    fn test_front_matter_title() {
        let output = render("---\ntitle: From Meta\n---\nbody\n");
        assert_eq!(output.title(), Some("From Meta"));
        assert_eq!(output.markup, "<p>body</p>\n");
    }

    #[test]
    fn test_offline_images_reference_attachments() {
        let output = render("![[diagram.png|300]] and ![logo](https://x/logo.png)\n");
        assert_eq!(
            output.markup,
            concat!(
                r#"<p><ac:image ac:width="300"><ri:attachment ri:filename="diagram.png" /></ac:image>"#,
                r#" and <ac:image ac:alt="logo"><ri:url ri:value="https://x/logo.png" /></ac:image></p>"#,
                "\n"
            )
        );
    }

    #[test]
    fn test_images_in_code_untouched() {
        let output = render("```\n![[a.png]]\n```\n");
        assert!(output.markup.contains("<![CDATA[![[a.png]]]]>"));
    }

    #[test]
    fn test_images_in_code_spans_untouched() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.png"), b"png").unwrap();
        let uploader = CountingUploader::default();
        let mut resolver = ImageResolver::new(&uploader, "https://kms", "7");
        let doc = Document::new("write `![[a.png|300]]` to embed\n", dir.path());

        let output = Pipeline::new()
            .with_toc(false)
            .render(&doc, Some(&mut resolver))
            .unwrap();

        assert_eq!(output.markup, "<p>write <code>![[a.png|300]]</code> to embed</p>\n");
        assert_eq!(uploader.calls.get(), 0);
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn test_link_in_code_span_escaped_once() {
        let output = render("`[q](https://x/?a=1&b=2)`\n");
        assert_eq!(
            output.markup,
            "<p><code>[q](https://x/?a=1&amp;b=2)</code></p>\n"
        );
    }

    #[test]
    fn test_html_table_in_code_block_verbatim() {
        let output = render("```html\n<table><tr><td>a<br>b</td></tr></table>\n```\n");
        assert!(
            output
                .markup
                .contains("<![CDATA[<table><tr><td>a<br>b</td></tr></table>]]>")
        );
        assert!(!output.markup.contains("<tbody>"));
    }

    #[test]
    fn test_table_markup_in_diagram_verbatim() {
        let output = render("```mermaid\ngraph TD\n  A[\"<td>x<br>y</td>\"]\n```\n");
        assert!(
            output
                .markup
                .contains("<![CDATA[```mermaid\ngraph TD\n  A[\"<td>x<br>y</td>\"]\n```]]>")
        );
    }

    #[test]
    fn test_code_block_body_byte_identical() {
        let body = concat!(
            "<table><tr><td>a<br>b</td></tr></table>\n",
            "<mark style=\"background:#ADCCFFA6\">hi</mark>\n",
            "<a href=\"?a&b\">x</a>",
        );
        let output = render(&format!("```html\n{body}\n```\n\n| h |\n|---|\n| x<br>y |\n"));

        assert!(output.markup.contains(&format!("<![CDATA[{body}]]>")));
        assert!(output.markup.contains("<td>x<br></br>y</td>"));
        assert_well_formed(&output.markup);
    }

    #[test]
    fn test_missing_image_is_dropped_with_warning() {
        let dir = TempDir::new().unwrap();
        let uploader = CountingUploader::default();
        let mut resolver = ImageResolver::new(&uploader, "https://kms", "7");
        let doc = Document::new("before ![[missing.png]] after\n\n# Next\n", dir.path());

        let output = Pipeline::new()
            .with_toc(false)
            .render(&doc, Some(&mut resolver))
            .unwrap();

        assert_eq!(
            output.markup,
            "<p>before  after</p>\n<h1 id=\"next\">Next</h1>\n"
        );
        assert_eq!(output.warnings, vec!["image not found: missing.png".to_owned()]);
        assert_eq!(uploader.calls.get(), 0);
    }

    #[test]
    fn test_repeated_image_uploaded_once() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.png"), b"png").unwrap();
        let uploader = CountingUploader::default();
        let sizing = ImageSizing {
            derive: false,
            ..ImageSizing::default()
        };
        let mut resolver = ImageResolver::new(&uploader, "https://kms", "7").with_sizing(sizing);
        let doc = Document::new(
            "![[a.png]]\n\n![x](a.png)\n\n---F---\n![[./a.png]]\n---F---\n",
            dir.path(),
        );

        let output = Pipeline::new().render(&doc, Some(&mut resolver)).unwrap();

        assert_eq!(uploader.calls.get(), 1);
        assert_eq!(output.images_uploaded, 1);
        assert_eq!(resolver.page_id(), "7");
        assert_eq!(resolver.cache().len(), 1);
        assert_eq!(
            output
                .markup
                .matches(r#"ri:value="https://kms/download/attachments/7/a.png""#)
                .count(),
            3
        );
    }

    #[test]
    fn test_surviving_placeholder_is_reported() {
        let err = Pipeline::new()
            .render(&Document::new("literal MDKMSVQX7_fold_9_Q", "."), None)
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::UnresolvedPlaceholder { ref token } if token == "MDKMSVQX7_fold_9_Q"
        ));
    }

    #[test]
    fn test_full_document_is_well_formed() {
        let text = concat!(
            "---\ntitle: Demo\n---\n",
            "# Overview\n\nIntro with <mark>highlight</mark> and [link](https://x/?a=1&b=2).\n\n",
            "- [ ] task one\n- [x] task two\n\n",
            "```python\nprint(\"<tag>\")\n```\n\n",
            "---Details---\n## Inside\n\n```mermaid\ngraph LR\n  A-->B\n```\n\n| h |\n|---|\n| c |\n---Details---\n\n",
            "---折叠---\nlegacy\n---折叠---\n",
        );
        let output = Pipeline::new().render(&Document::new(text, "."), None).unwrap();
        assert_well_formed(&output.markup);
        assert!(output.markup.starts_with(TOC_MACRO));
        assert!(output.markup.contains("点击展开"));
    }
}
