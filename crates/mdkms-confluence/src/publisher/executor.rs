//! Page publisher implementation.

use mdkms_renderer::{Document, ImageResolver, Pipeline, split_front_matter};
use tracing::info;

use super::PublishConfig;
use super::error::PublishError;
use super::result::{DryRunResult, PublishAction, PublishResult};
use crate::store::PageStore;

/// Publishes Markdown documents as Confluence pages.
pub struct PagePublisher<'a, S: PageStore> {
    store: &'a S,
    config: PublishConfig,
    pipeline: Pipeline,
}

impl<'a, S: PageStore> PagePublisher<'a, S> {
    /// Create a new page publisher.
    #[must_use]
    pub fn new(store: &'a S, config: PublishConfig) -> Self {
        let pipeline = Pipeline::new()
            .with_toc(config.toc)
            .with_converter_options(config.converter);
        Self {
            store,
            config,
            pipeline,
        }
    }

    /// Publish a document under the configured parent page.
    ///
    /// Local images are uploaded to the existing page, or to the parent when
    /// the page is new.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - no title can be determined, or the parent or space is empty
    /// - an image upload fails or a placeholder survives conversion
    /// - Confluence API calls fail
    pub fn publish(&self, doc: &Document) -> Result<PublishResult, PublishError> {
        self.validate()?;
        let title = self.resolve_title(doc)?;
        let existing = self
            .store
            .find_page_in_parent(&title, &self.config.parent_id)?;

        let attach_to = existing
            .as_ref()
            .map_or(self.config.parent_id.as_str(), |page| page.id.as_str());
        let mut resolver = ImageResolver::new(self.store, self.store.base_url(), attach_to)
            .with_sizing(self.config.sizing);
        let output = self.pipeline.render(doc, Some(&mut resolver))?;

        let (action, page) = if let Some(existing) = existing {
            let version = self.store.current_version(&existing.id) + 1;
            info!("Updating '{}' (id={}) to version {}", title, existing.id, version);
            let page = self.store.update_page(
                &existing.id,
                &title,
                &output.markup,
                &self.config.space_key,
                version,
            )?;
            (PublishAction::Updated, page)
        } else {
            info!("Creating '{}' under {}", title, self.config.parent_id);
            let page = self.store.create_page(
                &title,
                &output.markup,
                &self.config.parent_id,
                &self.config.space_key,
            )?;
            (PublishAction::Created, page)
        };

        let url = self.store.page_url(&page);

        Ok(PublishResult {
            action,
            page,
            url,
            images_uploaded: output.images_uploaded,
            warnings: output.warnings,
        })
    }

    /// Convert and look up the target page without writing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the title cannot be determined, conversion fails,
    /// or the page lookup fails.
    pub fn dry_run(&self, doc: &Document) -> Result<DryRunResult, PublishError> {
        self.validate()?;
        let title = self.resolve_title(doc)?;
        let existing = self
            .store
            .find_page_in_parent(&title, &self.config.parent_id)?;
        let output = self.pipeline.render(doc, None)?;

        let next_version = existing
            .as_ref()
            .map(|page| self.store.current_version(&page.id) + 1);
        let action = if existing.is_some() {
            PublishAction::Updated
        } else {
            PublishAction::Created
        };

        Ok(DryRunResult {
            title,
            action,
            existing,
            next_version,
            markup: output.markup,
            warnings: output.warnings,
        })
    }

    fn validate(&self) -> Result<(), PublishError> {
        if self.config.parent_id.trim().is_empty() {
            return Err(PublishError::Validation(
                "parent page ID required (via --parent or [confluence] parent_page_id)".into(),
            ));
        }
        if self.config.space_key.trim().is_empty() {
            return Err(PublishError::Validation(
                "space key required (via --space or [confluence] space)".into(),
            ));
        }
        Ok(())
    }

    /// Explicit title, then front matter `title`, then the file stem.
    fn resolve_title(&self, doc: &Document) -> Result<String, PublishError> {
        let front_matter_title = split_front_matter(doc.text()).0.and_then(|fm| fm.title);

        [
            self.config.title.clone(),
            front_matter_title,
            doc.file_stem().map(str::to_owned),
        ]
        .into_iter()
        .flatten()
        .map(|title| title.trim().to_owned())
        .find(|title| !title.is_empty())
        .ok_or_else(|| {
            PublishError::Validation(
                "page title required (via --title, front matter or file name)".into(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfluenceError;
    use crate::types::{Page, Version};
    use mdkms_renderer::{AttachmentUploader, ImageSizing, ImageUpload, UploadError};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MockStore {
        existing: Option<Page>,
        version: u32,
        updates: RefCell<Vec<(String, String, u32)>>,
        creates: RefCell<Vec<(String, String, String)>>,
        uploads: RefCell<Vec<(String, String)>>,
        bodies: RefCell<Vec<String>>,
    }

    impl MockStore {
        fn with_existing(id: &str, title: &str, version: u32) -> Self {
            Self {
                existing: Some(page(id, title, version)),
                version,
                ..Self::default()
            }
        }

        fn writes(&self) -> usize {
            self.updates.borrow().len() + self.creates.borrow().len() + self.uploads.borrow().len()
        }
    }

    fn page(id: &str, title: &str, version: u32) -> Page {
        Page {
            id: id.to_owned(),
            title: title.to_owned(),
            version: Some(Version { number: version }),
            space: None,
            links: None,
        }
    }

    impl AttachmentUploader for MockStore {
        fn attach(&self, upload: &ImageUpload<'_>) -> Result<String, UploadError> {
            self.uploads
                .borrow_mut()
                .push((upload.page_id.to_owned(), upload.filename.to_owned()));
            Ok(format!(
                "/download/attachments/{}/{}",
                upload.page_id, upload.filename
            ))
        }
    }

    impl PageStore for MockStore {
        fn base_url(&self) -> &str {
            "https://kms.test"
        }

        fn find_page_in_parent(
            &self,
            title: &str,
            _parent_id: &str,
        ) -> Result<Option<Page>, ConfluenceError> {
            Ok(self.existing.clone().filter(|page| page.title == title))
        }

        fn current_version(&self, _page_id: &str) -> u32 {
            self.version
        }

        fn update_page(
            &self,
            page_id: &str,
            title: &str,
            body: &str,
            _space_key: &str,
            version: u32,
        ) -> Result<Page, ConfluenceError> {
            self.updates
                .borrow_mut()
                .push((page_id.to_owned(), title.to_owned(), version));
            self.bodies.borrow_mut().push(body.to_owned());
            Ok(page(page_id, title, version))
        }

        fn create_page(
            &self,
            title: &str,
            body: &str,
            parent_id: &str,
            space_key: &str,
        ) -> Result<Page, ConfluenceError> {
            self.creates.borrow_mut().push((
                title.to_owned(),
                parent_id.to_owned(),
                space_key.to_owned(),
            ));
            self.bodies.borrow_mut().push(body.to_owned());
            Ok(page("900", title, 1))
        }

        fn page_url(&self, page: &Page) -> String {
            format!("https://kms.test/pages/viewpage.action?pageId={}", page.id)
        }
    }

    fn config() -> PublishConfig {
        let mut config = PublishConfig::new("DOCS", "100");
        config.sizing = ImageSizing {
            derive: false,
            ..ImageSizing::default()
        };
        config
    }

    fn doc(text: &str) -> Document {
        Document::new(text, ".")
    }

    #[test]
    fn test_publish_creates_new_page_under_parent() {
        let store = MockStore::default();
        let publisher = PagePublisher::new(&store, config());

        let result = publisher
            .publish(&doc("---\ntitle: Release Notes\n---\n# Hello\n"))
            .unwrap();

        assert_eq!(result.action, PublishAction::Created);
        assert_eq!(result.page.id, "900");
        assert_eq!(
            result.url,
            "https://kms.test/pages/viewpage.action?pageId=900"
        );
        assert_eq!(
            *store.creates.borrow(),
            vec![(
                "Release Notes".to_owned(),
                "100".to_owned(),
                "DOCS".to_owned()
            )]
        );
        assert!(store.updates.borrow().is_empty());
        assert!(store.bodies.borrow()[0].contains("<h1 id=\"hello\">Hello</h1>"));
    }

    #[test]
    fn test_publish_updates_existing_page_with_next_version() {
        let store = MockStore::with_existing("77", "Notes", 4);
        let publisher =
            PagePublisher::new(&store, config().with_title(Some("Notes".to_owned())));

        let result = publisher.publish(&doc("body")).unwrap();

        assert_eq!(result.action, PublishAction::Updated);
        assert_eq!(
            *store.updates.borrow(),
            vec![("77".to_owned(), "Notes".to_owned(), 5)]
        );
        assert!(store.creates.borrow().is_empty());
    }

    #[test]
    fn test_explicit_title_wins_over_front_matter() {
        let store = MockStore::default();
        let publisher =
            PagePublisher::new(&store, config().with_title(Some("Explicit".to_owned())));

        publisher
            .publish(&doc("---\ntitle: From Front Matter\n---\ntext"))
            .unwrap();

        assert_eq!(store.creates.borrow()[0].0, "Explicit");
    }

    #[test]
    fn test_title_falls_back_to_file_stem() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weekly-report.md");
        std::fs::write(&path, "no front matter").unwrap();
        let store = MockStore::default();
        let publisher = PagePublisher::new(&store, config());

        publisher.publish(&Document::load(&path).unwrap()).unwrap();

        assert_eq!(store.creates.borrow()[0].0, "weekly-report");
    }

    #[test]
    fn test_missing_title_is_validation_error() {
        let store = MockStore::default();
        let publisher = PagePublisher::new(&store, config());

        let err = publisher.publish(&doc("---\ntitle: \"  \"\n---\ntext")).unwrap_err();

        assert!(matches!(err, PublishError::Validation(_)));
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_empty_space_is_validation_error() {
        let store = MockStore::default();
        let publisher = PagePublisher::new(&store, PublishConfig::new("", "100"));

        let err = publisher.publish(&doc("text")).unwrap_err();

        assert!(matches!(err, PublishError::Validation(msg) if msg.contains("space")));
    }

    #[test]
    fn test_images_attach_to_parent_for_new_page() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("shot.png"), b"png").unwrap();
        let store = MockStore::default();
        let publisher =
            PagePublisher::new(&store, config().with_title(Some("Shots".to_owned())));

        let result = publisher
            .publish(&Document::new("![](shot.png)", dir.path()))
            .unwrap();

        assert_eq!(result.images_uploaded, 1);
        assert_eq!(
            *store.uploads.borrow(),
            vec![("100".to_owned(), "shot.png".to_owned())]
        );
        assert!(store.bodies.borrow()[0]
            .contains("https://kms.test/download/attachments/100/shot.png"));
    }

    #[test]
    fn test_images_attach_to_existing_page() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("shot.png"), b"png").unwrap();
        let store = MockStore::with_existing("77", "Shots", 2);
        let publisher =
            PagePublisher::new(&store, config().with_title(Some("Shots".to_owned())));

        publisher
            .publish(&Document::new("![](shot.png)", dir.path()))
            .unwrap();

        assert_eq!(store.uploads.borrow()[0].0, "77");
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("shot.png"), b"png").unwrap();
        let store = MockStore::with_existing("77", "Shots", 2);
        let publisher =
            PagePublisher::new(&store, config().with_title(Some("Shots".to_owned())));

        let result = publisher
            .dry_run(&Document::new("![](shot.png)", dir.path()))
            .unwrap();

        assert_eq!(store.writes(), 0);
        assert_eq!(result.action, PublishAction::Updated);
        assert_eq!(result.next_version, Some(3));
        assert!(result.markup.contains("<ri:attachment ri:filename=\"shot.png\" />"));
    }

    #[test]
    fn test_toc_disabled() {
        let store = MockStore::default();
        let mut config = config().with_title(Some("T".to_owned()));
        config.toc = false;
        let publisher = PagePublisher::new(&store, config);

        let result = publisher.dry_run(&doc("text")).unwrap();

        assert_eq!(result.markup, "<p>text</p>\n");
    }
}
