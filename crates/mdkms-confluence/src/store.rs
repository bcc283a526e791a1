//! Page storage seam between the publisher and the REST client.

use mdkms_renderer::{AttachmentUploader, ImageUpload, UploadError};

use crate::client::ConfluenceClient;
use crate::error::ConfluenceError;
use crate::types::Page;

/// Page operations the publisher needs from a Confluence server.
///
/// Implementors also upload images, so a store can be handed to the
/// renderer's image resolver directly.
pub trait PageStore: AttachmentUploader {
    /// Server base URL, used to absolutise attachment download paths.
    fn base_url(&self) -> &str;

    /// Direct child of `parent_id` with exactly this title.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched.
    fn find_page_in_parent(
        &self,
        title: &str,
        parent_id: &str,
    ) -> Result<Option<Page>, ConfluenceError>;

    /// Current version number, or 0 when unknown.
    fn current_version(&self, page_id: &str) -> u32;

    /// Replace page content with `version` as the new version number.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the update.
    fn update_page(
        &self,
        page_id: &str,
        title: &str,
        body: &str,
        space_key: &str,
        version: u32,
    ) -> Result<Page, ConfluenceError>;

    /// Create a page under `parent_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the page.
    fn create_page(
        &self,
        title: &str,
        body: &str,
        parent_id: &str,
        space_key: &str,
    ) -> Result<Page, ConfluenceError>;

    /// Web URL of a page.
    fn page_url(&self, page: &Page) -> String;
}

impl AttachmentUploader for ConfluenceClient {
    fn attach(&self, upload: &ImageUpload<'_>) -> Result<String, UploadError> {
        let attachment = self.upload_attachment(
            upload.page_id,
            upload.filename,
            upload.data,
            upload.mime_type,
        )?;
        Ok(crate::client::download_path(
            &attachment,
            upload.page_id,
            upload.filename,
        ))
    }
}

impl PageStore for ConfluenceClient {
    fn base_url(&self) -> &str {
        ConfluenceClient::base_url(self)
    }

    fn find_page_in_parent(
        &self,
        title: &str,
        parent_id: &str,
    ) -> Result<Option<Page>, ConfluenceError> {
        self.find_child_page(title, parent_id)
    }

    fn current_version(&self, page_id: &str) -> u32 {
        self.page_version(page_id)
    }

    fn update_page(
        &self,
        page_id: &str,
        title: &str,
        body: &str,
        space_key: &str,
        version: u32,
    ) -> Result<Page, ConfluenceError> {
        self.put_page(page_id, title, body, space_key, version)
    }

    fn create_page(
        &self,
        title: &str,
        body: &str,
        parent_id: &str,
        space_key: &str,
    ) -> Result<Page, ConfluenceError> {
        self.post_page(title, body, parent_id, space_key)
    }

    fn page_url(&self, page: &Page) -> String {
        self.web_url(page)
    }
}
