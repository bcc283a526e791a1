//! Page operations for Confluence API.

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::{ConfluenceClient, read_json};
use crate::error::ConfluenceError;
use crate::types::{Page, PageList};

/// Children fetched per listing request.
const PAGE_LIMIT: usize = 100;

impl ConfluenceClient {
    /// Get page by ID with optional field expansion.
    pub(crate) fn get_page(&self, page_id: &str, expand: &[&str]) -> Result<Page, ConfluenceError> {
        let url = format!("{}/content/{}", self.api_url(), page_id);

        debug!("Getting page {}", page_id);

        let mut request = self
            .agent
            .get(&url)
            .header("Authorization", self.auth.header())
            .header("Accept", "application/json");
        if !expand.is_empty() {
            request = request.query("expand", expand.join(","));
        }

        read_json(request.call()?)
    }

    /// Find a direct child of `parent_id` whose title equals `title` exactly.
    ///
    /// Walks the child listing in pages of [`PAGE_LIMIT`] until a match or
    /// the listing is exhausted.
    pub(crate) fn find_child_page(
        &self,
        title: &str,
        parent_id: &str,
    ) -> Result<Option<Page>, ConfluenceError> {
        let url = format!("{}/content/{}/child/page", self.api_url(), parent_id);
        let mut start = 0;

        loop {
            debug!("Listing children of {} from {}", parent_id, start);

            let response = self
                .agent
                .get(&url)
                .query("limit", PAGE_LIMIT.to_string())
                .query("start", start.to_string())
                .query("expand", "version")
                .header("Authorization", self.auth.header())
                .header("Accept", "application/json")
                .call()?;
            let list: PageList = read_json(response)?;
            let fetched = list.results.len();

            if let Some(page) = list.results.into_iter().find(|p| p.title == title) {
                info!("Found page '{}' (id={}) under {}", title, page.id, parent_id);
                return Ok(Some(page));
            }

            if fetched < PAGE_LIMIT {
                return Ok(None);
            }
            start += list.size.max(fetched);
        }
    }

    /// Current version number of a page, or 0 when it cannot be fetched.
    pub(crate) fn page_version(&self, page_id: &str) -> u32 {
        match self.get_page(page_id, &["version"]) {
            Ok(page) => page.version_number(),
            Err(e) => {
                warn!("Could not fetch version of page {}: {}", page_id, e);
                0
            }
        }
    }

    /// Replace the content of an existing page. `version` is the new version
    /// number and must be one more than the current one.
    pub(crate) fn put_page(
        &self,
        page_id: &str,
        title: &str,
        body: &str,
        space_key: &str,
        version: u32,
    ) -> Result<Page, ConfluenceError> {
        let url = format!("{}/content/{}", self.api_url(), page_id);
        let payload = update_payload(page_id, title, body, space_key, version);

        info!("Updating page {} to version {}", page_id, version);

        let payload_bytes = serde_json::to_vec(&payload)?;
        let response = self
            .agent
            .put(&url)
            .header("Authorization", self.auth.header())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(&payload_bytes[..])?;

        read_json(response)
    }

    /// Create a page under `parent_id`.
    pub(crate) fn post_page(
        &self,
        title: &str,
        body: &str,
        parent_id: &str,
        space_key: &str,
    ) -> Result<Page, ConfluenceError> {
        let url = format!("{}/content", self.api_url());
        let payload = create_payload(title, body, parent_id, space_key);

        info!("Creating page '{}' under {}", title, parent_id);

        let payload_bytes = serde_json::to_vec(&payload)?;
        let response = self
            .agent
            .post(&url)
            .header("Authorization", self.auth.header())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(&payload_bytes[..])?;

        let page: Page = read_json(response)?;
        info!("Created page {}", page.id);
        Ok(page)
    }

    /// Web URL for a page, preferring the server-reported `webui` link.
    pub(crate) fn web_url(&self, page: &Page) -> String {
        if let Some(links) = &page.links
            && let Some(webui) = &links.webui
        {
            return format!("{}{}", self.base_url, webui);
        }

        format!(
            "{}/pages/viewpage.action?pageId={}",
            self.base_url, page.id
        )
    }
}

fn storage_body(body: &str) -> Value {
    json!({
        "storage": {
            "value": body,
            "representation": "storage"
        }
    })
}

fn update_payload(page_id: &str, title: &str, body: &str, space_key: &str, version: u32) -> Value {
    json!({
        "id": page_id,
        "type": "page",
        "title": title,
        "space": {"key": space_key},
        "body": storage_body(body),
        "version": {"number": version}
    })
}

fn create_payload(title: &str, body: &str, parent_id: &str, space_key: &str) -> Value {
    json!({
        "type": "page",
        "title": title,
        "space": {"key": space_key},
        "ancestors": [{"id": parent_id}],
        "body": storage_body(body)
    })
}
