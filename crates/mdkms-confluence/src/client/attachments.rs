//! Attachment operations for Confluence API.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::RngExt;
use tracing::info;

use super::{ConfluenceClient, read_json};
use crate::error::ConfluenceError;
use crate::types::{Attachment, AttachmentsResponse};

/// Characters escaped in a filename used as a URL path segment.
const FILENAME: &AsciiSet = &NON_ALPHANUMERIC.remove(b'.').remove(b'-').remove(b'_');

impl ConfluenceClient {
    /// Upload or update attachment (upsert by filename).
    pub(crate) fn upload_attachment(
        &self,
        page_id: &str,
        filename: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<Attachment, ConfluenceError> {
        let existing = self.find_attachment_by_name(page_id, filename)?;

        let url = if let Some(att) = &existing {
            info!("Updating attachment '{}' (id={})", filename, att.id);
            format!(
                "{}/content/{}/child/attachment/{}/data",
                self.api_url(),
                page_id,
                att.id
            )
        } else {
            info!("Uploading attachment '{}' to page {}", filename, page_id);
            format!("{}/content/{}/child/attachment", self.api_url(), page_id)
        };

        let boundary = format!("----MdkmsFormBoundary{:016x}", rand::rng().random::<u64>());
        let body = multipart_body(&boundary, filename, content_type, data);

        let response = self
            .agent
            .post(&url)
            .header("Authorization", self.auth.header())
            .header(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .header("X-Atlassian-Token", "nocheck")
            .header("Accept", "application/json")
            .send(&body[..])?;

        // Data updates answer with the attachment, new uploads with a list
        if existing.is_some() {
            read_json(response)
        } else {
            let response: AttachmentsResponse = read_json(response)?;
            response.results.into_iter().next().ok_or_else(|| {
                ConfluenceError::UnexpectedResponse("empty attachment list".to_owned())
            })
        }
    }

    /// Find attachment by filename on a page.
    fn find_attachment_by_name(
        &self,
        page_id: &str,
        filename: &str,
    ) -> Result<Option<Attachment>, ConfluenceError> {
        let url = format!("{}/content/{}/child/attachment", self.api_url(), page_id);

        let response = self
            .agent
            .get(&url)
            .query("filename", filename)
            .header("Authorization", self.auth.header())
            .header("Accept", "application/json")
            .call()?;
        let attachments: AttachmentsResponse = read_json(response)?;

        Ok(attachments
            .results
            .into_iter()
            .find(|a| a.title == filename))
    }
}

/// Download path for an uploaded attachment.
///
/// Uses the server-reported link and falls back to the conventional
/// `/download/attachments/{page}/{file}` location.
pub(crate) fn download_path(attachment: &Attachment, page_id: &str, filename: &str) -> String {
    attachment.download_path().map_or_else(
        || {
            format!(
                "/download/attachments/{page_id}/{}",
                utf8_percent_encode(filename, FILENAME)
            )
        },
        str::to_owned,
    )
}

fn multipart_body(boundary: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let filename = filename.replace('"', "%22");
    let mut body = Vec::with_capacity(data.len() + 256);

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"minorEdit\"\r\n\r\ntrue\r\n");

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}
