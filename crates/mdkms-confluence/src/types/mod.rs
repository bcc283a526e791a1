//! Confluence REST API types.
//!
//! Only the fields mdkms reads are modelled; serde ignores the rest.

mod attachment;
mod page;

pub use attachment::{Attachment, AttachmentLinks};
pub(crate) use attachment::AttachmentsResponse;
pub use page::{Page, PageLinks, Space, Version};
pub(crate) use page::PageList;
