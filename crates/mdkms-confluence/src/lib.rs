//! Confluence integration for mdkms.
//!
//! Provides a sync REST client for Confluence Server/Data Center with basic
//! authentication, and [`PagePublisher`], which publishes a Markdown
//! document as a child page of a given parent:
//!
//! 1. Look up an existing page with the same title under the parent
//! 2. Convert the document, uploading local images as attachments
//! 3. Update the page (bumping its version) or create it
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::path::Path;
//! use mdkms_confluence::{ConfluenceClient, PagePublisher, PublishConfig};
//! use mdkms_renderer::Document;
//!
//! let client = ConfluenceClient::new("https://kms.example.com", "user", "secret");
//! let config = PublishConfig::new("DOCS", "123456");
//! let publisher = PagePublisher::new(&client, config);
//!
//! let doc = Document::load(Path::new("notes.md"))?;
//! let result = publisher.publish(&doc)?;
//! println!("{}", result.url);
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod error;
mod publisher;
mod store;
mod types;

pub use client::ConfluenceClient;
pub use error::ConfluenceError;
pub use publisher::{
    DryRunResult, PagePublisher, PublishAction, PublishConfig, PublishError, PublishResult,
};
pub use store::PageStore;
pub use types::{Attachment, AttachmentLinks, Page, PageLinks, Space, Version};
