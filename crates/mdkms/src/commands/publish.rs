//! `md2kms publish` command implementation.

use std::path::PathBuf;

use clap::Args;
use mdkms_config::{CliSettings, Config};
use mdkms_confluence::{
    ConfluenceClient, DryRunResult, PagePublisher, PublishConfig, PublishResult,
};
use mdkms_renderer::Document;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the publish command.
#[derive(Args)]
pub(crate) struct PublishArgs {
    /// Path to the Markdown file.
    pub(crate) file: PathBuf,

    /// Page title (default: front matter title, then file name).
    #[arg(short, long)]
    pub(crate) title: Option<String>,

    /// Parent page ID.
    #[arg(short, long, env = "KMS_PARENT_PAGE_ID")]
    pub(crate) parent: Option<String>,

    /// Path to configuration file (default: auto-discover kms.toml).
    #[arg(short, long)]
    pub(crate) config: Option<PathBuf>,

    /// Confluence base URL.
    #[arg(long, env = "KMS_URL")]
    pub(crate) url: Option<String>,

    /// Confluence username.
    #[arg(long, env = "KMS_USERNAME")]
    pub(crate) username: Option<String>,

    /// Confluence password or personal access token.
    #[arg(long, env = "KMS_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,

    /// Space key.
    #[arg(long, env = "KMS_SPACE")]
    pub(crate) space: Option<String>,

    /// Do not prepend the table of contents.
    #[arg(long)]
    pub(crate) no_toc: bool,

    /// Preview without creating, updating or uploading anything.
    #[arg(long)]
    pub(crate) dry_run: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl PublishArgs {
    /// Execute the publish command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;
        let settings = config.require_confluence()?;
        let parent_id = settings.parent_page_id.ok_or_else(|| {
            CliError::Validation(
                "parent page ID required (via --parent, KMS_PARENT_PAGE_ID or [confluence] parent_page_id)"
                    .to_owned(),
            )
        })?;

        let client = ConfluenceClient::new(settings.url, settings.username, settings.password);

        let doc = Document::load(&self.file)?;
        output.info(&format!("Converting {}...", self.file.display()));

        let publish_config = PublishConfig {
            space_key: settings.space.to_owned(),
            parent_id: parent_id.to_owned(),
            title: self.title,
            toc: config.render.toc,
            sizing: super::image_sizing(&config),
            converter: super::converter_options(&config),
        };
        let publisher = PagePublisher::new(&client, publish_config);

        if self.dry_run {
            let result = publisher.dry_run(&doc)?;
            print_dry_run_result(&output, &result);
        } else {
            let result = publisher.publish(&doc)?;
            print_publish_result(&output, &result);
        }

        Ok(())
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            url: self.url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            space: self.space.clone(),
            parent_page_id: self.parent.clone(),
            toc: self.no_toc.then_some(false),
        }
    }
}

fn print_dry_run_result(output: &Output, result: &DryRunResult) {
    output.highlight("\n[DRY RUN] No changes made.");
    output.info(&format!("Title: {}", result.title));

    match (&result.existing, result.next_version) {
        (Some(page), Some(version)) => output.info(&format!(
            "Would update page {} to version {version}",
            page.id
        )),
        _ => output.info("Would create a new page"),
    }
    output.info(&format!("Markup: {} bytes", result.markup.len()));

    output.warnings(&result.warnings);
}

fn print_publish_result(output: &Output, result: &PublishResult) {
    output.success(&format!("\nPage {} successfully!", result.action));
    output.info(&format!("ID: {}", result.page.id));
    output.info(&format!("Title: {}", result.page.title));
    output.info(&format!("Version: {}", result.page.version_number()));
    output.info(&format!("URL: {}", result.url));

    if result.images_uploaded > 0 {
        output.info(&format!("Images uploaded: {}", result.images_uploaded));
    }

    output.warnings(&result.warnings);
}
