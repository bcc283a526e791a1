//! `md2kms convert` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use mdkms_config::{CliSettings, Config};
use mdkms_renderer::{Document, Pipeline};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Path to the Markdown file.
    pub(crate) file: PathBuf,

    /// Write markup to this file instead of stdout.
    #[arg(short, long)]
    pub(crate) output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover kms.toml).
    #[arg(short, long)]
    pub(crate) config: Option<PathBuf>,

    /// Do not prepend the table of contents.
    #[arg(long)]
    pub(crate) no_toc: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl ConvertArgs {
    /// Convert the file offline. Local images become attachment references.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            toc: self.no_toc.then_some(false),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let doc = Document::load(&self.file)?;
        let pipeline = Pipeline::new()
            .with_toc(config.render.toc)
            .with_converter_options(super::converter_options(&config));
        let result = pipeline.render(&doc, None)?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, &result.markup)?;
                output.success(&format!(
                    "Converted {} -> {}",
                    self.file.display(),
                    path.display()
                ));
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(result.markup.as_bytes())?;
                stdout.flush()?;
            }
        }

        output.warnings(&result.warnings);
        Ok(())
    }
}
