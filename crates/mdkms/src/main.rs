//! md2kms - publish Markdown notes to Confluence.
//!
//! Provides commands for:
//! - `publish`: Convert a Markdown file and create or update its page
//! - `convert`: Convert a Markdown file to storage markup offline

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ConvertArgs, PublishArgs};
use output::Output;

/// md2kms - Markdown to Confluence publisher.
#[derive(Parser)]
#[command(name = "md2kms", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a Markdown file as a child page of a parent page.
    Publish(PublishArgs),
    /// Convert a Markdown file to Confluence storage markup.
    Convert(ConvertArgs),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Publish(args) => args.verbose,
            Self::Convert(args) => args.verbose,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.verbose() {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = exit_on_interrupt() {
        tracing::warn!("Failed to install Ctrl+C handler: {}", err);
    }

    let result = match cli.command {
        Commands::Publish(args) => args.execute(),
        Commands::Convert(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

/// Exit with status 1 on Ctrl-C instead of dying from the signal.
fn exit_on_interrupt() -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()?;
    std::thread::spawn(move || {
        if runtime.block_on(tokio::signal::ctrl_c()).is_ok() {
            Output::new().error("Error: interrupted");
            std::process::exit(1);
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_publish_flags() {
        let cli = Cli::try_parse_from([
            "md2kms", "publish", "notes.md", "-t", "Title", "-p", "42", "--no-toc", "--dry-run",
        ])
        .unwrap();

        let Commands::Publish(args) = cli.command else {
            panic!("expected publish");
        };
        assert_eq!(args.title.as_deref(), Some("Title"));
        assert_eq!(args.parent.as_deref(), Some("42"));
        assert!(args.no_toc);
        assert!(args.dry_run);
        assert!(!args.verbose);
    }

    #[test]
    fn test_convert_verbose() {
        let cli = Cli::try_parse_from(["md2kms", "convert", "notes.md", "-o", "out.xml", "-v"])
            .unwrap();

        assert!(cli.command.verbose());
    }

    #[test]
    fn test_file_required() {
        assert!(Cli::try_parse_from(["md2kms", "publish"]).is_err());
    }
}
