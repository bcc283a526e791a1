//! Text passes that run before the block transformers.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Deserialize;
use tracing::warn;

use crate::fence::{map_plain_text, map_prose};
use crate::markup::escape_bare_ampersands;
use crate::vault::PlaceholderVault;

static FRONT_MATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n|\z)").unwrap()
});

static TASK_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*+] \[([ xX])\] (.*\S)\s*$").unwrap());

static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]\n]*)\]\(([^)\n]*)\)").unwrap());

/// Metadata from the YAML block at the top of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FrontMatter {
    /// Page title.
    #[serde(default)]
    pub title: Option<String>,
}

/// Split a leading YAML front matter block from the document body.
///
/// The block is removed even if it is not valid YAML; in that case a warning
/// is logged and no metadata is returned.
pub fn split_front_matter(text: &str) -> (Option<FrontMatter>, &str) {
    let Some(caps) = FRONT_MATTER.captures(text) else {
        return (None, text);
    };
    let body = &text[caps.get(0).map_or(0, |m| m.end())..];
    let yaml = caps.get(1).map_or("", |m| m.as_str());

    if yaml.trim().is_empty() {
        return (Some(FrontMatter::default()), body);
    }

    match serde_yaml::from_str::<FrontMatter>(yaml) {
        Ok(front_matter) => (Some(front_matter), body),
        Err(e) => {
            warn!(error = %e, "Ignoring unparsable front matter");
            (None, body)
        }
    }
}

/// A parsed task list item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TaskItem<'a> {
    pub(crate) done: bool,
    pub(crate) text: &'a str,
}

/// Parse one task list line.
pub(crate) fn parse_task_item(line: &str) -> Option<TaskItem<'_>> {
    let caps = TASK_ITEM.captures(line)?;
    Some(TaskItem {
        done: !caps[1].trim().is_empty(),
        text: caps.get(2)?.as_str(),
    })
}

/// Replace each run of consecutive task list lines with one placeholder.
///
/// The placeholder stands in its own paragraph so it can later be swapped
/// for a block-level task list.
pub(crate) fn protect_task_lists(text: &str, vault: &mut PlaceholderVault) -> String {
    map_prose(text, |segment| {
        let mut out = String::with_capacity(segment.len());
        let mut run = String::new();

        for line in segment.split_inclusive('\n') {
            if parse_task_item(line).is_some() {
                run.push_str(line);
                continue;
            }
            flush_task_run(&mut out, &mut run, vault);
            out.push_str(line);
        }
        flush_task_run(&mut out, &mut run, vault);

        out
    })
}

fn flush_task_run(out: &mut String, run: &mut String, vault: &mut PlaceholderVault) {
    if run.is_empty() {
        return;
    }
    let token = vault.stash(run.trim_end());
    out.push('\n');
    out.push_str(&token);
    out.push_str("\n\n");
    run.clear();
}

/// Escape bare `&` in Markdown link destinations outside code.
pub(crate) fn escape_link_urls(text: &str) -> String {
    map_plain_text(text, |segment| {
        MARKDOWN_LINK
            .replace_all(segment, |caps: &Captures<'_>| {
                format!("[{}]({})", &caps[1], escape_bare_ampersands(&caps[2]))
            })
            .into_owned()
    })
}
