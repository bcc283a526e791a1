//! Highlight spans.
//!
//! `<mark>` spans become styled spans. The background color is looked up in
//! a fixed palette keyed by the exact source value; anything else gets the
//! default tint.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{BlockTransformer, Capabilities, RunContext};
use crate::error::RenderError;
use crate::markup::map_outside_cdata;

static MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<mark(\s[^>]*)?>(.*?)</mark>").unwrap());

static BACKGROUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"background(?:-color)?\s*:\s*([^;]+)").unwrap());

static STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"style\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

/// Tint used for unknown or missing colors.
pub const DEFAULT_TINT: &str = "#FFF3B8";

/// Source highlight colors and the tint each maps to.
const PALETTE: [(&str, &str); 5] = [
    ("#FFF3A3A6", "#FFF3B8"),
    ("#BBFABBA6", "#E3FCE3"),
    ("#ADCCFFA6", "#DEEBFF"),
    ("#FFB8EBA6", "#FFEBE6"),
    ("#D2B3FFA6", "#EAE6FF"),
];

/// Map a source background color to its output tint.
pub fn tint_for(color: Option<&str>) -> &'static str {
    color
        .map(str::trim)
        .and_then(|c| PALETTE.iter().find(|(source, _)| *source == c))
        .map_or(DEFAULT_TINT, |&(_, tint)| tint)
}

/// Turns `<mark>` spans into background-colored spans.
#[derive(Debug, Default)]
pub struct HighlightTransformer;

impl BlockTransformer for HighlightTransformer {
    fn name(&self) -> &'static str {
        "highlight"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::POST
    }

    fn postprocess(&mut self, html: &str, _ctx: &mut RunContext<'_>) -> Result<String, RenderError> {
        Ok(map_outside_cdata(html, |part| {
            MARK.replace_all(part, |caps: &Captures<'_>| {
                let color = caps.get(1).and_then(|attrs| background_color(attrs.as_str()));
                format!(
                    r#"<span style="background-color: {}">{}</span>"#,
                    tint_for(color),
                    &caps[2]
                )
            })
            .into_owned()
        }))
    }
}

/// Background color from a tag's style attribute.
fn background_color(attrs: &str) -> Option<&str> {
    let style = STYLE.captures(attrs)?;
    let style = style.get(1).or_else(|| style.get(2))?.as_str();
    BACKGROUND
        .captures(style)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
