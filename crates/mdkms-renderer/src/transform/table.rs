//! Table repair.
//!
//! Confluence wants every table row inside a `<tbody>` and every line break
//! inside a cell explicitly closed. The converter guarantees neither for
//! tables written as raw HTML. CDATA sections are code and stay untouched.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{BlockTransformer, Capabilities, RunContext};
use crate::error::RenderError;
use crate::markup::map_outside_cdata;

static TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<table\b[^>]*>.*?</table>").unwrap());
static ROW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<tr\b[^>]*>.*?</tr>").unwrap());
static CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<(th|td)\b([^>]*)>(.*?)</(?:th|td)>").unwrap());
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br\s*/?>(?:\s*</br>)?").unwrap());

/// Repairs tables in converted HTML.
#[derive(Debug, Default)]
pub struct TableTransformer;

impl BlockTransformer for TableTransformer {
    fn name(&self) -> &'static str {
        "table"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::POST
    }

    fn postprocess(&mut self, html: &str, _ctx: &mut RunContext<'_>) -> Result<String, RenderError> {
        Ok(map_outside_cdata(html, |part| {
            TABLE
                .replace_all(part, |caps: &Captures<'_>| repair_table(&caps[0]))
                .into_owned()
        }))
    }
}

fn repair_table(table: &str) -> String {
    let table = ensure_tbody(table);
    ROW.replace_all(&table, |caps: &Captures<'_>| repair_row(&caps[0]))
        .into_owned()
}

/// Wrap body rows in `<tbody>` when the table has none.
fn ensure_tbody(table: &str) -> String {
    if table.contains("<tbody") {
        return table.to_owned();
    }
    let Some(end) = table.rfind("</table>") else {
        return table.to_owned();
    };

    let start = match table.find("</thead>") {
        Some(head_end) => head_end + "</thead>".len(),
        None => match table.find("<tr") {
            Some(first_row) => first_row,
            None => return table.to_owned(),
        },
    };
    if start > end {
        return table.to_owned();
    }

    format!(
        "{}<tbody>{}</tbody>{}",
        &table[..start],
        &table[start..end],
        &table[end..]
    )
}

/// Re-emit the cells of a row with line breaks closed.
///
/// A row without recognizable cells gets the line break fix applied to its
/// raw text so nothing is dropped.
fn repair_row(row: &str) -> String {
    if !CELL.is_match(row) {
        return close_line_breaks(row);
    }
    CELL.replace_all(row, |caps: &Captures<'_>| {
        let tag = &caps[1];
        format!("<{tag}{}>{}</{tag}>", &caps[2], close_line_breaks(&caps[3]))
    })
    .into_owned()
}

fn close_line_breaks(text: &str) -> String {
    LINE_BREAK.replace_all(text, "<br></br>").into_owned()
}
