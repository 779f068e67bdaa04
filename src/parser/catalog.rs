use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::text_of;
use crate::db::NewItem;
use crate::error::ExtractionError;

static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table.ch-table tbody tr").unwrap());
static NAME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td.ch-tbl-name").unwrap());
static SHORT_NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.ch-tbl-short-name").unwrap());
static ITEM_ID: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td.ch-tbl-id").unwrap());
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td.ch-tbl-desc").unwrap());
static STACK_SIZE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.ch-tbl-stack-size").unwrap());

/// Item list rows as found on the page. Fullnames are raw, not yet mapped to Steam names.
pub fn extract(doc: &Html) -> Vec<Result<NewItem, ExtractionError>> {
    doc.select(&ROW).map(row).collect()
}

fn row(tr: ElementRef) -> Result<NewItem, ExtractionError> {
    let cell = |sel: &Selector| tr.select(sel).next().map(text_of);
    let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());

    let fullname = cell(&NAME).ok_or(ExtractionError::MissingField("name"))?;
    let shortname =
        non_empty(cell(&SHORT_NAME)).ok_or(ExtractionError::MissingField("shortname"))?;

    Ok(NewItem {
        fullname,
        shortname,
        item_id: non_empty(cell(&ITEM_ID)),
        description: non_empty(cell(&DESCRIPTION)),
        default_stack_size: cell(&STACK_SIZE).and_then(|s| parse_stack_size(&s)),
    })
}

/// "1,000" → 1000; anything non-numeric → None.
fn parse_stack_size(raw: &str) -> Option<i64> {
    let digits: String = raw.chars().filter(|c| *c != ',').collect();
    digits.trim().parse().ok()
}
