use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use super::{absolute, text_of};
use crate::error::ExtractionError;

static ITEM_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.workshopItemTitle").unwrap());
static TAG_BLOCK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.workshopTags").unwrap());
static TAG_HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.workshopTagsTitle").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static STAT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.detailsStatRight").unwrap());
static AUTHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.creatorsBlock div.friendBlock a").unwrap());

const TAG_GROUP_LABEL: &str = "Tags:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailFields {
    pub title: String,
    /// Tag candidates in page order.
    pub tags: Vec<String>,
    /// "<month> <day> @ <time>", empty when the page has none.
    pub posted: String,
    pub author: String,
}

pub fn extract(doc: &Html, base: &Url) -> Result<DetailFields, ExtractionError> {
    let title = doc
        .select(&ITEM_TITLE)
        .next()
        .map(text_of)
        .filter(|t| !t.is_empty())
        .ok_or(ExtractionError::MissingField("title"))?;

    Ok(DetailFields {
        title,
        tags: tags(doc),
        posted: posted_date(doc),
        author: author(doc, base),
    })
}

/// Tag blocks come in two shapes: a "Tags:" group listing several links,
/// or a single labelled value (e.g. "Item Type:" + one link).
fn tags(doc: &Html) -> Vec<String> {
    let mut out = Vec::new();
    let mut blocks = 0;

    for block in doc.select(&TAG_BLOCK) {
        blocks += 1;
        let Some(heading) = block.select(&TAG_HEADING).next() else {
            warn!("Workshop tag title is missing");
            continue;
        };
        if text_of(heading).contains(TAG_GROUP_LABEL) {
            out.extend(block.select(&ANCHOR).map(text_of));
        } else if let Some(a) = block.select(&ANCHOR).next() {
            out.push(text_of(a));
        }
    }

    if blocks == 0 {
        warn!("No workshop tag block on page");
    }
    out.retain(|t| !t.is_empty());
    debug!(?out, "tag candidates");
    out
}

fn posted_date(doc: &Html) -> String {
    doc.select(&STAT)
        .map(text_of)
        .find(|v| v.contains('@'))
        .unwrap_or_default()
}

fn author(doc: &Html, base: &Url) -> String {
    let href = doc
        .select(&AUTHOR)
        .next()
        .and_then(|a: ElementRef| a.value().attr("href"))
        .and_then(|h| absolute(base, h));
    href.unwrap_or_else(|| {
        warn!("Skin author link is missing");
        String::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{fixture, STEAM_BASE_URL};

    fn parse(html: &str) -> Result<DetailFields, ExtractionError> {
        extract(&Html::parse_document(html), &Url::parse(STEAM_BASE_URL).unwrap())
    }

    #[test]
    fn detail_fixture() {
        let d = parse(&fixture("workshop_detail")).unwrap();
        assert_eq!(d.title, "Midnight Hoodie");
        assert_eq!(d.tags, vec!["Skin", "Hoodie Skin", "Version3"]);
        assert_eq!(d.posted, "Dec 4, 2020 @ 6:21pm");
        assert_eq!(d.author, "https://steamcommunity.com/id/somecreator");
    }

    #[test]
    fn single_labelled_tag_block() {
        let html = r#"<html><head><title>t</title></head><body>
            <div class="workshopItemTitle">Cap</div>
            <div class="workshopTags"><span class="workshopTagsTitle">Item Type:&nbsp;</span>
                <a href="/x">Cap</a><a href="/y">Ignored</a></div>
        </body></html>"#;
        assert_eq!(parse(html).unwrap().tags, vec!["Cap"]);
    }

    #[test]
    fn block_without_heading_contributes_nothing() {
        let html = r#"<body><div class="workshopItemTitle">X</div>
            <div class="workshopTags"><a>Orphan</a></div>
            <div class="workshopTags"><span class="workshopTagsTitle">Tags:</span><a>Rock Skin</a></div>
        </body>"#;
        assert_eq!(parse(html).unwrap().tags, vec!["Rock Skin"]);
    }

    #[test]
    fn missing_title_is_fatal() {
        let html = r#"<body><div class="workshopTags"><span class="workshopTagsTitle">Tags:</span><a>Cap</a></div></body>"#;
        assert_eq!(parse(html), Err(ExtractionError::MissingField("title")));
    }

    #[test]
    fn missing_optional_fields_are_empty() {
        let d = parse(r#"<body><div class="workshopItemTitle">Lonely</div>
            <div class="detailsStatRight">1.2 MB</div></body>"#)
        .unwrap();
        assert!(d.tags.is_empty());
        assert_eq!(d.posted, "");
        assert_eq!(d.author, "");
    }
}
