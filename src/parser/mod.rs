pub mod catalog;
pub mod detail;
pub mod health;
pub mod index;

use scraper::{ElementRef, Html};
use url::Url;

use crate::db::NewItem;
use crate::error::ExtractionError;

pub use detail::DetailFields;
pub use health::HealthFields;

pub const STEAM_BASE_URL: &str = "https://steamcommunity.com/";

/// Typed fields per page role. Failures stay scoped to one field or one item.
pub trait Extract {
    /// Detail-page links of an index page, in card order.
    fn item_urls(&self, html: &str) -> Vec<String>;
    fn detail(&self, html: &str) -> Result<DetailFields, ExtractionError>;
    fn health(&self, html: &str) -> HealthFields;
    /// One entry per table row of the item list page.
    fn catalog_rows(&self, html: &str) -> Vec<Result<NewItem, ExtractionError>>;
}

/// `Extract` over the `scraper` crate; relative links resolve against `base`.
pub struct HtmlExtractor {
    base: Url,
}

impl HtmlExtractor {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn steam() -> Self {
        Self::new(Url::parse(STEAM_BASE_URL).expect("static base url"))
    }
}

impl Extract for HtmlExtractor {
    fn item_urls(&self, html: &str) -> Vec<String> {
        let doc = Html::parse_document(html);
        index::item_urls(&doc, &self.base).collect()
    }

    fn detail(&self, html: &str) -> Result<DetailFields, ExtractionError> {
        detail::extract(&Html::parse_document(html), &self.base)
    }

    fn health(&self, html: &str) -> HealthFields {
        health::extract(&Html::parse_document(html))
    }

    fn catalog_rows(&self, html: &str) -> Vec<Result<NewItem, ExtractionError>> {
        catalog::extract(&Html::parse_document(html))
    }
}

/// Element text with whitespace runs collapsed to single spaces.
fn text_of(el: ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn absolute(base: &Url, href: &str) -> Option<String> {
    base.join(href).ok().map(String::from)
}

#[cfg(test)]
pub(crate) fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
}
