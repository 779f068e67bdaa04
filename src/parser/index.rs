use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::warn;
use url::Url;

use super::absolute;

static CARD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.workshopBrowseItems div.workshopItem").unwrap());
static ITEM_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a.ugc").unwrap());

/// Lazily walks the item cards of a workshop browse page.
/// Cards without a usable link are skipped.
pub fn item_urls<'a>(doc: &'a Html, base: &'a Url) -> impl Iterator<Item = String> + 'a {
    doc.select(&CARD).filter_map(move |card| {
        let href = card
            .select(&ITEM_LINK)
            .next()
            .and_then(|a| a.value().attr("href"));
        match href.and_then(|h| absolute(base, h)) {
            Some(url) => Some(url),
            None => {
                warn!("Workshop item card without a link, skipping");
                None
            }
        }
    })
}
