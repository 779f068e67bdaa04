use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::text_of;

static PAGE_TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("head title").unwrap());
static APP_NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.apphub_HeaderTop div.apphub_AppName").unwrap());

/// Both values lower-cased; empty when the element is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthFields {
    pub title: String,
    pub app_name: String,
}

pub fn extract(doc: &Html) -> HealthFields {
    let lower = |sel: &Selector| {
        doc.select(sel)
            .next()
            .map(text_of)
            .unwrap_or_default()
            .to_lowercase()
    };
    HealthFields {
        title: lower(&PAGE_TITLE),
        app_name: lower(&APP_NAME),
    }
}
