use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Local};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::db::{self, NewSkin};
use crate::error::ExtractionError;
use crate::fetch::Fetch;
use crate::health::title_indicates_error;
use crate::parser::Extract;
use crate::resolve::{resolve, Resolution};

pub const APP_ID: u32 = 252490;

static SKIN_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"id=(\d+)").unwrap());

/// Workshop `requiredtags` values, already URL-encoded.
pub const CATEGORIES: &[&str] = &[
    "Bandana", "Balaclava", "Beenie+Hat", "Burlap+Shoes", "Burlap+Shirt", "Burlap+Pants",
    "Burlap+Headwrap", "Bucket+Helmet", "Boonie+Hat", "Cap", "Collared+Shirt",
    "Coffee+Can+Helmet", "Deer+Skull+Mask", "Hide+Skirt", "Hide+Shirt", "Hide+Pants",
    "Hide+Shoes", "Hide+Halterneck", "Hoodie", "Hide+Poncho", "Leather+Gloves", "Long+TShirt",
    "Metal+Chest+Plate", "Metal+Facemask", "Miner+Hat", "Pants", "Roadsign+Vest",
    "Roadsign+Pants", "Riot+Helmet", "Snow+Jacket", "Shorts", "Tank+Top", "TShirt",
    "Vagabond+Jacket", "Work+Boots", "AK47", "Bolt+Rifle", "Bone+Club", "Bone+Knife",
    "Crossbow", "Double+Barrel+Shotgun", "Eoka+Pistol", "F1+Grenade", "Longsword", "Mp5",
    "Pump+Shotgun", "Rock", "Salvaged+Hammer", "Salvaged+Icepick", "Satchel+Charge",
    "Semi-Automatic+Pistol", "Stone+Hatchet", "Stone+Pick+Axe", "Sword", "Thompson", "Hammer",
    "Hatchet", "Pick+Axe", "Revolver", "Rocket+Launcher", "Semi-Automatic+Rifle",
    "Waterpipe+Shotgun", "Custom+SMG", "Python", "LR300", "Combat+Knife", "Armored+Door",
    "Concrete+Barricade", "Large+Wood+Box", "Reactive+Target", "Sandbag+Barricade",
    "Sleeping+Bag", "Sheet+Metal+Door", "Water+Purifier", "Wood+Storage+Box", "Wooden+Door",
    "Wooden+Double+Door", "Sheet+Metal+Double+Door", "Armored+Double+Door",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    GeneratingIndexUrls,
    FetchingIndexPages,
    CollectingDetailUrls,
    FetchingDetailPages,
    ResolvingAndPersisting,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::GeneratingIndexUrls => "generating index urls",
            Phase::FetchingIndexPages => "fetching index pages",
            Phase::CollectingDetailUrls => "collecting detail urls",
            Phase::FetchingDetailPages => "fetching detail pages",
            Phase::ResolvingAndPersisting => "resolving and persisting",
            Phase::Done => "done",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexUrl {
    pub category: &'static str,
    pub page: u32,
    pub url: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ImportOptions<'a> {
    pub browse_url: &'a str,
    pub categories: &'a [&'static str],
    pub start_page: u32,
    pub max_page: u32,
}

#[derive(Debug)]
pub struct ImportSummary {
    pub index_pages: usize,
    pub index_failures: usize,
    pub detail_urls: usize,
    pub saved: usize,
    pub fetch_failures: usize,
    pub error_pages: usize,
    pub missing_fields: usize,
    pub duplicates: usize,
    /// Detail pages whose tags matched no reference item, in discovery order.
    pub unresolved: Vec<String>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub elapsed: Duration,
}

impl ImportSummary {
    fn new(started_at: DateTime<Local>) -> Self {
        ImportSummary {
            index_pages: 0,
            index_failures: 0,
            detail_urls: 0,
            saved: 0,
            fetch_failures: 0,
            error_pages: 0,
            missing_fields: 0,
            duplicates: 0,
            unresolved: Vec::new(),
            started_at,
            finished_at: started_at,
            elapsed: Duration::ZERO,
        }
    }

    pub fn print(&self) {
        println!(
            "Index pages: {} fetched, {} failed. Detail pages: {}.",
            self.index_pages, self.index_failures, self.detail_urls
        );
        println!(
            "Saved {} skins, {} already stored, {} unresolved, {} fetch failures, {} error pages, {} missing fields.",
            self.saved,
            self.duplicates,
            self.unresolved.len(),
            self.fetch_failures,
            self.error_pages,
            self.missing_fields,
        );
        if !self.unresolved.is_empty() {
            println!("\nUnable to locate the following items:");
            for url in &self.unresolved {
                println!("  {}", url);
            }
        }
        println!(
            "Import ran from {} to {} ({:.1}s)",
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            self.finished_at.format("%Y-%m-%d %H:%M:%S"),
            self.elapsed.as_secs_f64()
        );
    }
}

/// What happened to a single detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ItemOutcome {
    Saved(String),
    FetchFailed,
    ErrorPage,
    Missing(ExtractionError),
    Duplicate,
    Unresolved,
}

/// Category-major: every page of the first category, then the next one.
pub fn index_urls(opts: &ImportOptions) -> Vec<IndexUrl> {
    let mut urls = Vec::new();
    for &category in opts.categories {
        for page in opts.start_page..=opts.max_page {
            let url = format!(
                "{}?appid={}&browsesort=trend&section=mtxitems&requiredtags%5B0%5D={}&actualsort=trend&p={}",
                opts.browse_url, APP_ID, category, page
            );
            urls.push(IndexUrl {
                category,
                page,
                url,
            });
        }
    }
    urls
}

pub fn skin_id_from_url(url: &str) -> Option<&str> {
    SKIN_ID_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

pub fn skin_command(shortname: &str, skin_id: &str) -> String {
    format!("skin add {} {}", shortname, skin_id)
}

pub fn run(
    conn: &Connection,
    fetcher: &impl Fetch,
    extractor: &impl Extract,
    opts: &ImportOptions,
) -> Result<ImportSummary> {
    let started = Instant::now();
    let mut summary = ImportSummary::new(Local::now());

    enter(Phase::GeneratingIndexUrls);
    let index = index_urls(opts);
    info!("Generated {} index urls", index.len());

    enter(Phase::FetchingIndexPages);
    let found = collect_item_urls(fetcher, extractor, &index, &mut summary);

    enter(Phase::CollectingDetailUrls);
    let mut seen = HashSet::new();
    let item_urls: Vec<String> = found.into_iter().filter(|u| seen.insert(u.clone())).collect();
    summary.detail_urls = item_urls.len();
    info!("Collected {} detail urls", item_urls.len());

    enter(Phase::FetchingDetailPages);
    let pb = ProgressBar::new(item_urls.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    for url in &item_urls {
        match process_item(conn, fetcher, extractor, url)? {
            ItemOutcome::Saved(command) => {
                info!("Saved skin: {}", command);
                summary.saved += 1;
            }
            ItemOutcome::FetchFailed => summary.fetch_failures += 1,
            ItemOutcome::ErrorPage => summary.error_pages += 1,
            ItemOutcome::Missing(e) => {
                warn!("{} ({}), skipping this item", e, url);
                summary.missing_fields += 1;
            }
            ItemOutcome::Duplicate => summary.duplicates += 1,
            ItemOutcome::Unresolved => summary.unresolved.push(url.clone()),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    enter(Phase::Done);
    summary.finished_at = Local::now();
    summary.elapsed = started.elapsed();
    Ok(summary)
}

fn enter(phase: Phase) {
    info!(%phase, "workshop import");
}

/// A failed index page ends its own category; the next category starts fresh.
fn collect_item_urls(
    fetcher: &impl Fetch,
    extractor: &impl Extract,
    index: &[IndexUrl],
    summary: &mut ImportSummary,
) -> Vec<String> {
    let mut urls = Vec::new();
    let mut abandoned: Option<&str> = None;

    for entry in index {
        if abandoned == Some(entry.category) {
            continue;
        }
        match fetcher.fetch_ok(&entry.url) {
            Ok(html) => {
                summary.index_pages += 1;
                let before = urls.len();
                urls.extend(extractor.item_urls(&html));
                info!(
                    category = entry.category,
                    page = entry.page,
                    "Found {} items",
                    urls.len() - before
                );
            }
            Err(e) => {
                summary.index_failures += 1;
                warn!(
                    category = entry.category,
                    page = entry.page,
                    "{}. This must be the last page, moving to the next category",
                    e
                );
                abandoned = Some(entry.category);
            }
        }
    }
    urls
}

/// Every per-item failure becomes an outcome; only store errors escape.
fn process_item(
    conn: &Connection,
    fetcher: &impl Fetch,
    extractor: &impl Extract,
    url: &str,
) -> Result<ItemOutcome> {
    let html = match fetcher.fetch_ok(url) {
        Ok(html) => html,
        Err(e) => {
            warn!("{}, skipping this item", e);
            return Ok(ItemOutcome::FetchFailed);
        }
    };

    // Steam error pages carry no item markup, so check the page title first.
    if title_indicates_error(&extractor.health(&html).title) {
        warn!(url, "Page resulted in a Steam error page, skipping this item");
        return Ok(ItemOutcome::ErrorPage);
    }
    let fields = match extractor.detail(&html) {
        Ok(fields) => fields,
        Err(e) => return Ok(ItemOutcome::Missing(e)),
    };
    info!("FOUND: skin title - {}", fields.title);

    let Some(skin_id) = skin_id_from_url(url) else {
        return Ok(ItemOutcome::Missing(ExtractionError::MissingSkinId(url.to_string())));
    };
    if db::skin_exists(conn, skin_id)? {
        warn!(skin_id, "Skin is already in database, skipping this item");
        return Ok(ItemOutcome::Duplicate);
    }

    debug!(phase = %Phase::ResolvingAndPersisting, skin_id);
    let item = match resolve(conn, &fields.tags)? {
        Resolution::Found(item) => item,
        Resolution::NotFound => {
            warn!(url, tags = ?fields.tags, "Unable to find a matching reference item, skipping");
            return Ok(ItemOutcome::Unresolved);
        }
    };

    let command = skin_command(&item.shortname, skin_id);
    let skin = NewSkin {
        name: fields.title,
        skin_id: skin_id.to_string(),
        item_id: item.id,
        date_added: fields.posted,
        author: fields.author,
        url: url.to_string(),
        skin_command: command.clone(),
    };
    if !db::insert_skin(conn, &skin)? {
        warn!(skin_id, "Skin was stored concurrently, skipping this item");
        return Ok(ItemOutcome::Duplicate);
    }
    Ok(ItemOutcome::Saved(command))
}
