use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

use crate::db;

// ── Plugin template ──

#[derive(Debug, Serialize)]
pub struct SkinCatalog {
    #[serde(rename = "Command")]
    pub command: &'static str,
    #[serde(rename = "Skins")]
    pub skins: Vec<SkinGroup>,
    #[serde(rename = "Container Panel Name")]
    pub container_panel_name: &'static str,
    #[serde(rename = "Container Capacity")]
    pub container_capacity: u32,
    #[serde(rename = "UI")]
    pub ui: Ui,
    #[serde(rename = "Debug")]
    pub debug: bool,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct SkinGroup {
    #[serde(rename = "Item Shortname")]
    pub shortname: String,
    /// Leading 0 is the item's default look.
    #[serde(rename = "Skins")]
    pub skins: Vec<u64>,
}

#[derive(Debug, Serialize)]
pub struct Ui {
    #[serde(rename = "Background Color")]
    background_color: &'static str,
    #[serde(rename = "Background Anchors")]
    background_anchors: Anchors,
    #[serde(rename = "Background Offsets")]
    background_offsets: Offsets,
    #[serde(rename = "Left Button Text")]
    left_button_text: &'static str,
    #[serde(rename = "Left Button Color")]
    left_button_color: &'static str,
    #[serde(rename = "Left Button Anchors")]
    left_button_anchors: Anchors,
    #[serde(rename = "Center Button Text")]
    center_button_text: &'static str,
    #[serde(rename = "Center Button Color")]
    center_button_color: &'static str,
    #[serde(rename = "Center Button Anchors")]
    center_button_anchors: Anchors,
    #[serde(rename = "Right Button Text")]
    right_button_text: &'static str,
    #[serde(rename = "Right Button Color")]
    right_button_color: &'static str,
    #[serde(rename = "Right Button Anchors")]
    right_button_anchors: Anchors,
}

#[derive(Debug, Serialize)]
struct Anchors {
    #[serde(rename = "Anchor Min X")]
    min_x: &'static str,
    #[serde(rename = "Anchor Min Y")]
    min_y: &'static str,
    #[serde(rename = "Anchor Max X")]
    max_x: &'static str,
    #[serde(rename = "Anchor Max Y")]
    max_y: &'static str,
}

#[derive(Debug, Serialize)]
struct Offsets {
    #[serde(rename = "Offset Min X")]
    min_x: &'static str,
    #[serde(rename = "Offset Min Y")]
    min_y: &'static str,
    #[serde(rename = "Offset Max X")]
    max_x: &'static str,
    #[serde(rename = "Offset Max Y")]
    max_y: &'static str,
}

const BUTTON_COLOR: &str = "0.11 0.51 0.83";

fn anchors(min_x: &'static str, min_y: &'static str, max_x: &'static str, max_y: &'static str) -> Anchors {
    Anchors { min_x, min_y, max_x, max_y }
}

impl Default for Ui {
    fn default() -> Self {
        Ui {
            background_color: "0.18 0.28 0.36",
            background_anchors: anchors("1.0", "1.0", "1.0", "1.0"),
            background_offsets: Offsets {
                min_x: "-300",
                min_y: "-100",
                max_x: "0",
                max_y: "0",
            },
            left_button_text: "<size=36><</size>",
            left_button_color: BUTTON_COLOR,
            left_button_anchors: anchors("0.025", "0.05", "0.325", "0.95"),
            center_button_text: "<size=36>Page: {page}</size>",
            center_button_color: BUTTON_COLOR,
            center_button_anchors: anchors("0.350", "0.05", "0.650", "0.95"),
            right_button_text: "<size=36>></size>",
            right_button_color: BUTTON_COLOR,
            right_button_anchors: anchors("0.675", "0.05", "0.975", "0.95"),
        }
    }
}

impl SkinCatalog {
    pub fn new(skins: Vec<SkinGroup>) -> Self {
        SkinCatalog {
            command: "skin",
            skins,
            container_panel_name: "generic",
            container_capacity: 36,
            ui: Ui::default(),
            debug: false,
        }
    }
}

// ── Build & write ──

/// Groups stored skins by owning item's shortname. Input order is kept, so
/// shortnames come out descending and skins in insertion order.
pub fn group_skins(rows: Vec<(String, String)>) -> Vec<SkinGroup> {
    let mut groups: Vec<SkinGroup> = Vec::new();
    for (shortname, skin_id) in rows {
        let id = match skin_id.trim().parse::<u64>() {
            Ok(id) => id,
            Err(_) => {
                warn!(%shortname, %skin_id, "Skin id is not numeric, leaving it out");
                continue;
            }
        };
        match groups.last_mut() {
            Some(g) if g.shortname == shortname => g.skins.push(id),
            _ => groups.push(SkinGroup {
                shortname,
                skins: vec![0, id],
            }),
        }
    }
    groups
}

pub fn build(conn: &Connection) -> Result<SkinCatalog> {
    let rows = db::fetch_skin_ids_by_shortname(conn)?;
    let groups = group_skins(rows);
    for g in &groups {
        info!("Found ({}) skins for: {}", g.skins.len() - 1, g.shortname);
    }
    Ok(SkinCatalog::new(groups))
}

pub fn write(path: &Path, catalog: &SkinCatalog) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let json = serde_json::to_string_pretty(catalog)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
    info!("Saved {} skin groups to {:?}", catalog.skins.len(), path);
    Ok(())
}
