use anyhow::Result;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db::{self, NewItem};
use crate::fetch::Fetch;
use crate::parser::Extract;

/// Item-list names that the workshop tags spell differently.
const STEAM_NAMES: &[(&str, &str)] = &[
    ("MP5A4", "Mp5"),
    ("T-Shirt", "TShirt"),
    ("Bolt Action Rifle", "Bolt Rifle"),
    ("Burlap Trousers", "Burlap Pants"),
    ("Jacket", "Vagabond Jacket"),
    ("Longsleeve T-Shirt", "Long TShirt"),
    ("Bandana Mask", "Bandana"),
    ("LR-300 Assault Rifle", "LR300"),
    ("Python Revolver", "Python"),
    ("Road Sign Kilt", "Roadsign Pants"),
    ("Road Sign Jacket", "Roadsign Vest"),
    ("M39 Rifle", "M39"),
    ("Bone Helmet", "Deer Skull Mask"),
    ("Shirt", "Collared Shirt"),
    ("Rug Bear Skin", "Bearskin Rug"),
    ("Boots", "Work Boots"),
    ("Pickaxe", ""),
    ("Improvised Balaclava", "Balaclava"),
];

/// (fullname, shortname, item id, description) for items the list page lacks
/// or names differently from the workshop tags.
const BUILT_IN_ITEMS: &[(&str, &str, &str, &str)] = &[
    ("AK47 Skin", "rifle.ak", "1545779598", "High damage machine rifle."),
    ("AK47", "rifle.ak", "1545779598", "High damage machine rifle."),
    ("Hide Shirt", "attire.hide.poncho", "980333378", "A Poncho made from the hide of an animal."),
    ("Cap", "hat.cap", "-1022661119", "A baseball cap."),
    ("Pick Axe", "pickaxe", "-1302129395", "A Pickaxe, useful for gathering ore from rocks."),
    ("Hide Shoes", "attire.hide.boots", "794356786", "Boots made from the hide of an animal."),
    ("Stone Pick Axe", "stone.pickaxe", "171931394", "Primitive tool used for harvesting Stone, Metal ore and Sulfur ore."),
    ("Bandana Skin", "mask.bandana", "-702051347", "A square of cloth which is tied around the face over the nose and mouth."),
    ("TShirt Skin", "tshirt", "223891266", "A t-shirt with very short sleeves."),
    ("Rock Skin", "rock", "963906841", "A Rock. The most basic melee weapon and gathering tool."),
    ("Boots Skin", "shoes.boots", "-1549739227", "Work boots."),
    ("Hoodie Skin", "hoodie", "1751045826", "A hoodie."),
    ("Jacket Skin", "jacket", "-1163532624", "A rugged jacket."),
    ("Pants Skin", "pants", "237239288", "Pants."),
    ("Miner Hat", "hat.miner", "-1539025626", "A leather cap with a flashlight attached. It uses Low Grade Fuel and can be activated from the inventory."),
    ("Wooden Double Door", "door.double.hinged.wood", "-1336109173", "A Cheap door to secure your base. Its vulnerability to fire and weak explosive resistance makes the door a temporary solution to securing your base. Due to its flaws you should look at upgrading to a higher tier door such as Sheet Metal. The Wooden Door can take two kinds of locks the basic Key Lock and the Code Lock. To pick up the door, remove any locks and open, hold down the E (USE) key and select 'Pickup'."),
];

#[derive(Debug, Default)]
pub struct CatalogSummary {
    pub page_failed: bool,
    pub rows: usize,
    pub malformed: usize,
    pub saved: usize,
    pub duplicates: usize,
}

impl CatalogSummary {
    pub fn print(&self) {
        if self.page_failed {
            println!("Item list page could not be fetched; only built-in items were imported.");
        }
        println!(
            "Saved {} items ({} rows on page, {} malformed, {} already stored).",
            self.saved, self.rows, self.malformed, self.duplicates
        );
    }
}

pub fn steam_name(name: &str) -> &str {
    STEAM_NAMES
        .iter()
        .find(|(listed, _)| *listed == name)
        .map(|(_, steam)| *steam)
        .unwrap_or(name)
}

pub fn built_in_items() -> Vec<NewItem> {
    BUILT_IN_ITEMS
        .iter()
        .map(|(fullname, shortname, item_id, description)| NewItem {
            fullname: fullname.to_string(),
            shortname: shortname.to_string(),
            item_id: Some(item_id.to_string()),
            description: Some(description.to_string()),
            default_stack_size: Some(1),
        })
        .collect()
}

pub fn run(
    conn: &Connection,
    fetcher: &impl Fetch,
    extractor: &impl Extract,
    item_list_url: &str,
) -> Result<CatalogSummary> {
    let mut summary = CatalogSummary::default();

    info!("Grabbing reference items from {}", item_list_url);
    match fetcher.fetch_ok(item_list_url) {
        Ok(html) => {
            for row in extractor.catalog_rows(&html) {
                summary.rows += 1;
                match row {
                    Ok(mut item) => {
                        item.fullname = steam_name(&item.fullname).to_string();
                        save(conn, &item, &mut summary)?;
                    }
                    Err(e) => {
                        warn!("{}, skipping row {}", e, summary.rows);
                        summary.malformed += 1;
                    }
                }
            }
        }
        Err(e) => {
            warn!("{}", e);
            summary.page_failed = true;
        }
    }

    info!("Adding built-in reference items");
    for item in built_in_items() {
        save(conn, &item, &mut summary)?;
    }
    Ok(summary)
}

fn save(conn: &Connection, item: &NewItem, summary: &mut CatalogSummary) -> Result<()> {
    if db::item_exists(conn, &item.fullname)? || !db::insert_item(conn, item)? {
        warn!(
            "Item {:?} has already been added in the database, skipping",
            item.fullname
        );
        summary.duplicates += 1;
        return Ok(());
    }
    info!("Saved the item {} ({})", item.fullname, item.shortname);
    summary.saved += 1;
    Ok(())
}
