use anyhow::Result;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::db::{self, ItemRow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(ItemRow),
    NotFound,
}

/// Exact fullname lookup of each candidate in page order; the first hit wins.
/// Later candidates are never consulted once one matches, even if they look
/// more specific. Blank candidates are ignored.
pub fn resolve<S: AsRef<str>>(conn: &Connection, candidates: &[S]) -> Result<Resolution> {
    for candidate in candidates.iter().map(AsRef::as_ref) {
        if candidate.trim().is_empty() {
            continue;
        }
        if let Some(item) = db::find_item_by_fullname(conn, candidate)? {
            info!(
                tag = candidate,
                shortname = %item.shortname,
                item_id = ?item.item_id,
                "FOUND: reference item"
            );
            return Ok(Resolution::Found(item));
        }
        debug!(tag = candidate, "no reference item with this fullname");
    }
    Ok(Resolution::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::insert_item;
    use crate::db::testing::{item, memory};

    fn shortname(r: Resolution) -> Option<String> {
        match r {
            Resolution::Found(i) => Some(i.shortname),
            Resolution::NotFound => None,
        }
    }

    #[test]
    fn first_matching_candidate_wins() {
        let conn = memory();
        insert_item(&conn, &item("TShirt Skin", "tshirt")).unwrap();
        let r = resolve(&conn, &["TShirt Skin", "Unknown Tag"]).unwrap();
        assert_eq!(shortname(r).as_deref(), Some("tshirt"));
    }

    #[test]
    fn no_candidate_matches() {
        let conn = memory();
        insert_item(&conn, &item("TShirt Skin", "tshirt")).unwrap();
        assert_eq!(resolve(&conn, &["Unknown Tag"]).unwrap(), Resolution::NotFound);
        assert_eq!(resolve::<&str>(&conn, &[]).unwrap(), Resolution::NotFound);
    }

    #[test]
    fn earlier_match_beats_later_more_specific_one() {
        let conn = memory();
        insert_item(&conn, &item("Skin", "generic")).unwrap();
        insert_item(&conn, &item("Hoodie Skin", "hoodie")).unwrap();
        let r = resolve(&conn, &["Skin", "Hoodie Skin"]).unwrap();
        assert_eq!(shortname(r).as_deref(), Some("generic"));
    }

    #[test]
    fn match_is_exact_not_fuzzy() {
        let conn = memory();
        insert_item(&conn, &item("Hoodie Skin", "hoodie")).unwrap();
        assert_eq!(resolve(&conn, &["hoodie skin", "Hoodie"]).unwrap(), Resolution::NotFound);
    }

    #[test]
    fn blank_candidate_never_matches_blank_fullname() {
        let conn = memory();
        insert_item(&conn, &item("", "pickaxe")).unwrap();
        assert_eq!(resolve(&conn, &["", "  "]).unwrap(), Resolution::NotFound);
    }
}
