use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS items (
            id                 INTEGER PRIMARY KEY,
            fullname           TEXT NOT NULL UNIQUE,
            shortname          TEXT NOT NULL,
            item_id            TEXT,
            description        TEXT,
            default_stack_size INTEGER,
            created_at         TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_items_shortname ON items(shortname);

        CREATE TABLE IF NOT EXISTS skins (
            id           INTEGER PRIMARY KEY,
            name         TEXT NOT NULL,
            skin_id      TEXT NOT NULL UNIQUE,
            item_id      INTEGER NOT NULL REFERENCES items(id),
            date_added   TEXT NOT NULL,
            author       TEXT NOT NULL,
            url          TEXT NOT NULL,
            skin_command TEXT NOT NULL,
            created_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_skins_item ON skins(item_id);
        ",
    )?;
    Ok(())
}

// ── Reference items ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub fullname: String,
    pub shortname: String,
    pub item_id: Option<String>,
    pub description: Option<String>,
    pub default_stack_size: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRow {
    pub id: i64,
    pub fullname: String,
    pub shortname: String,
    pub item_id: Option<String>,
}

pub fn item_exists(conn: &Connection, fullname: &str) -> Result<bool> {
    let hit = conn
        .query_row(
            "SELECT 1 FROM items WHERE fullname = ?1",
            [fullname],
            |_| Ok(()),
        )
        .optional()?;
    Ok(hit.is_some())
}

/// Returns false when an item with the same fullname is already stored.
pub fn insert_item(conn: &Connection, item: &NewItem) -> Result<bool> {
    let n = conn.execute(
        "INSERT OR IGNORE INTO items (fullname, shortname, item_id, description, default_stack_size)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            item.fullname,
            item.shortname,
            item.item_id,
            item.description,
            item.default_stack_size,
        ],
    )?;
    Ok(n > 0)
}

pub fn find_item_by_fullname(conn: &Connection, fullname: &str) -> Result<Option<ItemRow>> {
    let row = conn
        .query_row(
            "SELECT id, fullname, shortname, item_id FROM items WHERE fullname = ?1",
            [fullname],
            |row| {
                Ok(ItemRow {
                    id: row.get(0)?,
                    fullname: row.get(1)?,
                    shortname: row.get(2)?,
                    item_id: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

// ── Skins ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSkin {
    pub name: String,
    pub skin_id: String,
    pub item_id: i64,
    pub date_added: String,
    pub author: String,
    pub url: String,
    pub skin_command: String,
}

/// Persisted skin as needed by the page-health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkinRow {
    pub id: i64,
    pub skin_id: String,
    pub url: String,
}

pub fn skin_exists(conn: &Connection, skin_id: &str) -> Result<bool> {
    let hit = conn
        .query_row("SELECT 1 FROM skins WHERE skin_id = ?1", [skin_id], |_| Ok(()))
        .optional()?;
    Ok(hit.is_some())
}

/// Returns false when the skin id is already stored.
pub fn insert_skin(conn: &Connection, skin: &NewSkin) -> Result<bool> {
    let n = conn.execute(
        "INSERT OR IGNORE INTO skins (name, skin_id, item_id, date_added, author, url, skin_command)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            skin.name,
            skin.skin_id,
            skin.item_id,
            skin.date_added,
            skin.author,
            skin.url,
            skin.skin_command,
        ],
    )?;
    Ok(n > 0)
}

/// Highest persisted skin row id, 0 for an empty store.
pub fn max_skin_row_id(conn: &Connection) -> Result<i64> {
    let id = conn.query_row("SELECT COALESCE(MAX(id), 0) FROM skins", [], |r| r.get(0))?;
    Ok(id)
}

pub fn fetch_skins_in_range(conn: &Connection, min: i64, max: i64) -> Result<Vec<SkinRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, skin_id, url FROM skins WHERE id >= ?1 AND id <= ?2 ORDER BY id",
    )?;
    let rows = stmt
        .query_map([min, max], |row| {
            Ok(SkinRow {
                id: row.get(0)?,
                skin_id: row.get(1)?,
                url: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Export ──

/// (shortname, skin_id) pairs, shortnames descending, skins in insertion order.
pub fn fetch_skin_ids_by_shortname(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT i.shortname, s.skin_id
         FROM skins s
         JOIN items i ON i.id = s.item_id
         ORDER BY i.shortname DESC, s.id",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub items: usize,
    pub skins: usize,
    pub items_with_skins: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let items: usize = conn.query_row("SELECT COUNT(*) FROM items", [], |r| r.get(0))?;
    let skins: usize = conn.query_row("SELECT COUNT(*) FROM skins", [], |r| r.get(0))?;
    let items_with_skins: usize = conn.query_row(
        "SELECT COUNT(DISTINCT item_id) FROM skins",
        [],
        |r| r.get(0),
    )?;
    Ok(Stats {
        items,
        skins,
        items_with_skins,
    })
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn item_fullname_is_unique() {
        let conn = memory();
        assert!(insert_item(&conn, &item("Hoodie Skin", "hoodie")).unwrap());
        assert!(!insert_item(&conn, &item("Hoodie Skin", "other")).unwrap());
        assert!(item_exists(&conn, "Hoodie Skin").unwrap());
        let found = find_item_by_fullname(&conn, "Hoodie Skin").unwrap().unwrap();
        assert_eq!(found.shortname, "hoodie");
    }

    #[test]
    fn skin_id_is_unique() {
        let conn = memory();
        insert_item(&conn, &item("Hoodie Skin", "hoodie")).unwrap();
        assert!(insert_skin(&conn, &skin(1, "111")).unwrap());
        assert!(!insert_skin(&conn, &skin(1, "111")).unwrap());
        assert!(skin_exists(&conn, "111").unwrap());
        assert!(!skin_exists(&conn, "222").unwrap());
    }

    #[test]
    fn skin_requires_existing_item() {
        let conn = memory();
        assert!(insert_skin(&conn, &skin(42, "111")).is_err());
    }

    #[test]
    fn range_query_and_max_id() {
        let conn = memory();
        assert_eq!(max_skin_row_id(&conn).unwrap(), 0);
        insert_item(&conn, &item("Hoodie Skin", "hoodie")).unwrap();
        for id in ["1", "2", "3", "4"] {
            insert_skin(&conn, &skin(1, id)).unwrap();
        }
        assert_eq!(max_skin_row_id(&conn).unwrap(), 4);
        let rows = fetch_skins_in_range(&conn, 2, 3).unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn stats_counts() {
        let conn = memory();
        insert_item(&conn, &item("Hoodie Skin", "hoodie")).unwrap();
        insert_item(&conn, &item("Cap", "hat.cap")).unwrap();
        insert_skin(&conn, &skin(1, "1")).unwrap();
        insert_skin(&conn, &skin(1, "2")).unwrap();
        let s = get_stats(&conn).unwrap();
        assert_eq!((s.items, s.skins, s.items_with_skins), (2, 2, 1));
    }
}
