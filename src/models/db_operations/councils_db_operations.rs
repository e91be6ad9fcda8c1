use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result as RusqliteResult, Row};

use crate::models::{Category, Council};

fn row_to_council(row: &Row) -> RusqliteResult<Council> {
    Ok(Council {
        id: row.get(0)?,
        name: row.get(1)?,
        contact: row.get(2)?,
        contact_email: row.get(3)?,
        slug: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const COUNCIL_COLUMNS: &str = "id, name, contact, contact_email, slug, created_at, updated_at";

pub fn create_council(
    conn: &Connection,
    name: &str,
    contact: &str,
    contact_email: &str,
    slug: &str,
) -> RusqliteResult<i64> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO councils (name, contact, contact_email, slug, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![name, contact, contact_email, slug, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_all_councils(conn: &Connection) -> RusqliteResult<Vec<Council>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM councils ORDER BY name, id", COUNCIL_COLUMNS))?;
    let councils = stmt.query_map([], row_to_council)?.collect::<RusqliteResult<Vec<_>>>()?;
    Ok(councils)
}

pub fn read_council(conn: &Connection, id: i64) -> RusqliteResult<Option<Council>> {
    conn.query_row(
        &format!("SELECT {} FROM councils WHERE id = ?1", COUNCIL_COLUMNS),
        [id],
        row_to_council,
    )
    .optional()
}

pub fn council_exists(conn: &Connection, id: i64) -> RusqliteResult<bool> {
    conn.query_row("SELECT EXISTS(SELECT 1 FROM councils WHERE id = ?1)", [id], |row| row.get(0))
}

/// Deletes the council; its projects go with it, meetings and events keep
/// existing with no council.
pub fn delete_council(conn: &Connection, id: i64) -> RusqliteResult<usize> {
    conn.execute("DELETE FROM councils WHERE id = ?1", [id])
}

pub fn create_category(conn: &Connection, name: &str, description: &str) -> RusqliteResult<i64> {
    conn.execute(
        "INSERT INTO categories (name, description) VALUES (?1, ?2)",
        params![name, description],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_all_categories(conn: &Connection) -> RusqliteResult<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name, description FROM categories ORDER BY name, id")?;
    let categories = stmt
        .query_map([], |row| Ok(Category { id: row.get(0)?, name: row.get(1)?, description: row.get(2)? }))?
        .collect::<RusqliteResult<Vec<_>>>()?;
    Ok(categories)
}

pub fn category_exists(conn: &Connection, id: i64) -> RusqliteResult<bool> {
    conn.query_row("SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?1)", [id], |row| row.get(0))
}

/// Deletes the category; projects tagged with it lose the tag.
pub fn delete_category(conn: &Connection, id: i64) -> RusqliteResult<usize> {
    conn.execute("DELETE FROM categories WHERE id = ?1", [id])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::db_setup::setup_supplychain_db;

    fn conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_supplychain_db(&mut conn, false).unwrap();
        conn
    }

    #[test]
    fn councils_are_listed_by_name() {
        let conn = conn();
        create_council(&conn, "York", "A. Clerk", "clerk@york.gov.uk", "york").unwrap();
        let leeds = create_council(&conn, "Leeds", "B. Clerk", "clerk@leeds.gov.uk", "leeds").unwrap();

        let names: Vec<_> = read_all_councils(&conn).unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Leeds", "York"]);
        assert!(council_exists(&conn, leeds).unwrap());
        assert_eq!(read_council(&conn, leeds).unwrap().unwrap().slug, "leeds");
        assert!(read_council(&conn, 999).unwrap().is_none());
    }

    #[test]
    fn category_round_trip() {
        let conn = conn();
        let id = create_category(&conn, "Transport", "Roads and bridges").unwrap();
        assert!(category_exists(&conn, id).unwrap());
        assert_eq!(delete_category(&conn, id).unwrap(), 1);
        assert!(!category_exists(&conn, id).unwrap());
        assert!(read_all_categories(&conn).unwrap().is_empty());
    }
}
