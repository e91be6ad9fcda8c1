use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use thiserror::Error;

use crate::DbPool;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

const FOREIGN_KEYS_ON: &str = "PRAGMA foreign_keys = ON;";

/// Table name and DDL, in dependency order.
const TABLES: &[(&str, &str)] = &[
    ("councils", "CREATE TABLE IF NOT EXISTS councils (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        contact TEXT NOT NULL,
        contact_email TEXT NOT NULL,
        slug TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )"),
    ("categories", "CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT ''
    )"),
    ("projects", "CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        image TEXT NOT NULL DEFAULT '',
        main_image TEXT NOT NULL DEFAULT '',
        category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
        budget INTEGER NOT NULL,
        project_manager TEXT NOT NULL DEFAULT '',
        location TEXT NOT NULL DEFAULT '',
        council_id INTEGER NOT NULL REFERENCES councils(id) ON DELETE CASCADE,
        end_date TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )"),
    ("suppliers", "CREATE TABLE IF NOT EXISTS suppliers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        contact_person TEXT NOT NULL DEFAULT '',
        contact_email TEXT NOT NULL DEFAULT '',
        phone TEXT NOT NULL DEFAULT '',
        address TEXT NOT NULL DEFAULT '',
        specialty TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )"),
    // Contract values are kept in pence so the two decimal places are exact.
    ("project_suppliers", "CREATE TABLE IF NOT EXISTS project_suppliers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        supplier_id INTEGER NOT NULL REFERENCES suppliers(id) ON DELETE CASCADE,
        contract_value_pence INTEGER CHECK (contract_value_pence IS NULL OR contract_value_pence >= 0),
        created_at TEXT NOT NULL,
        UNIQUE (project_id, supplier_id)
    )"),
    ("contractor_requirements", "CREATE TABLE IF NOT EXISTS contractor_requirements (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        notes TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    )"),
    ("council_meetings", "CREATE TABLE IF NOT EXISTS council_meetings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        council_id INTEGER REFERENCES councils(id) ON DELETE SET NULL,
        date TEXT NOT NULL,
        time TEXT,
        location TEXT NOT NULL DEFAULT '',
        agenda TEXT NOT NULL DEFAULT '',
        archived INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )"),
    ("events", "CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        date TEXT NOT NULL,
        time TEXT,
        location TEXT NOT NULL DEFAULT '',
        image TEXT NOT NULL DEFAULT '',
        image_file TEXT,
        council_id INTEGER REFERENCES councils(id) ON DELETE SET NULL,
        project_id INTEGER REFERENCES projects(id) ON DELETE SET NULL,
        created_at TEXT NOT NULL
    )"),
    ("news", "CREATE TABLE IF NOT EXISTS news (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        summary TEXT NOT NULL,
        created_at TEXT NOT NULL
    )"),
    ("community", "CREATE TABLE IF NOT EXISTS community (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        link TEXT NOT NULL
    )"),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_projects_created_at ON projects(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_projects_council ON projects(council_id)",
    "CREATE INDEX IF NOT EXISTS idx_meetings_date ON council_meetings(date, time)",
    "CREATE INDEX IF NOT EXISTS idx_events_date ON events(date, time)",
];

/// Creates every table and index. Safe to run against an existing database.
pub fn setup_supplychain_db(conn: &mut Connection, verbose: bool) -> Result<(), SetupError> {
    conn.execute_batch(FOREIGN_KEYS_ON)?;
    let tx = conn.transaction()?;
    for (name, ddl) in TABLES {
        if verbose {
            println!("- Creating '{}' table...", name);
        }
        tx.execute(ddl, [])?;
    }
    for ddl in INDEXES {
        tx.execute(ddl, [])?;
    }
    tx.commit()?;
    Ok(())
}

/// Pool over the database file; every connection enforces foreign keys so the
/// cascade and set-null rules on deletes are honoured.
pub fn build_pool(manager: SqliteConnectionManager) -> Result<DbPool, r2d2::Error> {
    Pool::builder().build(manager.with_init(|c| c.execute_batch(FOREIGN_KEYS_ON)))
}

/// Single-connection in-memory database with the schema already in place.
/// Each in-memory connection is its own database, hence the pool size of one.
pub fn memory_pool() -> Result<DbPool, SetupError> {
    let manager = SqliteConnectionManager::memory().with_init(|c| c.execute_batch(FOREIGN_KEYS_ON));
    let pool = Pool::builder().max_size(1).build(manager)?;
    {
        let mut conn = pool.get()?;
        setup_supplychain_db(&mut conn, false)?;
    }
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_supplychain_db(&mut conn, false).unwrap();
        setup_supplychain_db(&mut conn, false).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables as usize, TABLES.len());
    }

    #[test]
    fn memory_pool_enforces_foreign_keys() {
        let pool = memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let enabled: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)).unwrap();
        assert_eq!(enabled, 1);
    }
}
