use chrono::Utc;
use rusqlite::{params, Connection, Result as RusqliteResult};

use crate::models::{Community, News};

pub fn create_news(conn: &Connection, title: &str, summary: &str) -> RusqliteResult<i64> {
    conn.execute(
        "INSERT INTO news (title, summary, created_at) VALUES (?1, ?2, ?3)",
        params![title, summary, Utc::now()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_latest_news(conn: &Connection, limit: u32) -> RusqliteResult<Vec<News>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, summary, created_at FROM news ORDER BY created_at DESC, id DESC LIMIT ?1",
    )?;
    let news = stmt
        .query_map([limit], |row| {
            Ok(News { id: row.get(0)?, title: row.get(1)?, summary: row.get(2)?, created_at: row.get(3)? })
        })?
        .collect::<RusqliteResult<Vec<_>>>()?;
    Ok(news)
}

pub fn create_community_link(conn: &Connection, title: &str, link: &str) -> RusqliteResult<i64> {
    conn.execute("INSERT INTO community (title, link) VALUES (?1, ?2)", params![title, link])?;
    Ok(conn.last_insert_rowid())
}

pub fn read_all_community_links(conn: &Connection) -> RusqliteResult<Vec<Community>> {
    let mut stmt = conn.prepare("SELECT id, title, link FROM community ORDER BY title, id")?;
    let links = stmt
        .query_map([], |row| Ok(Community { id: row.get(0)?, title: row.get(1)?, link: row.get(2)? }))?
        .collect::<RusqliteResult<Vec<_>>>()?;
    Ok(links)
}
