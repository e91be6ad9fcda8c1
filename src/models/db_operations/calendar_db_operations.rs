use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as RusqliteResult, Row};

use crate::models::{CouncilMeeting, Event, NewEvent, NewMeeting};

const EVENT_SELECT: &str = "SELECT e.id, e.title, e.description, e.date, e.time, e.location, e.image, e.image_file, \
     e.council_id, co.name, e.project_id, p.title, e.created_at \
     FROM events e \
     LEFT JOIN councils co ON co.id = e.council_id \
     LEFT JOIN projects p ON p.id = e.project_id";

const MEETING_SELECT: &str = "SELECT m.id, m.council_id, co.name, m.date, m.time, m.location, m.agenda, m.archived, m.created_at \
     FROM council_meetings m \
     LEFT JOIN councils co ON co.id = m.council_id";

fn row_to_event(row: &Row) -> RusqliteResult<Event> {
    Ok(Event {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        location: row.get(5)?,
        image: row.get(6)?,
        image_file: row.get(7)?,
        council_id: row.get(8)?,
        council_name: row.get(9)?,
        project_id: row.get(10)?,
        project_title: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn row_to_meeting(row: &Row) -> RusqliteResult<CouncilMeeting> {
    Ok(CouncilMeeting {
        id: row.get(0)?,
        council_id: row.get(1)?,
        council_name: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        location: row.get(5)?,
        agenda: row.get(6)?,
        archived: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub fn create_event(conn: &Connection, new: &NewEvent) -> RusqliteResult<i64> {
    conn.execute(
        "INSERT INTO events (title, description, date, time, location, image, image_file, council_id, project_id, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            new.title, new.description, new.date, new.time, new.location, new.image,
            new.image_file, new.council_id, new.project_id, Utc::now()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_event(conn: &Connection, id: i64) -> RusqliteResult<Option<Event>> {
    conn.query_row(&format!("{} WHERE e.id = ?1", EVENT_SELECT), [id], row_to_event)
        .optional()
}

/// Events dated `today` or later, in calendar order. SQLite sorts a NULL time
/// first, as `calendar_order` does.
pub fn read_upcoming_events(conn: &Connection, today: NaiveDate) -> RusqliteResult<Vec<Event>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE e.date >= ?1 ORDER BY e.date ASC, e.time ASC, e.id ASC",
        EVENT_SELECT
    ))?;
    let events = stmt.query_map([today], row_to_event)?.collect::<RusqliteResult<Vec<_>>>()?;
    Ok(events)
}

pub fn create_meeting(conn: &Connection, new: &NewMeeting) -> RusqliteResult<i64> {
    conn.execute(
        "INSERT INTO council_meetings (council_id, date, time, location, agenda, archived, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
        params![new.council_id, new.date, new.time, new.location, new.agenda, Utc::now()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_meeting(conn: &Connection, id: i64) -> RusqliteResult<Option<CouncilMeeting>> {
    conn.query_row(&format!("{} WHERE m.id = ?1", MEETING_SELECT), [id], row_to_meeting)
        .optional()
}

pub fn read_all_meetings(conn: &Connection) -> RusqliteResult<Vec<CouncilMeeting>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY m.date ASC, m.time ASC, m.id ASC", MEETING_SELECT))?;
    let meetings = stmt.query_map([], row_to_meeting)?.collect::<RusqliteResult<Vec<_>>>()?;
    Ok(meetings)
}

/// Non-archived meetings dated `today` or later, in calendar order, optionally
/// capped at `limit` rows.
pub fn read_upcoming_meetings(
    conn: &Connection,
    today: NaiveDate,
    limit: Option<u32>,
) -> RusqliteResult<Vec<CouncilMeeting>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE m.archived = 0 AND m.date >= ?1 ORDER BY m.date ASC, m.time ASC, m.id ASC LIMIT ?2",
        MEETING_SELECT
    ))?;
    // A negative LIMIT means no limit in SQLite.
    let limit = limit.map(i64::from).unwrap_or(-1);
    let meetings = stmt
        .query_map(params![today, limit], row_to_meeting)?
        .collect::<RusqliteResult<Vec<_>>>()?;
    Ok(meetings)
}

pub fn set_meeting_archived(conn: &Connection, id: i64, archived: bool) -> RusqliteResult<usize> {
    conn.execute("UPDATE council_meetings SET archived = ?1 WHERE id = ?2", params![archived, id])
}
