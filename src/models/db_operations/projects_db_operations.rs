use chrono::{NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result as RusqliteResult, Row};

use crate::models::project_filter::{ProjectFilter, PAGE_SIZE};
use crate::models::{ContractorRequirement, NewProject, Project, ProjectListing};

const LISTING_SELECT: &str = "SELECT p.id, p.title, p.description, p.image, p.main_image, p.category_id, p.budget, \
     p.project_manager, p.location, p.council_id, p.end_date, p.created_at, p.updated_at, \
     co.name, c.name \
     FROM projects p \
     JOIN councils co ON co.id = p.council_id \
     LEFT JOIN categories c ON c.id = p.category_id";

const NEWEST_FIRST: &str = "ORDER BY p.created_at DESC, p.id DESC";

fn row_to_listing(row: &Row) -> RusqliteResult<ProjectListing> {
    Ok(ProjectListing {
        project: Project {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            image: row.get(3)?,
            main_image: row.get(4)?,
            category_id: row.get(5)?,
            budget: row.get(6)?,
            project_manager: row.get(7)?,
            location: row.get(8)?,
            council_id: row.get(9)?,
            end_date: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        },
        council_name: row.get(13)?,
        category_name: row.get(14)?,
    })
}

pub fn create_project(conn: &Connection, new: &NewProject) -> RusqliteResult<i64> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO projects (title, description, image, main_image, category_id, budget, project_manager, location, council_id, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        params![
            new.title, new.description, new.image, new.main_image, new.category_id,
            new.budget, new.project_manager, new.location, new.council_id, now
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Rebinds every form-editable column. `end_date` is left alone; it only moves
/// through [`set_project_end_date`].
pub fn update_project(conn: &Connection, id: i64, new: &NewProject) -> RusqliteResult<usize> {
    conn.execute(
        "UPDATE projects SET title = ?1, description = ?2, image = ?3, main_image = ?4, category_id = ?5, budget = ?6, \
         project_manager = ?7, location = ?8, council_id = ?9, updated_at = ?10 WHERE id = ?11",
        params![
            new.title, new.description, new.image, new.main_image, new.category_id,
            new.budget, new.project_manager, new.location, new.council_id, Utc::now(), id
        ],
    )
}

pub fn set_project_end_date(conn: &Connection, id: i64, end_date: NaiveDate) -> RusqliteResult<usize> {
    conn.execute(
        "UPDATE projects SET end_date = ?1, updated_at = ?2 WHERE id = ?3",
        params![end_date, Utc::now(), id],
    )
}

pub fn delete_project(conn: &Connection, id: i64) -> RusqliteResult<usize> {
    conn.execute("DELETE FROM projects WHERE id = ?1", [id])
}

pub fn project_exists(conn: &Connection, id: i64) -> RusqliteResult<bool> {
    conn.query_row("SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?1)", [id], |row| row.get(0))
}

pub fn read_project(conn: &Connection, id: i64) -> RusqliteResult<Option<ProjectListing>> {
    conn.query_row(&format!("{} WHERE p.id = ?1", LISTING_SELECT), [id], row_to_listing)
        .optional()
}

pub fn read_latest_projects(conn: &Connection, limit: u32) -> RusqliteResult<Vec<ProjectListing>> {
    let mut stmt = conn.prepare(&format!("{} {} LIMIT ?1", LISTING_SELECT, NEWEST_FIRST))?;
    let projects = stmt.query_map([limit], row_to_listing)?.collect::<RusqliteResult<Vec<_>>>()?;
    Ok(projects)
}

/// Id and title of every project, for the event form's project picker.
pub fn read_project_titles(conn: &Connection) -> RusqliteResult<Vec<(i64, String)>> {
    let mut stmt = conn.prepare("SELECT id, title FROM projects ORDER BY title, id")?;
    let titles = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<RusqliteResult<Vec<_>>>()?;
    Ok(titles)
}

pub fn count_filtered_projects(conn: &Connection, filter: &ProjectFilter) -> RusqliteResult<i64> {
    let (conditions, values) = filter.where_clause();
    conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM projects p LEFT JOIN categories c ON c.id = p.category_id WHERE {}",
            conditions
        ),
        params_from_iter(values.iter()),
        |row| row.get(0),
    )
}

pub fn read_filtered_projects(conn: &Connection, filter: &ProjectFilter) -> RusqliteResult<Vec<ProjectListing>> {
    let (conditions, mut values) = filter.where_clause();
    let limit_idx = values.len() + 1;
    values.push(rusqlite::types::Value::Integer(PAGE_SIZE as i64));
    values.push(rusqlite::types::Value::Integer(filter.offset() as i64));

    let sql = format!(
        "{} WHERE {} {} LIMIT ?{} OFFSET ?{}",
        LISTING_SELECT, conditions, NEWEST_FIRST, limit_idx, limit_idx + 1
    );
    let mut stmt = conn.prepare(&sql)?;
    let projects = stmt
        .query_map(params_from_iter(values.iter()), row_to_listing)?
        .collect::<RusqliteResult<Vec<_>>>()?;
    Ok(projects)
}

// --- Contractor requirements ---

pub fn create_requirement(conn: &Connection, project_id: i64, name: &str, notes: &str) -> RusqliteResult<i64> {
    conn.execute(
        "INSERT INTO contractor_requirements (project_id, name, notes, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![project_id, name, notes, Utc::now()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_requirements_for_project(conn: &Connection, project_id: i64) -> RusqliteResult<Vec<ContractorRequirement>> {
    let mut stmt = conn.prepare(
        "SELECT id, project_id, name, notes, created_at FROM contractor_requirements WHERE project_id = ?1 ORDER BY id",
    )?;
    let requirements = stmt
        .query_map([project_id], |row| {
            Ok(ContractorRequirement {
                id: row.get(0)?,
                project_id: row.get(1)?,
                name: row.get(2)?,
                notes: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<RusqliteResult<Vec<_>>>()?;
    Ok(requirements)
}
