use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result as RusqliteResult, Row};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::models::{NewSupplier, ProjectSupplier, ProjectSupplierWithSupplier, Supplier, SupplierContract};

const SUPPLIER_COLUMNS: &str =
    "s.id, s.name, s.contact_person, s.contact_email, s.phone, s.address, s.specialty, s.created_at, s.updated_at";

/// Reads a supplier from nine consecutive columns starting at `offset`.
fn supplier_at(row: &Row, offset: usize) -> RusqliteResult<Supplier> {
    Ok(Supplier {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        contact_person: row.get(offset + 2)?,
        contact_email: row.get(offset + 3)?,
        phone: row.get(offset + 4)?,
        address: row.get(offset + 5)?,
        specialty: row.get(offset + 6)?,
        created_at: row.get(offset + 7)?,
        updated_at: row.get(offset + 8)?,
    })
}

/// Reads an association row from five consecutive columns, the contract value
/// being stored as whole pence.
fn link_at(row: &Row, offset: usize) -> RusqliteResult<ProjectSupplier> {
    let pence: Option<i64> = row.get(offset + 3)?;
    Ok(ProjectSupplier {
        id: row.get(offset)?,
        project_id: row.get(offset + 1)?,
        supplier_id: row.get(offset + 2)?,
        contract_value: pence.map(pence_to_pounds),
        created_at: row.get(offset + 4)?,
    })
}

pub fn pence_to_pounds(pence: i64) -> Decimal {
    Decimal::new(pence, 2)
}

/// Rounds to the nearest penny (half away from zero); `None` when the amount
/// does not fit in an i64 of pence.
pub fn pounds_to_pence(value: Decimal) -> Option<i64> {
    (value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero) * Decimal::ONE_HUNDRED).to_i64()
}

pub fn create_supplier(conn: &Connection, new: &NewSupplier) -> RusqliteResult<i64> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO suppliers (name, contact_person, contact_email, phone, address, specialty, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![new.name, new.contact_person, new.contact_email, new.phone, new.address, new.specialty, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_supplier(conn: &Connection, id: i64, new: &NewSupplier) -> RusqliteResult<usize> {
    conn.execute(
        "UPDATE suppliers SET name = ?1, contact_person = ?2, contact_email = ?3, phone = ?4, address = ?5, \
         specialty = ?6, updated_at = ?7 WHERE id = ?8",
        params![new.name, new.contact_person, new.contact_email, new.phone, new.address, new.specialty, Utc::now(), id],
    )
}

pub fn delete_supplier(conn: &Connection, id: i64) -> RusqliteResult<usize> {
    conn.execute("DELETE FROM suppliers WHERE id = ?1", [id])
}

pub fn read_supplier(conn: &Connection, id: i64) -> RusqliteResult<Option<Supplier>> {
    conn.query_row(
        &format!("SELECT {} FROM suppliers s WHERE s.id = ?1", SUPPLIER_COLUMNS),
        [id],
        |row| supplier_at(row, 0),
    )
    .optional()
}

pub fn read_all_suppliers(conn: &Connection) -> RusqliteResult<Vec<Supplier>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM suppliers s ORDER BY s.name, s.id", SUPPLIER_COLUMNS))?;
    let suppliers = stmt.query_map([], |row| supplier_at(row, 0))?.collect::<RusqliteResult<Vec<_>>>()?;
    Ok(suppliers)
}

/// Whether another supplier already uses `name`. `exclude_id` skips the
/// supplier being edited.
pub fn supplier_name_taken(conn: &Connection, name: &str, exclude_id: Option<i64>) -> RusqliteResult<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM suppliers WHERE name = ?1 AND id IS NOT ?2)",
        params![name, exclude_id],
        |row| row.get(0),
    )
}

pub fn supplier_exists(conn: &Connection, id: i64) -> RusqliteResult<bool> {
    conn.query_row("SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = ?1)", [id], |row| row.get(0))
}

// --- Project/supplier associations ---

/// Links a supplier to a project. A second link for the same pair is refused
/// by the UNIQUE constraint and surfaces as a constraint-violation error.
pub fn create_project_supplier(
    conn: &Connection,
    project_id: i64,
    supplier_id: i64,
    contract_value_pence: Option<i64>,
) -> RusqliteResult<i64> {
    conn.execute(
        "INSERT INTO project_suppliers (project_id, supplier_id, contract_value_pence, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![project_id, supplier_id, contract_value_pence, Utc::now()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn delete_project_supplier(conn: &Connection, project_id: i64, supplier_id: i64) -> RusqliteResult<usize> {
    conn.execute(
        "DELETE FROM project_suppliers WHERE project_id = ?1 AND supplier_id = ?2",
        [project_id, supplier_id],
    )
}

/// Every association of a project with its supplier, in a single query.
pub fn read_suppliers_for_project(conn: &Connection, project_id: i64) -> RusqliteResult<Vec<ProjectSupplierWithSupplier>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT ps.id, ps.project_id, ps.supplier_id, ps.contract_value_pence, ps.created_at, {} \
         FROM project_suppliers ps JOIN suppliers s ON s.id = ps.supplier_id \
         WHERE ps.project_id = ?1 ORDER BY s.name, ps.id",
        SUPPLIER_COLUMNS
    ))?;
    let links = stmt
        .query_map([project_id], |row| {
            Ok(ProjectSupplierWithSupplier { link: link_at(row, 0)?, supplier: supplier_at(row, 5)? })
        })?
        .collect::<RusqliteResult<Vec<_>>>()?;
    Ok(links)
}

pub fn read_projects_for_supplier(conn: &Connection, supplier_id: i64) -> RusqliteResult<Vec<SupplierContract>> {
    let mut stmt = conn.prepare(
        "SELECT ps.id, ps.project_id, ps.supplier_id, ps.contract_value_pence, ps.created_at, p.title \
         FROM project_suppliers ps JOIN projects p ON p.id = ps.project_id \
         WHERE ps.supplier_id = ?1 ORDER BY p.created_at DESC, p.id DESC",
    )?;
    let contracts = stmt
        .query_map([supplier_id], |row| Ok(SupplierContract { link: link_at(row, 0)?, project_title: row.get(5)? }))?
        .collect::<RusqliteResult<Vec<_>>>()?;
    Ok(contracts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::db_operations::councils_db_operations::create_council;
    use crate::models::db_operations::is_unique_violation;
    use crate::models::db_operations::projects_db_operations::{create_project, delete_project};
    use crate::models::NewProject;
    use crate::setup::db_setup::setup_supplychain_db;
    use std::str::FromStr;

    fn conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_supplychain_db(&mut conn, false).unwrap();
        conn
    }

    fn supplier(name: &str) -> NewSupplier {
        NewSupplier {
            name: name.to_string(),
            contact_person: String::new(),
            contact_email: String::new(),
            phone: String::new(),
            address: String::new(),
            specialty: "Surfacing".to_string(),
        }
    }

    fn project(conn: &Connection) -> i64 {
        let council = create_council(conn, "Leeds", "Clerk", "clerk@leeds.gov.uk", "leeds").unwrap();
        create_project(conn, &NewProject {
            title: "Bridge".into(),
            description: "Repair".into(),
            image: String::new(),
            main_image: String::new(),
            category_id: None,
            budget: 100,
            project_manager: String::new(),
            location: String::new(),
            council_id: council,
        })
        .unwrap()
    }

    #[test]
    fn contract_values_are_rounded_to_pence() {
        assert_eq!(pounds_to_pence(Decimal::from_str("1234.565").unwrap()), Some(123457));
        assert_eq!(pounds_to_pence(Decimal::from_str("10").unwrap()), Some(1000));
        assert_eq!(pence_to_pounds(123457).to_string(), "1234.57");
    }

    #[test]
    fn duplicate_pair_is_rejected_without_touching_the_original() {
        let conn = conn();
        let project = project(&conn);
        let supplier = create_supplier(&conn, &supplier("Acme Paving")).unwrap();

        create_project_supplier(&conn, project, supplier, Some(150_000)).unwrap();
        let err = create_project_supplier(&conn, project, supplier, Some(1)).unwrap_err();
        assert!(is_unique_violation(&err));

        let links = read_suppliers_for_project(&conn, project).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].supplier.name, "Acme Paving");
        assert_eq!(links[0].link.contract_value, Some(Decimal::new(150_000, 2)));
    }

    #[test]
    fn duplicate_supplier_names_are_detected() {
        let conn = conn();
        let id = create_supplier(&conn, &supplier("Acme")).unwrap();
        assert!(supplier_name_taken(&conn, "Acme", None).unwrap());
        assert!(!supplier_name_taken(&conn, "Acme", Some(id)).unwrap());
        let err = create_supplier(&conn, &supplier("Acme")).unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn deleting_either_side_removes_the_link() {
        let conn = conn();
        let project_id = project(&conn);
        let first = create_supplier(&conn, &supplier("First")).unwrap();
        let second = create_supplier(&conn, &supplier("Second")).unwrap();
        create_project_supplier(&conn, project_id, first, None).unwrap();
        create_project_supplier(&conn, project_id, second, None).unwrap();

        delete_supplier(&conn, first).unwrap();
        assert_eq!(read_suppliers_for_project(&conn, project_id).unwrap().len(), 1);

        delete_project(&conn, project_id).unwrap();
        assert!(read_projects_for_supplier(&conn, second).unwrap().is_empty());
    }

    #[test]
    fn unlinking_keeps_both_sides() {
        let conn = conn();
        let project_id = project(&conn);
        let supplier_id = create_supplier(&conn, &supplier("Acme Paving")).unwrap();
        create_project_supplier(&conn, project_id, supplier_id, Some(5_000)).unwrap();

        assert_eq!(delete_project_supplier(&conn, project_id, supplier_id).unwrap(), 1);
        assert!(read_suppliers_for_project(&conn, project_id).unwrap().is_empty());
        assert!(read_supplier(&conn, supplier_id).unwrap().is_some());
        assert_eq!(delete_project_supplier(&conn, project_id, supplier_id).unwrap(), 0);
    }
}
