use serde::Serialize;

use crate::helper::form_helpers::FormErrors;
use crate::helper::{ensure_valid, get_conn, HelperError};
use crate::models::db_operations::{is_unique_violation, suppliers_db_operations};
use crate::models::form_models::SupplierForm;
use crate::models::{Supplier, SupplierContract};
use crate::DbPool;

pub const NAME_TAKEN: &str = "A supplier with this name already exists.";

#[derive(Debug, Serialize)]
pub struct SupplierDetail {
    pub supplier: Supplier,
    pub contracts: Vec<SupplierContract>,
}

fn name_taken_error() -> HelperError {
    let mut errors = FormErrors::new();
    errors.add("name", NAME_TAKEN);
    HelperError::Validation(errors)
}

pub fn list_suppliers(pool: &DbPool) -> Result<Vec<Supplier>, HelperError> {
    let conn = get_conn(pool)?;
    Ok(suppliers_db_operations::read_all_suppliers(&conn)?)
}

pub fn fetch_supplier(pool: &DbPool, id: i64) -> Result<Supplier, HelperError> {
    let conn = get_conn(pool)?;
    suppliers_db_operations::read_supplier(&conn, id)?.ok_or(HelperError::NotFound)
}

pub fn fetch_supplier_detail(pool: &DbPool, id: i64) -> Result<SupplierDetail, HelperError> {
    let conn = get_conn(pool)?;
    let supplier = suppliers_db_operations::read_supplier(&conn, id)?.ok_or(HelperError::NotFound)?;
    let contracts = suppliers_db_operations::read_projects_for_supplier(&conn, id)?;
    Ok(SupplierDetail { supplier, contracts })
}

pub fn create_supplier(pool: &DbPool, form: &SupplierForm) -> Result<i64, HelperError> {
    let conn = get_conn(pool)?;
    let mut errors = FormErrors::new();
    let new = form.clean(&mut errors);
    if !errors.has("name") && suppliers_db_operations::supplier_name_taken(&conn, &new.name, None)? {
        errors.add("name", NAME_TAKEN);
    }
    ensure_valid(errors)?;

    // A concurrent insert of the same name still trips the UNIQUE constraint.
    let id = suppliers_db_operations::create_supplier(&conn, &new).map_err(|e| {
        if is_unique_violation(&e) { name_taken_error() } else { e.into() }
    })?;
    log::info!("Created supplier {} '{}'", id, new.name);
    Ok(id)
}

pub fn update_supplier(pool: &DbPool, id: i64, form: &SupplierForm) -> Result<(), HelperError> {
    let conn = get_conn(pool)?;
    if !suppliers_db_operations::supplier_exists(&conn, id)? {
        return Err(HelperError::NotFound);
    }
    let mut errors = FormErrors::new();
    let new = form.clean(&mut errors);
    if !errors.has("name") && suppliers_db_operations::supplier_name_taken(&conn, &new.name, Some(id))? {
        errors.add("name", NAME_TAKEN);
    }
    ensure_valid(errors)?;

    suppliers_db_operations::update_supplier(&conn, id, &new).map_err(|e| {
        if is_unique_violation(&e) { name_taken_error() } else { e.into() }
    })?;
    Ok(())
}

/// Deletes the supplier and its project links, returning its name.
pub fn delete_supplier(pool: &DbPool, id: i64) -> Result<String, HelperError> {
    let conn = get_conn(pool)?;
    let supplier = suppliers_db_operations::read_supplier(&conn, id)?.ok_or(HelperError::NotFound)?;
    suppliers_db_operations::delete_supplier(&conn, id)?;
    log::info!("Deleted supplier {} '{}'", id, supplier.name);
    Ok(supplier.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::form_helpers::FormFields;
    use crate::setup::db_setup::memory_pool;

    fn form(name: &str) -> SupplierForm {
        let fields: FormFields = [("name", name), ("contact_email", "ops@example.org")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SupplierForm::from_fields(&fields)
    }

    #[test]
    fn duplicate_names_are_rejected_on_create_and_update() {
        let pool = memory_pool().unwrap();
        let first = create_supplier(&pool, &form("Acme Civil")).unwrap();
        let second = create_supplier(&pool, &form("Northern Paving")).unwrap();

        match create_supplier(&pool, &form("Acme Civil")) {
            Err(HelperError::Validation(errors)) => assert_eq!(errors.messages("name"), [NAME_TAKEN.to_string()]),
            other => panic!("expected a validation error, got {:?}", other),
        }
        assert!(matches!(update_supplier(&pool, second, &form("Acme Civil")), Err(HelperError::Validation(_))));

        // Keeping its own name is fine.
        update_supplier(&pool, first, &form("Acme Civil")).unwrap();
        assert_eq!(list_suppliers(&pool).unwrap().len(), 2);
    }

    #[test]
    fn detail_and_delete_of_unknown_supplier() {
        let pool = memory_pool().unwrap();
        assert!(matches!(fetch_supplier_detail(&pool, 5), Err(HelperError::NotFound)));
        assert!(matches!(delete_supplier(&pool, 5), Err(HelperError::NotFound)));

        let id = create_supplier(&pool, &form("Acme Civil")).unwrap();
        let detail = fetch_supplier_detail(&pool, id).unwrap();
        assert!(detail.contracts.is_empty());
        assert_eq!(delete_supplier(&pool, id).unwrap(), "Acme Civil");
    }
}
