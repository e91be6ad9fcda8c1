use rusqlite::Connection;
use serde::Serialize;

use crate::helper::form_helpers::{FormErrors, INVALID_CHOICE};
use crate::helper::{ensure_valid, get_conn, HelperError};
use crate::models::db_operations::{councils_db_operations, is_unique_violation, projects_db_operations, suppliers_db_operations};
use crate::models::form_models::{ContractForm, ProjectForm};
use crate::models::project_filter::{PageInfo, ProjectFilter};
use crate::models::{
    Category, ContractorRequirement, Council, NewProject, ProjectListing, ProjectSupplierWithSupplier, Supplier,
};
use crate::DbPool;

#[derive(Debug, Serialize)]
pub struct ProjectPage {
    pub projects: Vec<ProjectListing>,
    pub page: PageInfo,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    pub listing: ProjectListing,
    pub suppliers: Vec<ProjectSupplierWithSupplier>,
    pub requirements: Vec<ContractorRequirement>,
    /// Suppliers not yet linked, offered by the "add supplier" form.
    pub available_suppliers: Vec<Supplier>,
}

#[derive(Debug, Serialize)]
pub struct ProjectFormChoices {
    pub councils: Vec<Council>,
    pub categories: Vec<Category>,
}

pub fn list_projects(pool: &DbPool, filter: &ProjectFilter) -> Result<ProjectPage, HelperError> {
    let conn = get_conn(pool)?;
    let total = projects_db_operations::count_filtered_projects(&conn, filter)?;
    let projects = projects_db_operations::read_filtered_projects(&conn, filter)?;
    Ok(ProjectPage { projects, page: PageInfo::new(filter.page, total) })
}

pub fn fetch_project(pool: &DbPool, id: i64) -> Result<ProjectListing, HelperError> {
    let conn = get_conn(pool)?;
    projects_db_operations::read_project(&conn, id)?.ok_or(HelperError::NotFound)
}

pub fn fetch_project_detail(pool: &DbPool, id: i64) -> Result<ProjectDetail, HelperError> {
    let conn = get_conn(pool)?;
    let listing = projects_db_operations::read_project(&conn, id)?.ok_or(HelperError::NotFound)?;
    let suppliers = suppliers_db_operations::read_suppliers_for_project(&conn, id)?;
    let requirements = projects_db_operations::read_requirements_for_project(&conn, id)?;
    let available_suppliers = suppliers_db_operations::read_all_suppliers(&conn)?
        .into_iter()
        .filter(|s| !suppliers.iter().any(|linked| linked.supplier.id == s.id))
        .collect();
    Ok(ProjectDetail { listing, suppliers, requirements, available_suppliers })
}

pub fn fetch_form_choices(pool: &DbPool) -> Result<ProjectFormChoices, HelperError> {
    let conn = get_conn(pool)?;
    Ok(ProjectFormChoices {
        councils: councils_db_operations::read_all_councils(&conn)?,
        categories: councils_db_operations::read_all_categories(&conn)?,
    })
}

fn check_references(conn: &Connection, new: &NewProject, errors: &mut FormErrors) -> Result<(), HelperError> {
    if !errors.has("council") && !councils_db_operations::council_exists(conn, new.council_id)? {
        errors.add("council", INVALID_CHOICE);
    }
    if let Some(category_id) = new.category_id {
        if !errors.has("category") && !councils_db_operations::category_exists(conn, category_id)? {
            errors.add("category", INVALID_CHOICE);
        }
    }
    Ok(())
}

/// Returns the new project's id.
pub fn create_project(pool: &DbPool, form: &ProjectForm) -> Result<i64, HelperError> {
    let conn = get_conn(pool)?;
    let mut errors = FormErrors::new();
    let new = form.clean(&mut errors);
    check_references(&conn, &new, &mut errors)?;
    ensure_valid(errors)?;

    let id = projects_db_operations::create_project(&conn, &new)?;
    log::info!("Created project {} '{}'", id, new.title);
    Ok(id)
}

pub fn update_project(pool: &DbPool, id: i64, form: &ProjectForm) -> Result<(), HelperError> {
    let conn = get_conn(pool)?;
    if !projects_db_operations::project_exists(&conn, id)? {
        return Err(HelperError::NotFound);
    }
    let mut errors = FormErrors::new();
    let new = form.clean(&mut errors);
    check_references(&conn, &new, &mut errors)?;
    ensure_valid(errors)?;

    projects_db_operations::update_project(&conn, id, &new)?;
    Ok(())
}

/// Deletes the project and returns its title. Supplier links and
/// requirements go with it; linked events keep existing without a project.
pub fn delete_project(pool: &DbPool, id: i64) -> Result<String, HelperError> {
    let conn = get_conn(pool)?;
    let listing = projects_db_operations::read_project(&conn, id)?.ok_or(HelperError::NotFound)?;
    projects_db_operations::delete_project(&conn, id)?;
    log::info!("Deleted project {} '{}'", id, listing.project.title);
    Ok(listing.project.title)
}

/// Links a supplier to a project and returns the supplier's name. Linking
/// the same supplier twice is reported as `Duplicate` and changes nothing.
pub fn add_supplier_to_project(pool: &DbPool, project_id: i64, form: &ContractForm) -> Result<String, HelperError> {
    let conn = get_conn(pool)?;
    if !projects_db_operations::project_exists(&conn, project_id)? {
        return Err(HelperError::NotFound);
    }

    let mut errors = FormErrors::new();
    let (supplier_id, value) = form.clean(&mut errors);
    let supplier = if errors.has("supplier") {
        None
    } else {
        suppliers_db_operations::read_supplier(&conn, supplier_id)?
    };
    if supplier.is_none() && !errors.has("supplier") {
        errors.add("supplier", INVALID_CHOICE);
    }
    ensure_valid(errors)?;
    let supplier = supplier.ok_or(HelperError::NotFound)?;

    let pence = value.and_then(suppliers_db_operations::pounds_to_pence);
    match suppliers_db_operations::create_project_supplier(&conn, project_id, supplier.id, pence) {
        Ok(_) => Ok(supplier.name),
        Err(e) if is_unique_violation(&e) => {
            log::warn!("Supplier {} is already linked to project {}", supplier.id, project_id);
            Err(HelperError::Duplicate(format!("'{}' is already a supplier on this project.", supplier.name)))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn remove_supplier_from_project(pool: &DbPool, project_id: i64, supplier_id: i64) -> Result<(), HelperError> {
    let conn = get_conn(pool)?;
    match suppliers_db_operations::delete_project_supplier(&conn, project_id, supplier_id)? {
        0 => Err(HelperError::NotFound),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::form_helpers::FormFields;
    use crate::models::NewSupplier;
    use crate::setup::db_setup::memory_pool;
    use rust_decimal::Decimal;

    fn fields(pairs: &[(&str, &str)]) -> FormFields {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn seed(pool: &DbPool) -> (i64, i64) {
        let conn = pool.get().unwrap();
        let council = councils_db_operations::create_council(&conn, "Leeds", "Clerk", "clerk@leeds.gov.uk", "leeds").unwrap();
        let supplier = suppliers_db_operations::create_supplier(&conn, &NewSupplier {
            name: "Acme Civil".into(),
            contact_person: String::new(),
            contact_email: String::new(),
            phone: String::new(),
            address: String::new(),
            specialty: String::new(),
        })
        .unwrap();
        (council, supplier)
    }

    fn project_form(council: i64) -> ProjectForm {
        ProjectForm::from_fields(&fields(&[
            ("title", "Bridge repair"),
            ("description", "Replace the deck"),
            ("budget", "150000"),
            ("council", &council.to_string()),
        ]))
    }

    #[test]
    fn unknown_council_is_a_field_error() {
        let pool = memory_pool().unwrap();
        match create_project(&pool, &project_form(42)) {
            Err(HelperError::Validation(errors)) => assert_eq!(errors.messages("council"), [INVALID_CHOICE.to_string()]),
            other => panic!("expected a validation error, got {:?}", other),
        }
        assert_eq!(list_projects(&pool, &ProjectFilter::default()).unwrap().page.total_items, 0);
    }

    #[test]
    fn duplicate_contract_leaves_the_first_intact() {
        let pool = memory_pool().unwrap();
        let (council, supplier) = seed(&pool);
        let project = create_project(&pool, &project_form(council)).unwrap();

        let first = ContractForm::from_fields(&fields(&[("supplier", &supplier.to_string()), ("contract_value", "1200.50")]));
        assert_eq!(add_supplier_to_project(&pool, project, &first).unwrap(), "Acme Civil");

        let second = ContractForm::from_fields(&fields(&[("supplier", &supplier.to_string()), ("contract_value", "99")]));
        assert!(matches!(add_supplier_to_project(&pool, project, &second), Err(HelperError::Duplicate(_))));

        let detail = fetch_project_detail(&pool, project).unwrap();
        assert_eq!(detail.suppliers.len(), 1);
        assert_eq!(detail.suppliers[0].link.contract_value, Some(Decimal::new(120_050, 2)));
        assert!(detail.available_suppliers.is_empty());
    }

    #[test]
    fn missing_records_are_not_found() {
        let pool = memory_pool().unwrap();
        let (council, _) = seed(&pool);
        assert!(matches!(update_project(&pool, 999, &project_form(council)), Err(HelperError::NotFound)));
        assert!(matches!(delete_project(&pool, 999), Err(HelperError::NotFound)));
        assert!(matches!(fetch_project_detail(&pool, 999), Err(HelperError::NotFound)));
        assert!(matches!(remove_supplier_from_project(&pool, 999, 1), Err(HelperError::NotFound)));
    }

    #[test]
    fn delete_returns_the_title() {
        let pool = memory_pool().unwrap();
        let (council, _) = seed(&pool);
        let id = create_project(&pool, &project_form(council)).unwrap();
        assert_eq!(delete_project(&pool, id).unwrap(), "Bridge repair");
        assert!(matches!(fetch_project(&pool, id), Err(HelperError::NotFound)));
    }
}
