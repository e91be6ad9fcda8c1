use actix_session::Session;
use actix_web::{web, HttpResponse};
use tera::{Context, Tera};

use crate::helper::form_helpers::{parse_form, FormErrors};
use crate::helper::{supplier_helpers, HelperError};
use crate::middleware::{set_notification, Flash};
use crate::models::form_models::SupplierForm;
use crate::routes::{base_context, error_response, redirect, render};
use crate::DbPool;

pub fn config_suppliers(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/suppliers")
            .route("/", web::get().to(list_suppliers))
            .route("/add/", web::get().to(show_create_form))
            .route("/add/", web::post().to(create_supplier_action))
            .route("/{id}/", web::get().to(supplier_detail))
            .route("/{id}/edit/", web::get().to(show_edit_form))
            .route("/{id}/edit/", web::post().to(update_supplier_action))
            .route("/{id}/delete/", web::get().to(confirm_delete))
            .route("/{id}/delete/", web::post().to(delete_supplier_action)),
    );
}

fn render_form(tera: &Tera, mut ctx: Context, form: &SupplierForm, errors: &FormErrors, supplier_id: Option<i64>) -> HttpResponse {
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    ctx.insert("supplier_id", &supplier_id);
    render(tera, "suppliers/form.html", &ctx)
}

async fn list_suppliers(tera: web::Data<Tera>, pool: web::Data<DbPool>, flash: Flash) -> HttpResponse {
    match supplier_helpers::list_suppliers(&pool) {
        Ok(suppliers) => {
            let mut ctx = base_context(flash);
            ctx.insert("suppliers", &suppliers);
            render(&tera, "suppliers/list.html", &ctx)
        }
        Err(e) => error_response(&tera, e),
    }
}

async fn show_create_form(tera: web::Data<Tera>, flash: Flash) -> HttpResponse {
    render_form(&tera, base_context(flash), &SupplierForm::default(), &FormErrors::new(), None)
}

async fn create_supplier_action(
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    body: web::Bytes,
    flash: Flash,
) -> HttpResponse {
    let fields = match parse_form(&body) {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let form = SupplierForm::from_fields(&fields);

    match supplier_helpers::create_supplier(&pool, &form) {
        Ok(_) => {
            set_notification(&session, &format!("Supplier '{}' was created successfully.", form.name), "success");
            redirect("/suppliers/")
        }
        Err(HelperError::Validation(errors)) => render_form(&tera, base_context(flash), &form, &errors, None),
        Err(e) => error_response(&tera, e),
    }
}

async fn supplier_detail(tera: web::Data<Tera>, pool: web::Data<DbPool>, path: web::Path<i64>, flash: Flash) -> HttpResponse {
    match supplier_helpers::fetch_supplier_detail(&pool, path.into_inner()) {
        Ok(detail) => {
            let mut ctx = base_context(flash);
            ctx.insert("supplier", &detail.supplier);
            ctx.insert("contracts", &detail.contracts);
            render(&tera, "suppliers/detail.html", &ctx)
        }
        Err(e) => error_response(&tera, e),
    }
}

async fn show_edit_form(tera: web::Data<Tera>, pool: web::Data<DbPool>, path: web::Path<i64>, flash: Flash) -> HttpResponse {
    let id = path.into_inner();
    match supplier_helpers::fetch_supplier(&pool, id) {
        Ok(supplier) => render_form(&tera, base_context(flash), &SupplierForm::from_supplier(&supplier), &FormErrors::new(), Some(id)),
        Err(e) => error_response(&tera, e),
    }
}

async fn update_supplier_action(
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    body: web::Bytes,
    flash: Flash,
) -> HttpResponse {
    let id = path.into_inner();
    let fields = match parse_form(&body) {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let form = SupplierForm::from_fields(&fields);

    match supplier_helpers::update_supplier(&pool, id, &form) {
        Ok(()) => {
            set_notification(&session, &format!("Supplier '{}' was updated successfully.", form.name), "success");
            redirect("/suppliers/")
        }
        Err(HelperError::Validation(errors)) => render_form(&tera, base_context(flash), &form, &errors, Some(id)),
        Err(e) => error_response(&tera, e),
    }
}

async fn confirm_delete(tera: web::Data<Tera>, pool: web::Data<DbPool>, path: web::Path<i64>, flash: Flash) -> HttpResponse {
    match supplier_helpers::fetch_supplier(&pool, path.into_inner()) {
        Ok(supplier) => {
            let mut ctx = base_context(flash);
            ctx.insert("supplier", &supplier);
            render(&tera, "suppliers/confirm_delete.html", &ctx)
        }
        Err(e) => error_response(&tera, e),
    }
}

async fn delete_supplier_action(
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
) -> HttpResponse {
    match supplier_helpers::delete_supplier(&pool, path.into_inner()) {
        Ok(name) => {
            set_notification(&session, &format!("Supplier '{}' was deleted.", name), "success");
            redirect("/suppliers/")
        }
        Err(e) => error_response(&tera, e),
    }
}
