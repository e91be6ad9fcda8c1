use actix_session::Session;
use actix_web::{web, HttpResponse};
use tera::{Context, Tera};
use url::form_urlencoded;

use crate::helper::form_helpers::{parse_form, FormErrors};
use crate::helper::{project_helpers, HelperError};
use crate::middleware::{set_notification, Flash};
use crate::models::form_models::{ContractForm, ProjectForm};
use crate::models::project_filter::{ProjectFilter, ProjectListQuery};
use crate::routes::{base_context, error_response, redirect, render};
use crate::{AppState, DbPool};

pub fn config_projects(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/projects")
            .route("/", web::get().to(list_projects))
            .route("/add/", web::get().to(show_create_form))
            .route("/add/", web::post().to(create_project_action))
            .route("/{id}/", web::get().to(project_detail))
            .route("/{id}/edit/", web::get().to(show_edit_form))
            .route("/{id}/edit/", web::post().to(update_project_action))
            .route("/{id}/delete/", web::get().to(confirm_delete))
            .route("/{id}/delete/", web::post().to(delete_project_action))
            .route("/{id}/suppliers/", web::post().to(add_supplier_action))
            .route("/{id}/suppliers/{supplier_id}/remove/", web::post().to(remove_supplier_action)),
    );
}

/// The active filters as a query string without `page`, for pagination links.
fn filter_query_string(query: &ProjectListQuery) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let params = [
        ("q", &query.q),
        ("min_budget", &query.min_budget),
        ("max_budget", &query.max_budget),
        ("start_date", &query.start_date),
        ("end_date", &query.end_date),
    ];
    for (name, value) in params {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            serializer.append_pair(name, value);
        }
    }
    serializer.finish()
}

async fn list_projects(
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    app_state: web::Data<AppState>,
    query: web::Query<ProjectListQuery>,
    flash: Flash,
) -> HttpResponse {
    let filter = match ProjectFilter::from_query(&query, app_state.filter_policy) {
        Ok(filter) => filter,
        Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
    };

    match project_helpers::list_projects(&pool, &filter) {
        Ok(page) => {
            let mut ctx = base_context(flash);
            ctx.insert("projects", &page.projects);
            ctx.insert("page", &page.page);
            ctx.insert("filter_query", &filter_query_string(&query));
            ctx.insert("query", &query.into_inner());
            render(&tera, "projects/list.html", &ctx)
        }
        Err(e) => error_response(&tera, e),
    }
}

fn render_form(
    tera: &Tera,
    pool: &DbPool,
    mut ctx: Context,
    form: &ProjectForm,
    errors: &FormErrors,
    project_id: Option<i64>,
) -> HttpResponse {
    let choices = match project_helpers::fetch_form_choices(pool) {
        Ok(choices) => choices,
        Err(e) => return error_response(tera, e),
    };
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    ctx.insert("councils", &choices.councils);
    ctx.insert("categories", &choices.categories);
    ctx.insert("project_id", &project_id);
    render(tera, "projects/form.html", &ctx)
}

async fn show_create_form(tera: web::Data<Tera>, pool: web::Data<DbPool>, flash: Flash) -> HttpResponse {
    render_form(&tera, &pool, base_context(flash), &ProjectForm::default(), &FormErrors::new(), None)
}

async fn create_project_action(
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
    let form = ProjectForm::from_fields(&fields);

    match project_helpers::create_project(&pool, &form) {
        Ok(_) => {
            set_notification(&session, &format!("Project '{}' was created successfully.", form.title), "success");
            redirect("/projects/")
        }
        Err(HelperError::Validation(errors)) => render_form(&tera, &pool, base_context(flash), &form, &errors, None),
        Err(e) => error_response(&tera, e),
    }
}

async fn project_detail(
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    flash: Flash,
) -> HttpResponse {
    match project_helpers::fetch_project_detail(&pool, path.into_inner()) {
        Ok(detail) => {
            let mut ctx = base_context(flash);
            ctx.insert("listing", &detail.listing);
            ctx.insert("project", &detail.listing.project);
            ctx.insert("suppliers", &detail.suppliers);
            ctx.insert("requirements", &detail.requirements);
            ctx.insert("available_suppliers", &detail.available_suppliers);
            ctx.insert("contract_form", &ContractForm::default());
            render(&tera, "projects/detail.html", &ctx)
        }
        Err(e) => error_response(&tera, e),
    }
}

async fn show_edit_form(
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    flash: Flash,
) -> HttpResponse {
    let id = path.into_inner();
    match project_helpers::fetch_project(&pool, id) {
        Ok(listing) => {
            let form = ProjectForm::from_project(&listing.project);
            render_form(&tera, &pool, base_context(flash), &form, &FormErrors::new(), Some(id))
        }
        Err(e) => error_response(&tera, e),
    }
}

async fn update_project_action(
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
    let form = ProjectForm::from_fields(&fields);

    match project_helpers::update_project(&pool, id, &form) {
        Ok(()) => {
            set_notification(&session, &format!("Project '{}' was updated successfully.", form.title), "success");
            redirect("/projects/")
        }
        Err(HelperError::Validation(errors)) => render_form(&tera, &pool, base_context(flash), &form, &errors, Some(id)),
        Err(e) => error_response(&tera, e),
    }
}

async fn confirm_delete(
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    flash: Flash,
) -> HttpResponse {
    match project_helpers::fetch_project(&pool, path.into_inner()) {
        Ok(listing) => {
            let mut ctx = base_context(flash);
            ctx.insert("project", &listing.project);
            render(&tera, "projects/confirm_delete.html", &ctx)
        }
        Err(e) => error_response(&tera, e),
    }
}

async fn delete_project_action(
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
) -> HttpResponse {
    match project_helpers::delete_project(&pool, path.into_inner()) {
        Ok(title) => {
            set_notification(&session, &format!("Project '{}' was deleted.", title), "success");
            redirect("/projects/")
        }
        Err(e) => error_response(&tera, e),
    }
}

async fn add_supplier_action(
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    body: web::Bytes,
) -> HttpResponse {
    let project_id = path.into_inner();
    let detail_url = format!("/projects/{}/", project_id);
    let fields = match parse_form(&body) {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let form = ContractForm::from_fields(&fields);

    match project_helpers::add_supplier_to_project(&pool, project_id, &form) {
        Ok(name) => {
            set_notification(&session, &format!("Supplier '{}' was added to the project.", name), "success");
            redirect(&detail_url)
        }
        Err(HelperError::Duplicate(message)) => {
            set_notification(&session, &message, "error");
            redirect(&detail_url)
        }
        Err(HelperError::Validation(errors)) => {
            let message = ["supplier", "contract_value"]
                .iter()
                .flat_map(|name| errors.messages(name).iter().cloned())
                .collect::<Vec<_>>()
                .join(" ");
            set_notification(&session, &message, "error");
            redirect(&detail_url)
        }
        Err(e) => error_response(&tera, e),
    }
}

async fn remove_supplier_action(
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    path: web::Path<(i64, i64)>,
) -> HttpResponse {
    let (project_id, supplier_id) = path.into_inner();
    match project_helpers::remove_supplier_from_project(&pool, project_id, supplier_id) {
        Ok(()) => {
            set_notification(&session, "Supplier was removed from the project.", "success");
            redirect(&format!("/projects/{}/", project_id))
        }
        Err(e) => error_response(&tera, e),
    }
}
