use actix_web::{web, HttpResponse};
use chrono::{Local, NaiveDate};
use tera::{Context, Tera};

use crate::helper::HelperError;
use crate::middleware::Flash;

pub mod contact;
pub mod events;
pub mod projects;
pub mod public;
pub mod suppliers;

/// Registers every page of the site. Session middleware must wrap these.
pub fn config_site(cfg: &mut web::ServiceConfig) {
    cfg.configure(public::config_public)
        .configure(projects::config_projects)
        .configure(suppliers::config_suppliers)
        .configure(events::config_calendar)
        .configure(contact::config_contact);
}

/// Context every page starts from: the pending flash notification, if any.
pub(crate) fn base_context(flash: Flash) -> Context {
    let mut ctx = Context::new();
    if let Some(notification) = flash.0 {
        ctx.insert("notification", &notification);
    }
    ctx
}

pub(crate) fn render(tera: &Tera, template: &str, ctx: &Context) -> HttpResponse {
    match tera.render(template, ctx) {
        Ok(rendered) => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(rendered),
        Err(e) => {
            log::error!("Failed to render template '{}': {:?}", template, e);
            HttpResponse::InternalServerError().body("Template error")
        }
    }
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found().append_header(("location", location)).finish()
}

pub(crate) fn not_found(tera: &Tera) -> HttpResponse {
    match tera.render("errors/404.html", &Context::new()) {
        Ok(rendered) => HttpResponse::NotFound().content_type("text/html; charset=utf-8").body(rendered),
        Err(_) => HttpResponse::NotFound().body("Not found"),
    }
}

/// Response for helper failures a handler does not treat specially.
pub(crate) fn error_response(tera: &Tera, err: HelperError) -> HttpResponse {
    match err {
        HelperError::NotFound => not_found(tera),
        HelperError::Upload(message) => HttpResponse::BadRequest().body(message),
        other => {
            log::error!("Request failed: {}", other);
            HttpResponse::InternalServerError().body("Internal server error")
        }
    }
}

/// Default service for unmatched paths.
pub async fn page_not_found(tera: web::Data<Tera>) -> HttpResponse {
    not_found(&tera)
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}
