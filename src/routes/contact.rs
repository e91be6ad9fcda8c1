use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tera::{Context, Tera};

use crate::helper::contact_helpers;
use crate::helper::form_helpers::{field, parse_form, FormErrors};
use crate::middleware::Flash;
use crate::models::form_models::ContactForm;
use crate::routes::{base_context, not_found, redirect, render};

const SUCCESS_URL: &str = "/contact/success/";

/// Slug, heading and summary of each service landing page.
const SERVICES: &[(&str, &str, &str)] = &[
    ("planning", "Planning & Zoning", "Planning applications, zoning enquiries and building control."),
    ("waste", "Waste & Recycling", "Bin collections, recycling centres and bulky waste pickups."),
    ("taxation", "Taxation & Rates", "Council tax bands, business rates and payment arrangements."),
    ("licenses", "Licences & Permits", "Premises, street trading and event licences."),
];

#[derive(Deserialize)]
struct ServiceQuery {
    service: Option<String>,
}

pub fn config_contact(cfg: &mut web::ServiceConfig) {
    cfg.route("/contact/", web::get().to(show_contact_form))
        .route("/contact/", web::post().to(contact_action))
        .route("/contact/success/", web::get().to(contact_success))
        .route("/services/request/", web::get().to(show_service_request_form))
        .route("/services/request/", web::post().to(service_request_action))
        .route("/services/{service}/", web::get().to(show_service_page))
        .route("/services/{service}/", web::post().to(service_page_action));
}

fn with_form(mut ctx: Context, form: &ContactForm, errors: &FormErrors) -> Context {
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    ctx
}

async fn show_contact_form(tera: web::Data<Tera>, flash: Flash) -> HttpResponse {
    let ctx = with_form(base_context(flash), &ContactForm::default(), &FormErrors::new());
    render(&tera, "contact.html", &ctx)
}

async fn contact_action(tera: web::Data<Tera>, body: web::Bytes, flash: Flash) -> HttpResponse {
    let fields = match parse_form(&body) {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let form = ContactForm::from_fields(&fields);
    match form.validate() {
        Ok(message) => {
            contact_helpers::submit_contact_message(&message);
            redirect(SUCCESS_URL)
        }
        Err(errors) => render(&tera, "contact.html", &with_form(base_context(flash), &form, &errors)),
    }
}

async fn contact_success(tera: web::Data<Tera>, flash: Flash) -> HttpResponse {
    render(&tera, "contact_success.html", &base_context(flash))
}

fn service_context(ctx: Context, slug: &str, form: &ContactForm, errors: &FormErrors) -> Option<Context> {
    let (slug, heading, summary) = SERVICES.iter().find(|(s, _, _)| *s == slug)?;
    let mut ctx = with_form(ctx, form, errors);
    ctx.insert("service", slug);
    ctx.insert("heading", heading);
    ctx.insert("summary", summary);
    Some(ctx)
}

async fn show_service_page(tera: web::Data<Tera>, path: web::Path<String>, flash: Flash) -> HttpResponse {
    match service_context(base_context(flash), &path, &ContactForm::default(), &FormErrors::new()) {
        Some(ctx) => render(&tera, "services/landing.html", &ctx),
        None => not_found(&tera),
    }
}

async fn service_page_action(tera: web::Data<Tera>, path: web::Path<String>, body: web::Bytes, flash: Flash) -> HttpResponse {
    if !SERVICES.iter().any(|(slug, _, _)| *slug == path.as_str()) {
        return not_found(&tera);
    }
    let fields = match parse_form(&body) {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let form = ContactForm::from_fields(&fields);
    match form.validate() {
        Ok(message) => {
            contact_helpers::submit_service_request(&path, &message);
            redirect(SUCCESS_URL)
        }
        Err(errors) => match service_context(base_context(flash), &path, &form, &errors) {
            Some(ctx) => render(&tera, "services/landing.html", &ctx),
            None => not_found(&tera),
        },
    }
}

async fn show_service_request_form(tera: web::Data<Tera>, query: web::Query<ServiceQuery>, flash: Flash) -> HttpResponse {
    let service = query.service.as_deref().map(str::trim).unwrap_or_default();
    let form = if service.is_empty() { ContactForm::default() } else { ContactForm::for_service(service) };
    let mut ctx = with_form(base_context(flash), &form, &FormErrors::new());
    ctx.insert("service", service);
    render(&tera, "service_request_form.html", &ctx)
}

async fn service_request_action(tera: web::Data<Tera>, body: web::Bytes, flash: Flash) -> HttpResponse {
    let fields = match parse_form(&body) {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let service = field(&fields, "service");
    let form = ContactForm::from_fields(&fields);
    match form.validate() {
        Ok(message) => {
            contact_helpers::submit_service_request(&service, &message);
            redirect(SUCCESS_URL)
        }
        Err(errors) => {
            let mut ctx = with_form(base_context(flash), &form, &errors);
            ctx.insert("service", &service);
            render(&tera, "service_request_form.html", &ctx)
        }
    }
}
