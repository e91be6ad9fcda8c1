use actix_multipart::Multipart;
use actix_session::Session;
use actix_web::{web, HttpResponse};
use tera::{Context, Tera};

use crate::helper::form_helpers::FormErrors;
use crate::helper::{event_helpers, public_helpers, HelperError};
use crate::middleware::{set_notification, Flash};
use crate::models::form_models::EventForm;
use crate::routes::{base_context, error_response, redirect, render, today};
use crate::{AppState, DbPool};

pub fn config_calendar(cfg: &mut web::ServiceConfig) {
    cfg.route("/calendar/", web::get().to(calendar))
        .route("/events/add/", web::get().to(show_event_form))
        .route("/events/add/", web::post().to(create_event_action))
        .route("/events/{id}/", web::get().to(event_detail))
        .route("/meetings/{id}/", web::get().to(meeting_detail));
}

async fn calendar(tera: web::Data<Tera>, pool: web::Data<DbPool>, flash: Flash) -> HttpResponse {
    match public_helpers::fetch_calendar(&pool, today()) {
        Ok(page) => {
            let mut ctx = base_context(flash);
            ctx.insert("events", &page.events);
            ctx.insert("meetings", &page.meetings);
            render(&tera, "calendar.html", &ctx)
        }
        Err(e) => error_response(&tera, e),
    }
}

fn render_form(tera: &Tera, pool: &DbPool, mut ctx: Context, form: &EventForm, errors: &FormErrors) -> HttpResponse {
    let choices = match event_helpers::fetch_form_choices(pool) {
        Ok(choices) => choices,
        Err(e) => return error_response(tera, e),
    };
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    ctx.insert("councils", &choices.councils);
    ctx.insert("projects", &choices.projects);
    render(tera, "events/form.html", &ctx)
}

async fn show_event_form(tera: web::Data<Tera>, pool: web::Data<DbPool>, flash: Flash) -> HttpResponse {
    render_form(&tera, &pool, base_context(flash), &EventForm::default(), &FormErrors::new())
}

async fn create_event_action(
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    app_state: web::Data<AppState>,
    payload: Multipart,
    flash: Flash,
) -> HttpResponse {
    let submission = match event_helpers::read_event_submission(payload, app_state.max_upload_size_bytes).await {
        Ok(submission) => submission,
        Err(e) => return error_response(&tera, e),
    };
    let form = submission.form.clone();

    match event_helpers::create_event(&pool, &app_state.media_path, submission).await {
        Ok(_) => {
            set_notification(&session, "Event created successfully.", "success");
            redirect("/calendar/")
        }
        Err(HelperError::Validation(errors)) => render_form(&tera, &pool, base_context(flash), &form, &errors),
        Err(e) => error_response(&tera, e),
    }
}

async fn event_detail(tera: web::Data<Tera>, pool: web::Data<DbPool>, path: web::Path<i64>, flash: Flash) -> HttpResponse {
    match event_helpers::fetch_event(&pool, path.into_inner()) {
        Ok(event) => {
            let mut ctx = base_context(flash);
            ctx.insert("display_image", &event.display_image());
            ctx.insert("event", &event);
            render(&tera, "events/detail.html", &ctx)
        }
        Err(e) => error_response(&tera, e),
    }
}

async fn meeting_detail(tera: web::Data<Tera>, pool: web::Data<DbPool>, path: web::Path<i64>, flash: Flash) -> HttpResponse {
    match event_helpers::fetch_meeting(&pool, path.into_inner()) {
        Ok(meeting) => {
            let mut ctx = base_context(flash);
            ctx.insert("meeting", &meeting);
            render(&tera, "meetings/detail.html", &ctx)
        }
        Err(e) => error_response(&tera, e),
    }
}
