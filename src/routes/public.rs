use actix_web::{web, HttpResponse, Responder};
use tera::Tera;

use crate::helper::{cost_of_living_helpers, public_helpers};
use crate::middleware::Flash;
use crate::routes::{base_context, error_response, render, today};
use crate::{AppState, DbPool};

pub fn config_public(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home))
        .route("/about/", web::get().to(about))
        .route("/cost-of-living/", web::get().to(cost_of_living))
        .service(web::scope("/api").route("/is_server_active", web::get().to(is_server_active)));
}

async fn is_server_active() -> impl Responder {
    HttpResponse::Ok().body("active")
}

async fn home(tera: web::Data<Tera>, pool: web::Data<DbPool>, flash: Flash) -> HttpResponse {
    match public_helpers::fetch_home_page(&pool, today()) {
        Ok(page) => {
            let mut ctx = base_context(flash);
            ctx.insert("projects", &page.projects);
            ctx.insert("meetings", &page.meetings);
            ctx.insert("news", &page.news);
            ctx.insert("community", &page.community);
            render(&tera, "home.html", &ctx)
        }
        Err(e) => error_response(&tera, e),
    }
}

async fn about(tera: web::Data<Tera>, flash: Flash) -> HttpResponse {
    render(&tera, "about.html", &base_context(flash))
}

async fn cost_of_living(tera: web::Data<Tera>, app_state: web::Data<AppState>, flash: Flash) -> HttpResponse {
    let path = app_state.cost_of_living_csv.clone();
    let areas = match web::block(move || cost_of_living_helpers::load_areas(&path)).await {
        Ok(areas) => areas,
        Err(e) => {
            log::error!("Cost of living loader failed: {}", e);
            Vec::new()
        }
    };
    let mut ctx = base_context(flash);
    ctx.insert("areas", &areas);
    render(&tera, "cost_of_living.html", &ctx)
}
