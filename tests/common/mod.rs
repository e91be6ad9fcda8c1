#![allow(dead_code)]

use std::path::PathBuf;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::test;
use chrono::{DateTime, Utc};
use rusqlite::params;
use supplychain_backend::models::db_operations::{councils_db_operations, projects_db_operations, suppliers_db_operations};
use supplychain_backend::models::project_filter::FilterPolicy;
use supplychain_backend::models::{NewProject, NewSupplier};
use supplychain_backend::setup::db_setup::memory_pool;
use supplychain_backend::{AppState, DbPool};
use tempfile::TempDir;
use tera::Tera;

pub struct TestEnv {
    pub pool: DbPool,
    pub tera: Tera,
    pub state: AppState,
    pub media: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_policy(FilterPolicy::Permissive)
    }

    pub fn with_policy(filter_policy: FilterPolicy) -> Self {
        let media = tempfile::tempdir().expect("temp media dir");
        let tera = Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*.html")).expect("templates");
        let state = AppState {
            filter_policy,
            media_path: media.path().to_path_buf(),
            max_upload_size_bytes: 1024 * 1024,
            cost_of_living_csv: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/data/cost_of_living_rents.csv")),
        };
        TestEnv { pool: memory_pool().expect("memory pool"), tera, state, media }
    }

    pub fn seed_council(&self, name: &str) -> i64 {
        let conn = self.pool.get().unwrap();
        councils_db_operations::create_council(&conn, name, "Clerk", "clerk@example.gov.uk", &name.to_lowercase()).unwrap()
    }

    pub fn seed_category(&self, name: &str) -> i64 {
        let conn = self.pool.get().unwrap();
        councils_db_operations::create_category(&conn, name, "").unwrap()
    }

    pub fn seed_project(&self, council_id: i64, title: &str, description: &str, budget: i64, category_id: Option<i64>) -> i64 {
        let conn = self.pool.get().unwrap();
        projects_db_operations::create_project(&conn, &NewProject {
            title: title.into(),
            description: description.into(),
            image: String::new(),
            main_image: String::new(),
            category_id,
            budget,
            project_manager: String::new(),
            location: String::new(),
            council_id,
        })
        .unwrap()
    }

    pub fn set_created_at(&self, project_id: i64, created_at: DateTime<Utc>) {
        let conn = self.pool.get().unwrap();
        conn.execute("UPDATE projects SET created_at = ?1 WHERE id = ?2", params![created_at, project_id]).unwrap();
    }

    pub fn seed_supplier(&self, name: &str) -> i64 {
        let conn = self.pool.get().unwrap();
        suppliers_db_operations::create_supplier(&conn, &NewSupplier {
            name: name.into(),
            contact_person: String::new(),
            contact_email: String::new(),
            phone: String::new(),
            address: String::new(),
            specialty: "Civil engineering".into(),
        })
        .unwrap()
    }
}

/// Builds the site the way the server does, minus static files and CORS.
macro_rules! test_app {
    ($env:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($env.tera.clone()))
                .app_data(actix_web::web::Data::new($env.pool.clone()))
                .app_data(actix_web::web::Data::new($env.state.clone()))
                .service(
                    actix_web::web::scope("")
                        .wrap(supplychain_backend::session_middleware(actix_web::cookie::Key::generate(), false))
                        .configure(supplychain_backend::routes::config_site)
                        .default_service(actix_web::web::to(supplychain_backend::routes::page_not_found)),
                ),
        )
        .await
    };
}

pub async fn body_text(resp: ServiceResponse) -> String {
    let bytes = test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub fn location(resp: &ServiceResponse) -> String {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// The session cookie set by a response, to carry a flash message into the next request.
pub fn session_cookie(resp: &ServiceResponse) -> Cookie<'static> {
    resp.response().cookies().next().expect("session cookie").into_owned()
}

pub fn multipart_body(boundary: &str, fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", boundary, name, value).as_bytes());
    }
    if let Some((filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image_file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                boundary, filename, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}
