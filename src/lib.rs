use std::path::PathBuf;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::models::project_filter::FilterPolicy;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Request-independent settings the handlers need, resolved once from `Config`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub filter_policy: FilterPolicy,
    pub media_path: PathBuf,
    pub max_upload_size_bytes: u64,
    pub cost_of_living_csv: PathBuf,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        AppState {
            filter_policy: config.filter_policy,
            media_path: PathBuf::from(&config.media_path),
            max_upload_size_bytes: config.max_upload_size_mb * 1024 * 1024,
            cost_of_living_csv: PathBuf::from(&config.cost_of_living_csv),
        }
    }
}

/// Cookie-backed session used for flash notifications.
pub fn session_middleware(key: Key, secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_secure(secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .build()
}

pub mod config;
pub mod helper;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod setup;
