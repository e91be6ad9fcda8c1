use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use thiserror::Error;

use crate::helper::form_helpers::FormErrors;
use crate::DbPool;

pub mod contact_helpers;
pub mod cost_of_living_helpers;
pub mod event_helpers;
pub mod form_helpers;
pub mod project_helpers;
pub mod public_helpers;
pub mod sanitization_helpers;
pub mod supplier_helpers;

#[derive(Error, Debug)]
pub enum HelperError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Record not found")]
    NotFound,
    #[error("{0}")]
    Duplicate(String),
    #[error("Invalid form submission")]
    Validation(FormErrors),
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Upload(String),
    #[error("Blocking task failed: {0}")]
    Blocking(#[from] actix_web::error::BlockingError),
}

pub type SqliteConn = PooledConnection<SqliteConnectionManager>;

// Helper to get a connection from the pool
pub fn get_conn(pool: &DbPool) -> Result<SqliteConn, HelperError> {
    pool.get().map_err(HelperError::Pool)
}

/// Fails with `Validation` when anything was recorded.
pub fn ensure_valid(errors: FormErrors) -> Result<(), HelperError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(HelperError::Validation(errors))
    }
}
