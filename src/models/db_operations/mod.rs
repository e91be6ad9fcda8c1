pub mod calendar_db_operations;
pub mod content_db_operations;
pub mod councils_db_operations;
pub mod projects_db_operations;
pub mod suppliers_db_operations;

use rusqlite::{Error as RusqliteError, ErrorCode};

/// True when the error is SQLite rejecting a UNIQUE constraint.
pub fn is_unique_violation(err: &RusqliteError) -> bool {
    match err {
        RusqliteError::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}
