use shelf_db::DbError;
use shelf_http::error::AppError;
use thiserror::Error;

use super::validation::Violation;

/// Failures of a book catalog operation.
#[derive(Error, Debug)]
pub enum BookError {
    #[error("invalid book payload ({} violation(s))", .0.len())]
    Validation(Vec<Violation>),

    #[error("no book with isbn '{isbn}'")]
    NotFound { isbn: String },

    #[error(transparent)]
    Persistence(#[from] DbError),
}

impl BookError {
    pub fn not_found(isbn: impl Into<String>) -> Self {
        Self::NotFound { isbn: isbn.into() }
    }
}

impl From<sqlx::Error> for BookError {
    fn from(e: sqlx::Error) -> Self {
        Self::Persistence(DbError::from(e))
    }
}

impl From<BookError> for AppError {
    fn from(e: BookError) -> Self {
        match e {
            BookError::Validation(violations) => {
                let details = violations
                    .iter()
                    .map(|v| serde_json::json!({ "field": v.field, "error": v.error }))
                    .collect();
                AppError::validation(details, "Book payload failed validation")
            }
            BookError::NotFound { isbn } => {
                AppError::not_found(format!("no book with isbn '{isbn}'"))
            }
            BookError::Persistence(db) => AppError::Internal(anyhow::Error::new(db)),
        }
    }
}
