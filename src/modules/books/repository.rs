//! Persistence for books.
//!
//! [`BookStore`] is the seam the service talks to; [`BookRepository`] is the
//! SQLite implementation over the shared [`Database`] handle. Each method is
//! a single statement, so atomicity comes from the store itself.

use async_trait::async_trait;
use shelf_db::{Database, DbError};

use super::models::{Book, BookFields};

const COLUMNS: &str = "isbn, amazon_url, author, language, pages, publisher, title, year";

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn list_books(&self) -> Result<Vec<Book>, DbError>;

    async fn get_book(&self, isbn: &str) -> Result<Option<Book>, DbError>;

    /// Insert a new book. A duplicate ISBN is reported by the store.
    async fn create_book(&self, book: &Book) -> Result<Book, DbError>;

    /// Replace every descriptive field. `None` when no row has this ISBN.
    async fn update_book(&self, isbn: &str, fields: &BookFields) -> Result<Option<Book>, DbError>;

    /// `false` when no row has this ISBN.
    async fn delete_book(&self, isbn: &str) -> Result<bool, DbError>;
}

#[derive(Debug, Clone)]
pub struct BookRepository {
    db: Database,
}

impl BookRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookStore for BookRepository {
    #[tracing::instrument(skip(self))]
    async fn list_books(&self) -> Result<Vec<Book>, DbError> {
        let books = sqlx::query_as::<_, Book>(&format!("SELECT {COLUMNS} FROM books"))
            .fetch_all(self.db.pool())
            .await?;
        Ok(books)
    }

    #[tracing::instrument(skip(self))]
    async fn get_book(&self, isbn: &str) -> Result<Option<Book>, DbError> {
        let book = sqlx::query_as::<_, Book>(&format!("SELECT {COLUMNS} FROM books WHERE isbn = ?"))
            .bind(isbn)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(book)
    }

    #[tracing::instrument(skip(self, book), fields(isbn = %book.isbn))]
    async fn create_book(&self, book: &Book) -> Result<Book, DbError> {
        let created = sqlx::query_as::<_, Book>(&format!(
            "INSERT INTO books ({COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {COLUMNS}"
        ))
        .bind(&book.isbn)
        .bind(&book.amazon_url)
        .bind(&book.author)
        .bind(&book.language)
        .bind(book.pages)
        .bind(&book.publisher)
        .bind(&book.title)
        .bind(book.year)
        .fetch_one(self.db.pool())
        .await?;
        Ok(created)
    }

    #[tracing::instrument(skip(self, fields))]
    async fn update_book(&self, isbn: &str, fields: &BookFields) -> Result<Option<Book>, DbError> {
        let updated = sqlx::query_as::<_, Book>(&format!(
            "UPDATE books
             SET amazon_url = ?, author = ?, language = ?, pages = ?,
                 publisher = ?, title = ?, year = ?
             WHERE isbn = ?
             RETURNING {COLUMNS}"
        ))
        .bind(&fields.amazon_url)
        .bind(&fields.author)
        .bind(&fields.language)
        .bind(fields.pages)
        .bind(&fields.publisher)
        .bind(&fields.title)
        .bind(fields.year)
        .bind(isbn)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_book(&self, isbn: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = ?")
            .bind(isbn)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
