use std::sync::Arc;

use serde_json::Value;

use super::error::BookError;
use super::models::{Book, BookFields};
use super::repository::BookStore;
use super::validation::validate;

/// Book catalog operations.
///
/// Write operations validate their payload before any store call, so an
/// invalid update body is rejected even when the ISBN does not exist.
#[derive(Clone)]
pub struct BookService {
    store: Arc<dyn BookStore>,
}

impl BookService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Book>, BookError> {
        Ok(self.store.list_books().await?)
    }

    pub async fn get(&self, isbn: &str) -> Result<Book, BookError> {
        self.store
            .get_book(isbn)
            .await?
            .ok_or_else(|| BookError::not_found(isbn))
    }

    pub async fn create(&self, payload: Value) -> Result<Book, BookError> {
        let book: Book = validate(payload).map_err(BookError::Validation)?;
        let created = self.store.create_book(&book).await.inspect_err(|e| {
            if e.is_unique_violation() {
                tracing::warn!(isbn = %book.isbn, "book with this isbn already exists");
            }
        })?;
        tracing::info!(isbn = %created.isbn, "book created");
        Ok(created)
    }

    pub async fn update(&self, isbn: &str, payload: Value) -> Result<Book, BookError> {
        let fields: BookFields = validate(payload).map_err(BookError::Validation)?;
        let updated = self
            .store
            .update_book(isbn, &fields)
            .await?
            .ok_or_else(|| BookError::not_found(isbn))?;
        tracing::info!(isbn = %isbn, "book updated");
        Ok(updated)
    }

    pub async fn delete(&self, isbn: &str) -> Result<(), BookError> {
        if !self.store.delete_book(isbn).await? {
            return Err(BookError::not_found(isbn));
        }
        tracing::info!(isbn = %isbn, "book deleted");
        Ok(())
    }
}
