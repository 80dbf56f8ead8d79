use serde::{Deserialize, Serialize};

/// A catalog entry keyed by its ISBN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Caller-supplied unique identifier; immutable once created
    pub isbn: String,
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i64,
    pub publisher: String,
    pub title: String,
    pub year: i64,
}

/// Every descriptive field of a book, i.e. a book without its key.
///
/// This is the body of a full-replace update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookFields {
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i64,
    pub publisher: String,
    pub title: String,
    pub year: i64,
}

impl Book {
    pub fn from_fields(isbn: impl Into<String>, fields: BookFields) -> Self {
        Self {
            isbn: isbn.into(),
            amazon_url: fields.amazon_url,
            author: fields.author,
            language: fields.language,
            pages: fields.pages,
            publisher: fields.publisher,
            title: fields.title,
            year: fields.year,
        }
    }
}

/// `{ "books": [...] }`
#[derive(Debug, Serialize, Deserialize)]
pub struct BookList {
    pub books: Vec<Book>,
}

/// `{ "book": {...} }`
#[derive(Debug, Serialize, Deserialize)]
pub struct BookEnvelope {
    pub book: Book,
}

/// `{ "message": "..." }`
#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn book_deleted() -> Self {
        Self {
            message: "Book deleted".to_string(),
        }
    }
}
