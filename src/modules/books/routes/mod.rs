//! HTTP handlers for the books module.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use shelf_http::error::AppError;

use super::models::{BookEnvelope, BookList, Message};
use super::service::BookService;

pub fn router(service: BookService) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{isbn}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(service)
}

/// `GET /books`
async fn list_books(State(service): State<BookService>) -> Result<Json<BookList>, AppError> {
    let books = service.list().await?;
    Ok(Json(BookList { books }))
}

/// `GET /books/{isbn}`
async fn get_book(
    State(service): State<BookService>,
    Path(isbn): Path<String>,
) -> Result<Json<BookEnvelope>, AppError> {
    let book = service.get(&isbn).await?;
    Ok(Json(BookEnvelope { book }))
}

/// `POST /books`
async fn create_book(
    State(service): State<BookService>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<BookEnvelope>), AppError> {
    let Json(payload) = body?;
    let book = service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(BookEnvelope { book })))
}

/// `PUT /books/{isbn}`
async fn update_book(
    State(service): State<BookService>,
    Path(isbn): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BookEnvelope>, AppError> {
    let Json(payload) = body?;
    let book = service.update(&isbn, payload).await?;
    Ok(Json(BookEnvelope { book }))
}

/// `DELETE /books/{isbn}`
async fn delete_book(
    State(service): State<BookService>,
    Path(isbn): Path<String>,
) -> Result<Json<Message>, AppError> {
    service.delete(&isbn).await?;
    Ok(Json(Message::book_deleted()))
}
