use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use shelf_db::Database;
use shelf_kernel::settings::Settings;
use tower::ServiceExt;

const TEST_ISBN: &str = "1111";

struct TestApp {
    router: Router,
    db: Database,
}

impl TestApp {
    /// Fresh in-memory catalog holding a single seeded book
    async fn new() -> Self {
        let settings = Settings::default();
        let db = Database::open_in_memory().await.unwrap();
        let registry = shelf_app::prepare(&settings, &db).await.unwrap();

        sqlx::query(
            "INSERT INTO books (isbn, amazon_url, author, language, pages, publisher, title, year)
             VALUES ('1111', 'https://amazon.com/book', 'Test Author', 'English', 5,
                     'test publisher', 'test book', 2022)",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let router = shelf_http::build_router(&registry, &settings);
        Self { router, db }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn book_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }
}

fn full_fields(pages: i64) -> Value {
    json!({
        "amazon_url": "https://amazon.com/book",
        "author": "testerson",
        "language": "english",
        "pages": pages,
        "publisher": "test pub",
        "title": "test book",
        "year": 2022
    })
}

fn new_book(isbn: &str) -> Value {
    let mut body = full_fields(50);
    body["isbn"] = json!(isbn);
    body
}

#[tokio::test]
async fn get_books_lists_the_catalog() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/books", None).await;

    assert_eq!(status, StatusCode::OK);
    let books = body["books"].as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["isbn"], TEST_ISBN);
    assert_eq!(books[0]["author"], "Test Author");
}

#[tokio::test]
async fn empty_catalog_lists_nothing() {
    let app = TestApp::new().await;
    app.send(Method::DELETE, "/books/1111", None).await;

    let (status, body) = app.send(Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "books": [] }));
}

#[tokio::test]
async fn post_creates_a_book() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::POST, "/books", Some(new_book("2222"))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["book"]["isbn"], "2222");

    let (status, fetched) = app.send(Method::GET, "/books/2222", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["book"], new_book("2222"));
}

#[tokio::test]
async fn list_grows_with_each_create() {
    let app = TestApp::new().await;
    for isbn in ["2222", "3333", "4444"] {
        let (status, _) = app.send(Method::POST, "/books", Some(new_book(isbn))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = app.send(Method::GET, "/books", None).await;
    assert_eq!(body["books"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn post_rejects_a_book_missing_properties() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(Method::POST, "/books", Some(json!({ "isbn": "2333" })))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["details"].as_array().unwrap().len(), 7);
    assert_eq!(app.book_count().await, 1);
}

#[tokio::test]
async fn post_rejects_mistyped_fields() {
    let app = TestApp::new().await;
    let mut body = new_book("2444");
    body["pages"] = json!("many");

    let (status, body) = app.send(Method::POST, "/books", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["details"],
        json!([{ "field": "pages", "error": "must be an integer" }])
    );
}

#[tokio::test]
async fn post_rejects_malformed_json() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/books")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_with_duplicate_isbn_is_a_server_error() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::POST, "/books", Some(new_book(TEST_ISBN))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "internal_error");
    assert_eq!(app.book_count().await, 1);
}

#[tokio::test]
async fn get_book_by_isbn() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/books/1111", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["isbn"], TEST_ISBN);
    assert_eq!(body["book"]["pages"], 5);
    assert_eq!(body["book"]["year"], 2022);
}

#[tokio::test]
async fn get_unknown_isbn_returns_404() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/books/99999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
    assert!(body["error"]["message"].as_str().unwrap().contains("99999"));
}

#[tokio::test]
async fn put_updates_a_book() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(Method::PUT, "/books/1111", Some(full_fields(51)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["isbn"], TEST_ISBN);
    assert_eq!(body["book"]["pages"], 51);

    let (_, fetched) = app.send(Method::GET, "/books/1111", None).await;
    assert_eq!(fetched["book"]["author"], "testerson");
}

#[tokio::test]
async fn put_unknown_isbn_returns_404() {
    let app = TestApp::new().await;
    let (status, _) = app
        .send(Method::PUT, "/books/99999", Some(full_fields(50)))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_rejects_a_partial_update() {
    let app = TestApp::new().await;
    let (status, _) = app
        .send(Method::PUT, "/books/1111", Some(json!({ "author": "silly man" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, fetched) = app.send(Method::GET, "/books/1111", None).await;
    assert_eq!(fetched["book"]["author"], "Test Author");
}

#[tokio::test]
async fn put_validates_before_checking_existence() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(Method::PUT, "/books/99999", Some(json!({ "author": "x" })))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn delete_removes_a_book() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::DELETE, "/books/1111", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Book deleted" }));
    assert_eq!(app.book_count().await, 0);
}

#[tokio::test]
async fn delete_is_not_idempotent() {
    let app = TestApp::new().await;
    let (first, _) = app.send(Method::DELETE, "/books/1111", None).await;
    let (second, _) = app.send(Method::DELETE, "/books/1111", None).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_unknown_isbn_returns_404() {
    let app = TestApp::new().await;
    let (status, _) = app.send(Method::DELETE, "/books/99999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let app = TestApp::new().await;

    let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, spec) = app.send(Method::GET, "/docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(spec["paths"]["/books"]["post"].is_object());
    assert!(spec["paths"]["/books/{isbn}"]["delete"].is_object());
    assert!(spec["components"]["schemas"]["Book"].is_object());
}
