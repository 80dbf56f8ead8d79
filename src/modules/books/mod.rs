pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;
pub mod validation;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use shelf_db::Database;
use shelf_kernel::{InitCtx, Migration, Module};

use repository::BookRepository;
use service::BookService;

/// Book catalog module: CRUD over the `books` table
pub struct BooksModule {
    service: BookService,
}

impl BooksModule {
    pub fn new(db: Database) -> Self {
        Self {
            service: BookService::new(Arc::new(BookRepository::new(db))),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_create_books",
            up: r#"
                CREATE TABLE IF NOT EXISTS books (
                    isbn       TEXT PRIMARY KEY,
                    amazon_url TEXT NOT NULL,
                    author     TEXT NOT NULL,
                    language   TEXT NOT NULL,
                    pages      INTEGER NOT NULL,
                    publisher  TEXT NOT NULL,
                    title      TEXT NOT NULL,
                    year       INTEGER NOT NULL
                );
                "#,
        }]
    }

    async fn start(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        ctx.db
            .ping()
            .await
            .context("books module cannot reach the database")?;
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: serde_json::Value) -> serde_json::Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let book_envelope = json!({
        "type": "object",
        "properties": { "book": { "$ref": "#/components/schemas/Book" } },
        "required": ["book"]
    });
    let isbn_param = json!({
        "name": "isbn",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    });
    let create_body = json!({
        "required": true,
        "content": {
            "application/json": { "schema": { "$ref": "#/components/schemas/Book" } }
        }
    });
    let update_body = json!({
        "required": true,
        "content": {
            "application/json": { "schema": { "$ref": "#/components/schemas/BookFields" } }
        }
    });

    let mut fields = json!({
        "amazon_url": { "type": "string" },
        "author": { "type": "string" },
        "language": { "type": "string" },
        "pages": { "type": "integer", "minimum": 1 },
        "publisher": { "type": "string" },
        "title": { "type": "string" },
        "year": { "type": "integer" }
    });
    let field_names: Vec<String> = fields
        .as_object()
        .map(|f| f.keys().cloned().collect())
        .unwrap_or_default();
    let book_fields = json!({
        "type": "object",
        "properties": fields.clone(),
        "required": field_names.clone()
    });
    fields["isbn"] = json!({ "type": "string", "description": "Caller-supplied unique identifier" });
    let mut book_required = vec!["isbn".to_string()];
    book_required.extend(field_names);
    let book = json!({
        "type": "object",
        "properties": fields,
        "required": book_required
    });

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": json_response("All books", json!({
                            "type": "object",
                            "properties": {
                                "books": {
                                    "type": "array",
                                    "items": { "$ref": "#/components/schemas/Book" }
                                }
                            },
                            "required": ["books"]
                        })),
                        "500": error_response("Internal server error")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": create_body,
                    "responses": {
                        "201": json_response("Created book", book_envelope.clone()),
                        "400": error_response("Invalid payload"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/{isbn}": {
                "parameters": [isbn_param],
                "get": {
                    "summary": "Get a book by ISBN",
                    "tags": ["Books"],
                    "responses": {
                        "200": json_response("The book", book_envelope.clone()),
                        "404": error_response("No book with this ISBN")
                    }
                },
                "put": {
                    "summary": "Replace every field of a book",
                    "tags": ["Books"],
                    "requestBody": update_body,
                    "responses": {
                        "200": json_response("Updated book", book_envelope),
                        "400": error_response("Invalid payload"),
                        "404": error_response("No book with this ISBN")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "responses": {
                        "200": json_response("Deletion confirmation", json!({
                            "type": "object",
                            "properties": { "message": { "type": "string" } },
                            "required": ["message"]
                        })),
                        "404": error_response("No book with this ISBN")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": book,
                "BookFields": book_fields
            }
        }
    })
}

/// Create a new instance of the books module
pub fn create_module(db: Database) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(db))
}
