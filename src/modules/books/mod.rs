pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshelf_http::{AppError, IntegerId};
use bookshelf_kernel::{InitCtx, Module};
use bookshelf_store::{Collection, StoreError};
use serde::Serialize;
use serde_json::json;

use models::{Book, UpdateBook};

/// Collaborator the books handlers read and write through.
pub type BookCollection = Arc<dyn Collection<Book>>;

const BAD_REQUEST: &str = "Bad Request";
const BOOK_NOT_FOUND: &str = "Book not found";
const CONFLICT: &str = "Conflict";

/// Books catalogue mounted at `/api/books`
pub struct BooksModule {
    books: BookCollection,
}

impl BooksModule {
    pub fn new(books: BookCollection) -> Self {
        Self { books }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let catalogue = self.books.find().await?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books = catalogue.len(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_books).post(create_book))
            .route(
                "/{id}",
                get(get_book).put(update_book).delete(delete_book),
            )
            .with_state(Arc::clone(&self.books))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Every book in the catalogue",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "500": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "post": {
                        "summary": "Add a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Book" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Book created",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/CreatedBook" }
                                    }
                                }
                            },
                            "400": { "$ref": "#/components/responses/Error" },
                            "409": { "$ref": "#/components/responses/Error" },
                            "500": { "$ref": "#/components/responses/Error" }
                        }
                    }
                },
                "/{id}": {
                    "parameters": [{
                        "name": "id",
                        "in": "path",
                        "required": true,
                        "schema": { "type": "integer", "format": "int64" }
                    }],
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "The book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "400": { "$ref": "#/components/responses/Error" },
                            "404": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "put": {
                        "summary": "Replace a book's title and author",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/UpdateBook" }
                                }
                            }
                        },
                        "responses": {
                            "204": { "description": "Book updated" },
                            "400": { "$ref": "#/components/responses/Error" },
                            "404": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "responses": {
                            "204": { "description": "Book deleted" },
                            "400": { "$ref": "#/components/responses/Error" },
                            "404": { "$ref": "#/components/responses/Error" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "title": { "type": "string" },
                            "author": { "type": "string" }
                        },
                        "required": ["id", "title", "author"],
                        "additionalProperties": false
                    },
                    "UpdateBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" }
                        },
                        "required": ["title", "author"],
                        "additionalProperties": false
                    },
                    "CreatedBook": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" }
                        },
                        "required": ["id"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CreatedBook {
    id: i64,
}

fn store_failure(err: StoreError) -> AppError {
    match err {
        StoreError::NotFound => AppError::not_found(BOOK_NOT_FOUND),
        StoreError::Duplicate => AppError::conflict(CONFLICT),
        StoreError::Backend(err) => AppError::Internal(err),
    }
}

async fn list_books(State(books): State<BookCollection>) -> Result<Json<Vec<Book>>, AppError> {
    let catalogue = books.find().await.map_err(store_failure)?;
    Ok(Json(catalogue))
}

async fn get_book(
    State(books): State<BookCollection>,
    IntegerId(id): IntegerId,
) -> Result<Json<Book>, AppError> {
    let book = books.find_one(&id).await.map_err(store_failure)?;
    Ok(Json(book))
}

async fn create_book(
    State(books): State<BookCollection>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedBook>), AppError> {
    let book: Book = Book::SCHEMA
        .parse(payload)
        .map_err(|details| AppError::invalid(BAD_REQUEST, details))?;

    let id = books.insert_one(book).await.map_err(store_failure)?;
    tracing::info!(book_id = id, "book created");

    Ok((StatusCode::CREATED, Json(CreatedBook { id })))
}

async fn update_book(
    State(books): State<BookCollection>,
    IntegerId(id): IntegerId,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let update: UpdateBook = UpdateBook::SCHEMA
        .parse(payload)
        .map_err(|details| AppError::invalid(BAD_REQUEST, details))?;

    books.update_one(&id, update).await.map_err(store_failure)?;
    tracing::info!(book_id = id, "book updated");

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_book(
    State(books): State<BookCollection>,
    IntegerId(id): IntegerId,
) -> Result<StatusCode, AppError> {
    books.delete_one(&id).await.map_err(store_failure)?;
    tracing::info!(book_id = id, "book deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Create a new instance of the books module
pub fn create_module(books: BookCollection) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(books))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_store::MemoryCollection;

    #[test]
    fn store_outcomes_map_to_statuses() {
        assert_eq!(
            store_failure(StoreError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            store_failure(StoreError::Duplicate).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            store_failure(StoreError::Backend(anyhow::anyhow!("disk full"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn update_keeps_the_id() {
        let books = MemoryCollection::with_records(models::seed_catalogue());
        let updated = books
            .update_one(
                &1,
                UpdateBook {
                    title: "The Sunbearer Trials".to_string(),
                    author: "Aiden Thomas".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated, Book::new(1, "The Sunbearer Trials", "Aiden Thomas"));
    }

    #[test]
    fn openapi_fragment_documents_every_route() {
        let module = BooksModule::new(Arc::new(MemoryCollection::<Book>::new()));
        let fragment = module.openapi().unwrap();

        for method in ["get", "put", "delete"] {
            assert!(fragment["paths"]["/{id}"][method].is_object(), "{method}");
        }
        assert!(fragment["paths"]["/"]["post"].is_object());
    }
}
