pub mod models;
pub mod repository;
pub mod routes;
pub mod seed;

use std::sync::Arc;

use async_trait::async_trait;
use bookshelf_kernel::{HealthCheck, InitCtx, Migration, Module};
use axum::Router;
use serde_json::json;

use repository::{BookRepository, BOOKS_SCHEMA};

/// Name of the check this module contributes to `/api/health`.
pub const HEALTH_CHECK_NAME: &str = "database";

/// Book catalog module: CRUD routes over a [`BookRepository`].
pub struct BooksModule {
    repository: Arc<dyn BookRepository>,
}

impl BooksModule {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
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
            backend = ?ctx.settings.database.backend,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.repository.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({
            "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
        });
        let book = json!({
            "application/json": { "schema": { "$ref": "#/components/schemas/Book" } }
        });
        let book_input = json!({
            "required": true,
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/BookInput" } }
            }
        });
        let id_param = json!([{
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer", "format": "int64" }
        }]);

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Get all books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "List of books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "503": { "description": "Book store unreachable", "content": error }
                        }
                    },
                    "post": {
                        "summary": "Create a new book",
                        "tags": ["Books"],
                        "requestBody": book_input,
                        "responses": {
                            "201": { "description": "Created book", "content": book },
                            "400": { "description": "Malformed body", "content": error },
                            "422": { "description": "Validation error", "content": error }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book by ID",
                        "tags": ["Books"],
                        "parameters": id_param,
                        "responses": {
                            "200": { "description": "The book", "content": book },
                            "404": { "description": "Book not found", "content": error }
                        }
                    },
                    "put": {
                        "summary": "Update a book",
                        "tags": ["Books"],
                        "parameters": id_param,
                        "requestBody": book_input,
                        "responses": {
                            "200": { "description": "Updated book", "content": book },
                            "400": { "description": "Malformed body or id mismatch", "content": error },
                            "404": { "description": "Book not found", "content": error },
                            "422": { "description": "Validation error", "content": error }
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": id_param,
                        "responses": {
                            "204": { "description": "Deleted" },
                            "404": { "description": "Book not found", "content": error }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64", "description": "Server-assigned identifier" },
                            "title": { "type": "string", "maxLength": 100 },
                            "author": { "type": "string", "maxLength": 100 },
                            "year": { "type": "integer", "description": "Publication year" },
                            "genre": { "type": ["string", "null"], "maxLength": 50 },
                            "price": { "type": "number", "minimum": 0, "maximum": 1000 }
                        },
                        "required": ["id", "title", "author", "year", "price"]
                    },
                    "BookInput": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64", "description": "Ignored on create; must match the path on update" },
                            "title": { "type": "string", "minLength": 1, "maxLength": 100 },
                            "author": { "type": "string", "minLength": 1, "maxLength": 100 },
                            "year": { "type": "integer" },
                            "genre": { "type": ["string", "null"], "maxLength": 50 },
                            "price": { "type": "number", "minimum": 0, "maximum": 1000 }
                        },
                        "required": ["title", "author", "price"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_create_books",
            up: BOOKS_SCHEMA,
        }]
    }

    async fn start(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if ctx.settings.database.seed {
            seed::seed_if_empty(self.repository.as_ref()).await?;
        }
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    /// An unreachable store is `Unhealthy`, not `Degraded`: no book route can
    /// answer without it, so `/api/health` reports 503.
    async fn health(&self) -> Option<HealthCheck> {
        let check = match self.repository.ping().await {
            Ok(()) => HealthCheck::healthy(HEALTH_CHECK_NAME, "book store is reachable"),
            Err(err) => HealthCheck::unhealthy(HEALTH_CHECK_NAME, err.to_string()),
        };
        Some(check)
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(repository: Arc<dyn BookRepository>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(repository))
}
