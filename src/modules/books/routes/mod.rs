//! HTTP handlers for the books module, mounted under `/api/books`.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use bookshelf_http::error::AppError;

use super::models::{Book, BookInput, NewBook};
use super::repository::{BookRepository, RepositoryError};

type Repository = Arc<dyn BookRepository>;

/// Route table for the books module.
pub fn router(repository: Repository) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(repository)
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => {
                AppError::not_found(format!("Book with id {} not found", id))
            }
            RepositoryError::Unavailable(source) => {
                tracing::error!(error = %source, "book store unreachable");
                AppError::unavailable("book store is unreachable")
            }
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

fn validated(input: BookInput) -> Result<NewBook, AppError> {
    input.into_new_book().map_err(|errors| {
        let details = errors
            .into_iter()
            .filter_map(|error| serde_json::to_value(error).ok())
            .collect();
        AppError::validation(details, "Book failed validation")
    })
}

async fn list_books(State(repository): State<Repository>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(repository.list().await?))
}

async fn get_book(
    State(repository): State<Repository>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = id?;
    Ok(Json(repository.get(id).await?))
}

async fn create_book(
    State(repository): State<Repository>,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(input) = payload?;
    let book = repository.create(validated(input)?).await?;

    tracing::info!(book_id = book.id, title = %book.title, "book created");

    let location = format!("/api/books/{}", book.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(book)))
}

async fn update_book(
    State(repository): State<Repository>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = id?;
    let Json(input) = payload?;

    if let Some(body_id) = input.id {
        if body_id != id {
            return Err(AppError::bad_request(format!(
                "body id {} does not match path id {}",
                body_id, id
            )));
        }
    }

    let book = repository.update(id, validated(input)?).await?;
    tracing::info!(book_id = id, "book updated");
    Ok(Json(book))
}

async fn delete_book(
    State(repository): State<Repository>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    repository.delete(id).await?;
    tracing::info!(book_id = id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}
