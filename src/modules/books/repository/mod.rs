//! Persistence gateway for books.

mod memory;
mod sql;

use async_trait::async_trait;
use thiserror::Error;

use super::models::{Book, NewBook};

pub use memory::InMemoryBookRepository;
pub use sql::{SqlBookRepository, BOOKS_SCHEMA};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("book {0} not found")]
    NotFound(i64),

    /// The backing store cannot be reached (pool closed, timed out, I/O).
    #[error("book store unavailable")]
    Unavailable(#[source] sqlx::Error),

    #[error("book store query failed")]
    Database(#[source] sqlx::Error),

    #[error("stored book {id} is unreadable: {reason}")]
    Corrupt { id: i64, reason: String },
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                RepositoryError::Unavailable(err)
            }
            other => RepositoryError::Database(other),
        }
    }
}

/// CRUD access to the catalog. Each call is its own single-row commit.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// All books ordered by ascending id
    async fn list(&self) -> Result<Vec<Book>, RepositoryError>;

    async fn get(&self, id: i64) -> Result<Book, RepositoryError>;

    /// Insert and return the row with its newly assigned id
    async fn create(&self, book: NewBook) -> Result<Book, RepositoryError>;

    /// Replace every field except the id
    async fn update(&self, id: i64, book: NewBook) -> Result<Book, RepositoryError>;

    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;

    async fn count(&self) -> Result<u64, RepositoryError>;

    /// Cheap reachability check used by the health probe
    async fn ping(&self) -> Result<(), RepositoryError>;
}

#[cfg(test)]
pub(crate) mod contract {
    //! Behaviour every backend must share, run against each implementation.

    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    pub fn sample(title: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: "Eric Evans".to_string(),
            year: 2003,
            genre: Some("Software Engineering".to_string()),
            price: Decimal::from_str("59.99").unwrap(),
        }
    }

    pub async fn create_then_get_round_trips(repo: &dyn BookRepository) {
        let created = repo.create(sample("Domain-Driven Design")).await.unwrap();
        assert!(created.id > 0);

        let fetched = repo.get(created.id).await.unwrap();
        assert_eq!(fetched, sample("Domain-Driven Design").with_id(created.id));
    }

    pub async fn ids_are_unique_and_never_reused(repo: &dyn BookRepository) {
        let first = repo.create(sample("First")).await.unwrap();
        let second = repo.create(sample("Second")).await.unwrap();
        assert_ne!(first.id, second.id);

        repo.delete(second.id).await.unwrap();
        let third = repo.create(sample("Third")).await.unwrap();
        assert!(third.id > second.id);
    }

    pub async fn list_is_ordered_by_id(repo: &dyn BookRepository) {
        for title in ["C", "A", "B"] {
            repo.create(sample(title)).await.unwrap();
        }
        let ids: Vec<i64> = repo.list().await.unwrap().iter().map(|b| b.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    pub async fn update_replaces_fields_but_not_id(repo: &dyn BookRepository) {
        let created = repo.create(sample("Draft")).await.unwrap();
        let mut changes = sample("Final");
        changes.genre = None;
        changes.price = Decimal::from(12);

        let updated = repo.update(created.id, changes.clone()).await.unwrap();
        assert_eq!(updated, changes.with_id(created.id));
        assert_eq!(repo.get(created.id).await.unwrap(), updated);
    }

    pub async fn missing_ids_are_not_found(repo: &dyn BookRepository) {
        assert!(matches!(repo.get(404).await, Err(RepositoryError::NotFound(404))));
        assert!(matches!(
            repo.update(404, sample("Ghost")).await,
            Err(RepositoryError::NotFound(404))
        ));
        assert!(matches!(repo.delete(404).await, Err(RepositoryError::NotFound(404))));
    }

    pub async fn delete_removes_from_get_and_list(repo: &dyn BookRepository) {
        let kept = repo.create(sample("Kept")).await.unwrap();
        let gone = repo.create(sample("Gone")).await.unwrap();

        repo.delete(gone.id).await.unwrap();

        assert!(matches!(repo.get(gone.id).await, Err(RepositoryError::NotFound(_))));
        let listed = repo.list().await.unwrap();
        assert_eq!(listed, vec![kept]);
    }
}
