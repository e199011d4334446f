use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BookRepository, RepositoryError};
use crate::modules::books::models::{Book, NewBook};

/// Process-local store; contents vanish with the process.
#[derive(Debug)]
pub struct InMemoryBookRepository {
    state: RwLock<State>,
}

#[derive(Debug)]
struct State {
    rows: BTreeMap<i64, Book>,
    /// Never decremented, so ids of deleted rows are not handed out again.
    next_id: i64,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryBookRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn list(&self) -> Result<Vec<Book>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.rows.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Book, RepositoryError> {
        let state = self.state.read().await;
        state
            .rows
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn create(&self, book: NewBook) -> Result<Book, RepositoryError> {
        let mut state = self.state.write().await;
        let id = state.next_id;
        state.next_id += 1;

        let book = book.with_id(id);
        state.rows.insert(id, book.clone());
        Ok(book)
    }

    async fn update(&self, id: i64, book: NewBook) -> Result<Book, RepositoryError> {
        let mut state = self.state.write().await;
        let slot = state
            .rows
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound(id))?;

        *slot = book.with_id(id);
        Ok(slot.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.rows.len() as u64)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
