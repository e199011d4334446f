use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use super::{BookRepository, RepositoryError};
use crate::modules::books::models::{Book, NewBook};

/// Schema for the `books` table.
///
/// `price` is kept as decimal text so no precision is lost to floating point.
pub const BOOKS_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id     INTEGER PRIMARY KEY AUTOINCREMENT,
        title  TEXT    NOT NULL CHECK (length(title) BETWEEN 1 AND 100),
        author TEXT    NOT NULL CHECK (length(author) BETWEEN 1 AND 100),
        year   INTEGER NOT NULL,
        genre  TEXT    CHECK (genre IS NULL OR length(genre) <= 50),
        price  TEXT    NOT NULL
    );
"#;

const SELECT_BOOK: &str = "SELECT id, title, author, year, genre, price FROM books";

/// Relational store backed by a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqlBookRepository {
    pool: SqlitePool,
}

impl SqlBookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn book_from_row(row: &SqliteRow) -> Result<Book, RepositoryError> {
    let id: i64 = row.try_get("id")?;
    let price: String = row.try_get("price")?;
    let price = Decimal::from_str(&price).map_err(|err| RepositoryError::Corrupt {
        id,
        reason: format!("price '{}': {}", price, err),
    })?;

    Ok(Book {
        id,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        year: row.try_get("year")?,
        genre: row.try_get("genre")?,
        price,
    })
}

#[async_trait]
impl BookRepository for SqlBookRepository {
    async fn list(&self) -> Result<Vec<Book>, RepositoryError> {
        let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_BOOK))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(book_from_row).collect()
    }

    async fn get(&self, id: i64) -> Result<Book, RepositoryError> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_BOOK))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => book_from_row(&row),
            None => Err(RepositoryError::NotFound(id)),
        }
    }

    async fn create(&self, book: NewBook) -> Result<Book, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO books (title, author, year, genre, price) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.year)
        .bind(book.genre.as_deref())
        .bind(book.price.to_string())
        .execute(&self.pool)
        .await?;

        Ok(book.with_id(result.last_insert_rowid()))
    }

    async fn update(&self, id: i64, book: NewBook) -> Result<Book, RepositoryError> {
        let result = sqlx::query(
            "UPDATE books SET title = ?, author = ?, year = ?, genre = ?, price = ? WHERE id = ?",
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.year)
        .bind(book.genre.as_deref())
        .bind(book.price.to_string())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(book.with_id(id))
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
