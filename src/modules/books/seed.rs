use rust_decimal::Decimal;

use super::models::NewBook;
use super::repository::{BookRepository, RepositoryError};

const GENRE: &str = "Software Engineering";

/// The sample catalog inserted into an empty store.
pub fn sample_books() -> Vec<NewBook> {
    [
        ("Domain-Driven Design", "Eric Evans", 2003, 5999),
        ("Clean Code", "Robert C. Martin", 2008, 4999),
        ("The Pragmatic Programmer", "Andrew Hunt, David Thomas", 1999, 3999),
        (
            "Design Patterns",
            "Erich Gamma, Richard Helm, Ralph Johnson, John Vlissides",
            1994,
            5499,
        ),
        ("Refactoring", "Martin Fowler", 1999, 4499),
    ]
    .into_iter()
    .map(|(title, author, year, cents)| NewBook {
        title: title.to_string(),
        author: author.to_string(),
        year,
        genre: Some(GENRE.to_string()),
        price: Decimal::new(cents, 2),
    })
    .collect()
}

/// Insert the sample catalog unless the store already holds books.
///
/// Returns how many rows were inserted.
pub async fn seed_if_empty(repository: &dyn BookRepository) -> Result<usize, RepositoryError> {
    let existing = repository.count().await?;
    if existing > 0 {
        tracing::debug!(existing, "book store already populated, skipping seed");
        return Ok(0);
    }

    let books = sample_books();
    let inserted = books.len();
    for book in books {
        repository.create(book).await?;
    }

    tracing::info!(inserted, "seeded sample books");
    Ok(inserted)
}
