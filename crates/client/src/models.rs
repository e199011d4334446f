use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// A book as the API serves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub year: i32,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Text fields of the book form, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub year: String,
    pub genre: String,
    pub price: String,
}

impl BookDraft {
    /// Prefill the form from an existing row.
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year.to_string(),
            genre: book.genre.clone().unwrap_or_default(),
            price: book.price.to_string(),
        }
    }

    /// Check the form and build the request body; `id` is 0 for a new book.
    pub fn to_book(&self, id: i64) -> Result<Book, ClientError> {
        let fields = [&self.title, &self.author, &self.year, &self.genre, &self.price];
        if fields.iter().any(|field| field.trim().is_empty()) {
            return Err(ClientError::Validation(
                "Please fill in all fields".to_string(),
            ));
        }

        let year = self
            .year
            .trim()
            .parse::<i32>()
            .map_err(|_| ClientError::Validation("Year must be a whole number".to_string()))?;
        let price = Decimal::from_str(self.price.trim())
            .map_err(|_| ClientError::Validation("Price must be a number".to_string()))?;

        Ok(Book {
            id,
            title: self.title.clone(),
            author: self.author.clone(),
            year,
            genre: Some(self.genre.clone()),
            price,
        })
    }
}
