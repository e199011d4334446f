//! Bookshelf application library
//!
//! The book catalog module plus the bootstrap that wires it to storage and HTTP.

pub mod app;
pub mod modules;

pub use app::Application;
pub use modules::books::models::{Book, BookInput, NewBook};
pub use modules::books::repository::{BookRepository, RepositoryError};
