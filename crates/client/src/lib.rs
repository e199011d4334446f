//! Admin client for the bookshelf REST API.
//!
//! [`ApiClient`] speaks the wire protocol; [`Console`] holds the admin
//! front end's state (base URL, connectivity, loaded books, the book form).

pub mod api;
pub mod console;
pub mod error;
pub mod models;
pub mod render;

pub use api::ApiClient;
pub use console::{ConnectionStatus, Console, FormMode, FormState, Notification, NotificationLevel, View};
pub use error::ClientError;
pub use models::{Book, BookDraft};
