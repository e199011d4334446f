use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The form cannot be submitted as filled in.
    #[error("{0}")]
    Validation(String),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("could not reach the API")]
    Transport(#[from] reqwest::Error),

    /// An operation was attempted in the wrong form state.
    #[error("{0}")]
    Form(String),

    #[error("book {0} is not loaded")]
    UnknownBook(i64),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status: 404, .. })
    }

    /// True when the API could not be reached at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ClientError::Transport(err) if !err.is_decode() && !err.is_status())
    }
}
