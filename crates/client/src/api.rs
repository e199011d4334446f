use bookshelf_kernel::HealthReport;
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ClientError;
use crate::models::Book;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Typed client for the `/api` routes of one server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Accepts an absolute `http`/`https` URL; a trailing slash is ignored.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed).map_err(|err| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: trimmed.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn list_books(&self) -> Result<Vec<Book>, ClientError> {
        let response = self.http.get(self.endpoint("/api/books")).send().await?;
        decode(response).await
    }

    pub async fn get_book(&self, id: i64) -> Result<Book, ClientError> {
        let response = self
            .http
            .get(self.endpoint(&format!("/api/books/{}", id)))
            .send()
            .await?;
        decode(response).await
    }

    /// POST the book; the server ignores `book.id` and assigns a new one.
    pub async fn create_book(&self, book: &Book) -> Result<Book, ClientError> {
        let response = self
            .http
            .post(self.endpoint("/api/books"))
            .json(book)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn update_book(&self, book: &Book) -> Result<Book, ClientError> {
        let response = self
            .http
            .put(self.endpoint(&format!("/api/books/{}", book.id)))
            .json(book)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn delete_book(&self, id: i64) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.endpoint(&format!("/api/books/{}", id)))
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }
        Err(api_error(response).await)
    }

    /// Fetch the health report; any non-2xx answer is an error.
    pub async fn health(&self) -> Result<HealthReport, ClientError> {
        let response = self.http.get(self.endpoint("/api/health")).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    if response.status().is_success() {
        return Ok(response.json::<T>().await?);
    }
    Err(api_error(response).await)
}

/// Turn a non-success response into [`ClientError::Api`], reading the
/// server's error envelope when there is one.
async fn api_error(response: Response) -> ClientError {
    let status = response.status();
    let fallback = reason(status);

    let (code, message) = match response.json::<ErrorEnvelope>().await {
        Ok(envelope) => (envelope.error.code, envelope.error.message),
        Err(_) => (String::new(), fallback),
    };

    tracing::debug!(status = status.as_u16(), %code, %message, "API request failed");

    ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    }
}

fn reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}
