use std::fmt;

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::models::{Book, BookDraft};
use crate::render;

/// Connectivity indicator shown next to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Checking,
    Connected,
    NotConnected,
    /// The API answered, but not with success.
    Error(String),
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Checking => f.write_str("Checking..."),
            ConnectionStatus::Connected => f.write_str("Connected"),
            ConnectionStatus::NotConnected => f.write_str("Not Connected"),
            ConnectionStatus::Error(reason) => write!(f, "Error: {}", reason),
        }
    }
}

/// Which presentation of the catalog is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Grid,
    Table,
    Docs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(i64),
}

/// The book form: `Closed → Open → Submitting → Closed`, or back to `Open` on failure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Closed,
    Open { mode: FormMode, draft: BookDraft },
    Submitting { mode: FormMode, draft: BookDraft },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A toast-style message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

/// State of the admin front end for one API server.
#[derive(Debug)]
pub struct Console {
    client: ApiClient,
    status: ConnectionStatus,
    books: Vec<Book>,
    view: View,
    form: FormState,
    notifications: Vec<Notification>,
}

impl Console {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            client: ApiClient::new(base_url)?,
            status: ConnectionStatus::Checking,
            books: Vec::new(),
            view: View::default(),
            form: FormState::Closed,
            notifications: Vec::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Drain queued notifications, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Point the console at another server and re-check connectivity.
    ///
    /// An unparsable URL leaves the previous server in place and marks the
    /// console as not connected.
    pub async fn set_base_url(&mut self, base_url: &str) -> Result<&ConnectionStatus, ClientError> {
        match ApiClient::new(base_url) {
            Ok(client) => {
                tracing::debug!(base_url = client.base_url(), "base URL changed");
                self.client = client;
                Ok(self.check_health().await)
            }
            Err(err) => {
                self.status = ConnectionStatus::NotConnected;
                Err(err)
            }
        }
    }

    /// Poll `/api/health` and update the connectivity indicator.
    pub async fn check_health(&mut self) -> &ConnectionStatus {
        self.status = ConnectionStatus::Checking;
        self.status = match self.client.health().await {
            Ok(_) => ConnectionStatus::Connected,
            Err(err) => status_for(&err),
        };
        &self.status
    }

    /// Replace the local list with the server's catalog.
    pub async fn load_books(&mut self) -> Result<&[Book], ClientError> {
        match self.client.list_books().await {
            Ok(books) => {
                self.books = books;
                self.status = ConnectionStatus::Connected;
                Ok(&self.books)
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load books");
                self.status = status_for(&err);
                Err(err)
            }
        }
    }

    pub fn open_create(&mut self) -> Result<(), ClientError> {
        self.ensure_form_closed()?;
        self.form = FormState::Open {
            mode: FormMode::Create,
            draft: BookDraft::default(),
        };
        Ok(())
    }

    /// Open the form prefilled with a loaded book.
    pub fn open_edit(&mut self, id: i64) -> Result<(), ClientError> {
        self.ensure_form_closed()?;
        let book = self
            .books
            .iter()
            .find(|book| book.id == id)
            .ok_or(ClientError::UnknownBook(id))?;

        self.form = FormState::Open {
            mode: FormMode::Edit(id),
            draft: BookDraft::from_book(book),
        };
        Ok(())
    }

    /// The draft being edited, if the form is open.
    pub fn draft_mut(&mut self) -> Option<&mut BookDraft> {
        match &mut self.form {
            FormState::Open { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn close_form(&mut self) {
        self.form = FormState::Closed;
    }

    /// Send the open form to the API.
    ///
    /// On success the saved row is merged into the list and the form closes;
    /// on failure the form stays open with the draft intact.
    pub async fn submit(&mut self) -> Result<Book, ClientError> {
        let (mode, draft) = match std::mem::take(&mut self.form) {
            FormState::Open { mode, draft } => (mode, draft),
            other => {
                self.form = other;
                return Err(ClientError::Form("no book form is open".to_string()));
            }
        };

        let id = match mode {
            FormMode::Create => 0,
            FormMode::Edit(id) => id,
        };

        let book = match draft.to_book(id) {
            Ok(book) => book,
            Err(err) => {
                self.notify(NotificationLevel::Error, "Validation Error", err.to_string());
                self.form = FormState::Open { mode, draft };
                return Err(err);
            }
        };

        self.form = FormState::Submitting {
            mode,
            draft: draft.clone(),
        };

        let saved = match mode {
            FormMode::Create => self.client.create_book(&book).await,
            FormMode::Edit(_) => self.client.update_book(&book).await,
        };

        match saved {
            Ok(saved) => {
                let (verb, place) = match mode {
                    FormMode::Create => ("added", "to"),
                    FormMode::Edit(_) => ("updated", "in"),
                };
                self.merge(saved.clone());
                self.form = FormState::Closed;
                self.notify(
                    NotificationLevel::Success,
                    format!("Book {} successfully", verb),
                    format!("\"{}\" has been {} {} the library.", saved.title, verb, place),
                );
                Ok(saved)
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to save book");
                if err.is_connectivity() {
                    self.status = ConnectionStatus::NotConnected;
                }
                self.notify(
                    NotificationLevel::Error,
                    "Error saving book",
                    "There was an error saving the book. Please try again.",
                );
                self.form = FormState::Open { mode, draft };
                Err(err)
            }
        }
    }

    /// Delete on the server, then drop the row locally.
    pub async fn delete_book(&mut self, id: i64) -> Result<(), ClientError> {
        match self.client.delete_book(id).await {
            Ok(()) => {
                let title = self
                    .books
                    .iter()
                    .find(|book| book.id == id)
                    .map(|book| book.title.clone());
                self.books.retain(|book| book.id != id);
                self.notify(
                    NotificationLevel::Success,
                    "Book deleted successfully",
                    match title {
                        Some(title) => format!("\"{}\" has been removed from the library.", title),
                        None => format!("Book {} has been removed from the library.", id),
                    },
                );
                Ok(())
            }
            Err(err) => {
                if err.is_connectivity() {
                    self.status = ConnectionStatus::NotConnected;
                }
                self.notify(NotificationLevel::Error, "Error deleting book", err.to_string());
                Err(err)
            }
        }
    }

    /// Render the active view.
    pub fn render(&self) -> String {
        match self.view {
            View::Grid => render::grid(&self.books),
            View::Table => render::table(&self.books),
            View::Docs => render::docs(self.base_url()),
        }
    }

    fn ensure_form_closed(&self) -> Result<(), ClientError> {
        match self.form {
            FormState::Closed => Ok(()),
            _ => Err(ClientError::Form("a book form is already open".to_string())),
        }
    }

    /// Last write wins: replace the row with the same id or append.
    fn merge(&mut self, book: Book) {
        match self.books.iter_mut().find(|existing| existing.id == book.id) {
            Some(existing) => *existing = book,
            None => self.books.push(book),
        }
    }

    fn notify(
        &mut self,
        level: NotificationLevel,
        title: impl Into<String>,
        description: impl Into<String>,
    ) {
        self.notifications.push(Notification {
            level,
            title: title.into(),
            description: description.into(),
        });
    }
}

fn status_for(err: &ClientError) -> ConnectionStatus {
    match err {
        ClientError::Api { message, .. } => ConnectionStatus::Error(message.clone()),
        err if err.is_connectivity() => ConnectionStatus::NotConnected,
        other => ConnectionStatus::Error(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn console_with_books() -> Console {
        let mut console = Console::new("http://127.0.0.1:9").unwrap();
        console.books = vec![Book {
            id: 3,
            title: "Design Patterns".to_string(),
            author: "Erich Gamma".to_string(),
            year: 1994,
            genre: Some("Software Engineering".to_string()),
            price: Decimal::new(5499, 2),
        }];
        console
    }

    #[test]
    fn starts_closed_and_checking() {
        let console = Console::new("http://localhost:8080").unwrap();
        assert_eq!(console.form(), &FormState::Closed);
        assert_eq!(console.status(), &ConnectionStatus::Checking);
        assert_eq!(console.view(), View::Grid);
    }

    #[test]
    fn edit_prefills_draft() {
        let mut console = console_with_books();
        console.open_edit(3).unwrap();

        let draft = console.draft_mut().unwrap();
        assert_eq!(draft.title, "Design Patterns");
        assert_eq!(draft.price, "54.99");
        assert!(matches!(
            console.form(),
            FormState::Open {
                mode: FormMode::Edit(3),
                ..
            }
        ));
    }

    #[test]
    fn edit_of_unloaded_book_is_refused() {
        let mut console = console_with_books();
        assert!(matches!(
            console.open_edit(99),
            Err(ClientError::UnknownBook(99))
        ));
        assert_eq!(console.form(), &FormState::Closed);
    }

    #[test]
    fn only_one_form_at_a_time() {
        let mut console = console_with_books();
        console.open_create().unwrap();
        assert!(matches!(console.open_edit(3), Err(ClientError::Form(_))));

        console.close_form();
        console.open_edit(3).unwrap();
    }

    #[tokio::test]
    async fn submit_without_open_form_is_refused() {
        let mut console = console_with_books();
        assert!(matches!(console.submit().await, Err(ClientError::Form(_))));
        assert_eq!(console.form(), &FormState::Closed);
    }

    #[tokio::test]
    async fn incomplete_draft_keeps_form_open() {
        let mut console = console_with_books();
        console.open_create().unwrap();
        console.draft_mut().unwrap().title = "Only a title".to_string();

        let err = console.submit().await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(matches!(console.form(), FormState::Open { .. }));
        assert_eq!(console.draft_mut().unwrap().title, "Only a title");

        let notifications = console.take_notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].title, "Validation Error");
        assert_eq!(notifications[0].description, "Please fill in all fields");
    }

    #[test]
    fn merge_replaces_or_appends() {
        let mut console = console_with_books();
        let mut changed = console.books()[0].clone();
        changed.title = "Design Patterns, 2nd ed.".to_string();
        console.merge(changed);
        assert_eq!(console.books().len(), 1);
        assert_eq!(console.books()[0].title, "Design Patterns, 2nd ed.");

        let mut added = console.books()[0].clone();
        added.id = 4;
        console.merge(added);
        assert_eq!(console.books().len(), 2);
    }

    #[test]
    fn status_labels() {
        assert_eq!(ConnectionStatus::Connected.to_string(), "Connected");
        assert_eq!(ConnectionStatus::NotConnected.to_string(), "Not Connected");
        assert_eq!(
            ConnectionStatus::Error("Service Unavailable".to_string()).to_string(),
            "Error: Service Unavailable"
        );
    }

    #[test]
    fn api_errors_show_server_message() {
        let err = ClientError::Api {
            status: 503,
            code: String::new(),
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(
            status_for(&err),
            ConnectionStatus::Error("Service Unavailable".to_string())
        );
    }
}
