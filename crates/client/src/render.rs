//! Plain-text renderings of the console views.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};

use crate::console::ConnectionStatus;
use crate::models::Book;

const EMPTY_TITLE: &str = "No books loaded";
const EMPTY_HINT: &str = "Check the API connection or add a new book.";

fn price(book: &Book) -> String {
    format!("$ {:.2}", book.price)
}

/// One card per book.
pub fn grid(books: &[Book]) -> String {
    if books.is_empty() {
        return format!("{}\n{}\n", EMPTY_TITLE, EMPTY_HINT);
    }

    let mut out = String::new();
    for book in books {
        out.push_str(&format!("[{}] {}\n", book.id, book.title));
        out.push_str(&format!("    by {} ({})\n", book.author, book.year));
        if let Some(genre) = &book.genre {
            out.push_str(&format!("    {}\n", genre));
        }
        out.push_str(&format!("    {}\n\n", price(book)));
    }
    out
}

/// All books in one table.
pub fn table(books: &[Book]) -> String {
    if books.is_empty() {
        return format!("{}\n{}\n", EMPTY_TITLE, EMPTY_HINT);
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Title", "Author", "Year", "Genre", "Price"]);

    for book in books {
        table.add_row(vec![
            Cell::new(book.id).set_alignment(CellAlignment::Right),
            Cell::new(&book.title),
            Cell::new(&book.author),
            Cell::new(book.year).set_alignment(CellAlignment::Right),
            Cell::new(book.genre.as_deref().unwrap_or("-")),
            Cell::new(price(book)).set_alignment(CellAlignment::Right),
        ]);
    }

    format!("{}\n", table)
}

/// Endpoint reference for the server at `base_url`.
pub fn docs(base_url: &str) -> String {
    let endpoints = [
        ("GET", "/api/books", "List all books"),
        ("GET", "/api/books/{id}", "Get a book by ID"),
        ("POST", "/api/books", "Create a new book"),
        ("PUT", "/api/books/{id}", "Update a book"),
        ("DELETE", "/api/books/{id}", "Delete a book"),
        ("GET", "/api/health", "Check API and store health"),
    ];

    let mut out = String::from("API Documentation\n\n");
    for (method, path, summary) in endpoints {
        out.push_str(&format!("  {:<7}{}{:<20}  {}\n", method, base_url, path, summary));
    }
    out.push_str(&format!("\nSwagger UI: {}/swagger-ui\n", base_url));
    out.push_str(&format!("OpenAPI document: {}/docs/openapi.json\n", base_url));
    out
}

/// One-line connectivity indicator.
pub fn status_badge(base_url: &str, status: &ConnectionStatus) -> String {
    let marker = match status {
        ConnectionStatus::Connected => "●",
        ConnectionStatus::Checking => "◌",
        ConnectionStatus::NotConnected | ConnectionStatus::Error(_) => "○",
    };
    format!("{} {} ({})", marker, status, base_url)
}
