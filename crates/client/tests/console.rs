use bookshelf_app::Application;
use bookshelf_client::{
    ApiClient, ClientError, ConnectionStatus, Console, FormState, NotificationLevel, View,
};
use bookshelf_kernel::settings::Settings;
use rust_decimal::Decimal;
use tokio::net::TcpListener;

/// Serve a freshly seeded in-memory catalog on an ephemeral port.
async fn spawn_server() -> String {
    let application = Application::bootstrap(Settings::default()).await.unwrap();
    let router = application.router();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _application = application;
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", address)
}

#[tokio::test]
async fn api_client_crud() {
    let base_url = spawn_server().await;
    let client = ApiClient::new(&base_url).unwrap();

    let books = client.list_books().await.unwrap();
    assert_eq!(books.len(), 5);

    let mut book = books[0].clone();
    book.id = 0;
    book.title = "Copy".to_string();
    let created = client.create_book(&book).await.unwrap();
    assert!(created.id > 5);
    assert_eq!(client.get_book(created.id).await.unwrap(), created);

    let mut changed = created.clone();
    changed.price = Decimal::new(1250, 2);
    let updated = client.update_book(&changed).await.unwrap();
    assert_eq!(updated, changed);

    client.delete_book(created.id).await.unwrap();
    let err = client.get_book(created.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn server_validation_errors_surface_as_api_errors() {
    let base_url = spawn_server().await;
    let client = ApiClient::new(&base_url).unwrap();

    let mut book = client.list_books().await.unwrap().remove(0);
    book.price = Decimal::new(2000, 0);

    match client.create_book(&book).await.unwrap_err() {
        ClientError::Api { status, code, .. } => {
            assert_eq!(status, 422);
            assert_eq!(code, "validation_error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn console_add_edit_delete_flow() {
    let base_url = spawn_server().await;
    let mut console = Console::new(&base_url).unwrap();

    assert_eq!(console.check_health().await, &ConnectionStatus::Connected);
    assert_eq!(console.load_books().await.unwrap().len(), 5);

    console.open_create().unwrap();
    {
        let draft = console.draft_mut().unwrap();
        draft.title = "Working Effectively with Legacy Code".to_string();
        draft.author = "Michael Feathers".to_string();
        draft.year = "2004".to_string();
        draft.genre = "Software Engineering".to_string();
        draft.price = "47.50".to_string();
    }
    let created = console.submit().await.unwrap();
    assert_eq!(console.form(), &FormState::Closed);
    assert_eq!(console.books().len(), 6);

    let added = console.take_notifications();
    assert_eq!(added[0].level, NotificationLevel::Success);
    assert_eq!(added[0].title, "Book added successfully");
    assert_eq!(
        added[0].description,
        "\"Working Effectively with Legacy Code\" has been added to the library."
    );

    console.open_edit(created.id).unwrap();
    console.draft_mut().unwrap().price = "39.00".to_string();
    let updated = console.submit().await.unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.price, Decimal::new(3900, 2));
    assert_eq!(console.take_notifications()[0].title, "Book updated successfully");

    console.delete_book(created.id).await.unwrap();
    assert_eq!(console.books().len(), 5);
    assert_eq!(console.load_books().await.unwrap().len(), 5);

    console.set_view(View::Table);
    assert!(console.render().contains("Domain-Driven Design"));
}

#[tokio::test]
async fn failed_save_keeps_form_open() {
    let base_url = spawn_server().await;
    let mut console = Console::new(&base_url).unwrap();
    console.load_books().await.unwrap();

    console.open_edit(1).unwrap();
    console.client().delete_book(1).await.unwrap();
    console.draft_mut().unwrap().title = "Gone".to_string();

    let err = console.submit().await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(console.form(), FormState::Open { .. }));
    assert_eq!(console.draft_mut().unwrap().title, "Gone");
    assert_eq!(console.status(), &ConnectionStatus::Connected);

    let notifications = console.take_notifications();
    assert_eq!(notifications[0].level, NotificationLevel::Error);
    assert_eq!(notifications[0].title, "Error saving book");
}

#[tokio::test]
async fn unreachable_server_is_not_connected() {
    let mut console = Console::new("http://127.0.0.1:1").unwrap();
    assert_eq!(console.check_health().await, &ConnectionStatus::NotConnected);
    assert!(console.load_books().await.unwrap_err().is_connectivity());
    assert!(console.books().is_empty());
}

#[tokio::test]
async fn changing_base_url_rechecks_health() {
    let base_url = spawn_server().await;
    let mut console = Console::new("http://127.0.0.1:1").unwrap();
    assert_eq!(console.check_health().await, &ConnectionStatus::NotConnected);

    let status = console.set_base_url(&format!("{}/", base_url)).await.unwrap();
    assert_eq!(status, &ConnectionStatus::Connected);
    assert_eq!(console.base_url(), base_url);

    assert!(console.set_base_url("not a url").await.is_err());
    assert_eq!(console.status(), &ConnectionStatus::NotConnected);
    assert_eq!(console.base_url(), base_url);
}
