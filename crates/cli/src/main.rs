//! `bookshelf`: run the catalog server or manage books on a running one.

use anyhow::Context;
use bookshelf_app::{app, Application};
use bookshelf_client::{render, Console, NotificationLevel, View};
use bookshelf_kernel::settings::{Settings, TelemetrySettings};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "bookshelf")]
#[command(about = "Book catalog server and admin client", long_about = None)]
#[command(version)]
struct Cli {
    /// API server to talk to (defaults to `client.base_url` from config)
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server until Ctrl-C
    Serve,

    /// Apply pending schema migrations and exit
    Migrate,

    /// Check whether the API server is reachable
    Status,

    /// List and edit books on a running server
    Books {
        #[command(subcommand)]
        command: BooksCommand,
    },

    /// Print the endpoint reference
    Docs,
}

#[derive(Subcommand)]
enum BooksCommand {
    /// Show every book
    List {
        #[arg(long, value_enum, default_value = "grid")]
        view: ListView,
    },

    /// Show one book
    Show {
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// Add a new book
    Add(NewBookArgs),

    /// Change fields of an existing book
    Edit {
        #[arg(value_name = "ID")]
        id: i64,

        #[command(flatten)]
        changes: BookChanges,
    },

    /// Delete a book
    Remove {
        #[arg(value_name = "ID")]
        id: i64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ListView {
    Grid,
    Table,
}

#[derive(Args)]
struct NewBookArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    author: String,
    #[arg(long)]
    year: String,
    #[arg(long)]
    genre: String,
    #[arg(long)]
    price: String,
}

#[derive(Args)]
struct BookChanges {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    year: Option<String>,
    #[arg(long)]
    genre: Option<String>,
    #[arg(long)]
    price: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;

    match cli.command {
        Commands::Serve => {
            bookshelf_telemetry::init(&settings.telemetry)?;
            let application = Application::bootstrap(settings).await?;
            application.serve(app::shutdown_signal()).await
        }
        Commands::Migrate => migrate(settings).await,
        Commands::Status => status(&mut console(cli.base_url, &settings)?).await,
        Commands::Docs => {
            let mut console = console(cli.base_url, &settings)?;
            console.set_view(View::Docs);
            print!("{}", console.render());
            Ok(())
        }
        Commands::Books { command } => {
            books(&mut console(cli.base_url, &settings)?, command).await
        }
    }
}

async fn migrate(settings: Settings) -> anyhow::Result<()> {
    bookshelf_telemetry::init(&settings.telemetry)?;

    match app::migrate(&settings).await? {
        Some(applied) => println!("Applied {} migration(s).", applied),
        None => println!("The memory backend has no schema; nothing to migrate."),
    }
    Ok(())
}

/// Set up quiet logging and a console for the chosen server.
fn console(base_url: Option<String>, settings: &Settings) -> anyhow::Result<Console> {
    // RUST_LOG still overrides.
    bookshelf_telemetry::init(&TelemetrySettings {
        level: "warn".to_string(),
        ..settings.telemetry.clone()
    })?;

    let base_url = base_url.unwrap_or_else(|| settings.client.base_url.clone());
    Ok(Console::new(&base_url)?)
}

async fn status(console: &mut Console) -> anyhow::Result<()> {
    let status = console.check_health().await.clone();
    println!("{}", render::status_badge(console.base_url(), &status));

    if let Ok(report) = console.client().health().await {
        for check in report.checks {
            println!(
                "  {:<10} {:?}  {}",
                check.name,
                check.status,
                check.description.unwrap_or_default()
            );
        }
    }
    Ok(())
}

async fn books(console: &mut Console, command: BooksCommand) -> anyhow::Result<()> {
    match command {
        BooksCommand::List { view } => {
            console.load_books().await?;
            console.set_view(match view {
                ListView::Grid => View::Grid,
                ListView::Table => View::Table,
            });
            print!("{}", console.render());
        }
        BooksCommand::Show { id } => {
            let book = console.client().get_book(id).await?;
            print!("{}", render::grid(std::slice::from_ref(&book)));
        }
        BooksCommand::Add(args) => {
            console.open_create()?;
            if let Some(draft) = console.draft_mut() {
                draft.title = args.title;
                draft.author = args.author;
                draft.year = args.year;
                draft.genre = args.genre;
                draft.price = args.price;
            }
            submit(console).await?;
        }
        BooksCommand::Edit { id, changes } => {
            console.load_books().await?;
            console.open_edit(id)?;
            if let Some(draft) = console.draft_mut() {
                let fields = [
                    (&mut draft.title, changes.title),
                    (&mut draft.author, changes.author),
                    (&mut draft.year, changes.year),
                    (&mut draft.genre, changes.genre),
                    (&mut draft.price, changes.price),
                ];
                for (slot, value) in fields {
                    if let Some(value) = value {
                        *slot = value;
                    }
                }
            }
            submit(console).await?;
        }
        BooksCommand::Remove { id } => {
            console.load_books().await?;
            let deleted = console.delete_book(id).await;
            print_notifications(console);
            deleted?;
        }
    }

    Ok(())
}

async fn submit(console: &mut Console) -> anyhow::Result<()> {
    let saved = console.submit().await;
    print_notifications(console);
    let book = saved?;
    print!("{}", render::grid(std::slice::from_ref(&book)));
    Ok(())
}

fn print_notifications(console: &mut Console) {
    for notification in console.take_notifications() {
        match notification.level {
            NotificationLevel::Success => {
                println!("{}: {}", notification.title, notification.description)
            }
            NotificationLevel::Error => {
                eprintln!("{}: {}", notification.title, notification.description)
            }
        }
    }
}
