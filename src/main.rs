use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::process::ExitCode;

use bookcafe::form::{Form, SubmitOutcome};
use bookcafe::services::{BeverageService, BookService, OrderService};
use bookcafe::{AppState, ResourceState, config, telemetry};

#[derive(Parser)]
#[command(name = "bookcafe", version, about = "Library & cafe client")]
struct Cli {
    /// Backend base URL (overrides API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(subcommand)]
    Beverages(BeverageCommand),
    #[command(subcommand)]
    Books(BookCommand),
    /// List book genres
    Genres,
    #[command(subcommand)]
    Orders(OrderCommand),
}

#[derive(Subcommand)]
enum BeverageCommand {
    /// Show the menu
    List,
    /// Add a beverage to the menu
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, allow_negative_numbers = true)]
        price: f64,
        #[arg(long)]
        description: String,
        #[arg(long)]
        image_url: String,
    },
}

#[derive(Args)]
struct BookFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    author: Option<String>,
    /// RFC 3339, e.g. 2024-01-01T00:00:00Z
    #[arg(long)]
    published_at: Option<DateTime<Utc>>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    summary: Option<String>,
    #[arg(long)]
    genre_id: Option<i64>,
}

impl BookFields {
    /// Apply only the flags that were given
    fn apply(self, form: &mut Form) {
        if let Some(v) = self.title {
            form.set("title", v);
        }
        if let Some(v) = self.author {
            form.set("author", v);
        }
        if let Some(v) = self.published_at {
            form.set("publishedAt", v);
        }
        if let Some(v) = self.description {
            form.set("description", v);
        }
        if let Some(v) = self.summary {
            form.set("summary", v);
        }
        if let Some(v) = self.genre_id {
            form.set("genreId", v);
        }
    }
}

#[derive(Subcommand)]
enum BookCommand {
    Show { id: i64 },
    Create {
        #[command(flatten)]
        fields: BookFields,
    },
    /// Patch a book; omitted flags keep their current value
    Edit {
        id: i64,
        #[command(flatten)]
        fields: BookFields,
    },
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum OrderCommand {
    /// Order history with line totals
    List,
    Create {
        #[arg(long)]
        beverage: i64,
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        quantity: i64,
        #[arg(long, default_value = "")]
        note: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Failed to render output: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn render<T: Serialize>(state: ResourceState<T>) -> ExitCode {
    match (state.data, state.error) {
        (_, Some(e)) => {
            tracing::error!("เกิดข้อผิดพลาดในการอ่านข้อมูล: {}", e);
            ExitCode::FAILURE
        }
        (Some(data), None) => print_json(&data),
        (None, None) => ExitCode::SUCCESS,
    }
}

fn outcome(result: SubmitOutcome) -> ExitCode {
    match result {
        SubmitOutcome::Succeeded { .. } => ExitCode::SUCCESS,
        SubmitOutcome::Invalid(errors) => {
            for (field, message) in &errors.fields {
                eprintln!("{}: {}", field, message);
            }
            ExitCode::from(2)
        }
        // Already reported through the notifier
        SubmitOutcome::Failed(_) | SubmitOutcome::Busy => ExitCode::FAILURE,
    }
}

async fn run(cli: Cli, state: AppState) -> ExitCode {
    match cli.command {
        Command::Beverages(BeverageCommand::List) => {
            render(BeverageService::new(state).list().await)
        }
        Command::Beverages(BeverageCommand::Create {
            name,
            price,
            description,
            image_url,
        }) => {
            let mut form = BeverageService::create_form();
            form.set("name", name)
                .set("price", price)
                .set("description", description)
                .set("imageUrl", image_url);
            outcome(BeverageService::new(state).create(form.values()).await)
        }
        Command::Books(BookCommand::Show { id }) => render(BookService::new(state).get(id).await),
        Command::Books(BookCommand::Create { fields }) => {
            let mut form = BookService::blank_form();
            fields.apply(&mut form);
            outcome(BookService::new(state).create(form.values()).await)
        }
        Command::Books(BookCommand::Edit { id, fields }) => {
            let service = BookService::new(state);
            let current = service.get(id).await;
            let book = match current.data {
                Some(book) => book,
                None => return render(current),
            };
            let mut form = BookService::edit_form(&book);
            fields.apply(&mut form);
            outcome(service.update(id, form.values()).await)
        }
        Command::Books(BookCommand::Delete { id }) => {
            outcome(BookService::new(state).delete(id).await)
        }
        Command::Genres => render(BookService::new(state).genres().await),
        Command::Orders(OrderCommand::List) => {
            let service = OrderService::new(state);
            let orders = service.list_with_beverages().await;
            if let Some(list) = &orders.data {
                let summary = bookcafe::models::OrderSummary::from_orders(list);
                tracing::info!(
                    orders = summary.total_orders,
                    quantity = summary.total_quantity,
                    "ยอดรวม ฿{:.2}",
                    summary.grand_total
                );
            }
            render(orders)
        }
        Command::Orders(OrderCommand::Create {
            beverage,
            quantity,
            note,
        }) => {
            // Warm the cache so the confirmation can name the beverage
            let beverages = BeverageService::new(state.clone());
            if let Some(e) = beverages.get(Some(beverage)).await.error {
                tracing::error!("เกิดข้อผิดพลาดในการโหลดข้อมูลเครื่องดื่ม: {}", e);
                return ExitCode::FAILURE;
            }

            let mut form = OrderService::order_form();
            form.set("quantity", quantity).set("note", note);
            match OrderService::new(state)
                .create(Some(beverage), form.values())
                .await
            {
                Some(result) => outcome(result),
                None => ExitCode::FAILURE,
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    dotenvy::dotenv().ok();
    telemetry::init(None);

    let cli = Cli::parse();

    let mut config = config::Config::from_env();
    if let Some(url) = &cli.base_url {
        config.api_base_url = config::Config::with_base_url(url).api_base_url;
    }
    tracing::debug!("Using backend {}", config.api_base_url);

    let state = match AppState::new(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    run(cli, state).await
}
