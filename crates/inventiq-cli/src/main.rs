//! InventIQ CLI - inventory management from the terminal.
//!
//! Signs in against the InventIQ backend, keeps the session between runs,
//! and exposes inventory, forecasting and assistant queries as commands.

mod app;
mod cli;
mod output;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use inventiq_core::ApiError;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use cli::{Cli, Command, ProductsCommand};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_tracing();
    info!("InventIQ CLI starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.downcast_ref::<ApiError>().is_some_and(ApiError::is_unauthorized) {
                eprintln!("Your session may have expired. Run `inventiq login` to sign in again.");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut app = App::new(cli.api_url, cli.json)?;
    debug!(command = ?cli.command, "Dispatching");

    match cli.command {
        Command::Login { email, remember } => app.login(email, remember).await,
        Command::Register { username, email } => app.register(&username, &email).await,
        Command::Logout { forget } => app.logout(forget),
        Command::Status => app.status(),
        Command::Products(cmd) => match cmd {
            ProductsCommand::List => app.list_products().await,
            ProductsCommand::Get { id } => app.show_product(&id).await,
            ProductsCommand::Add(fields) => app.add_product(fields.into()).await,
            ProductsCommand::Update { id, changes } => app.update_product(&id, changes.into()).await,
            ProductsCommand::Delete { id } => app.delete_product(&id).await,
        },
        Command::Transaction {
            product_id,
            quantity,
            kind,
            notes,
        } => {
            app.record_transaction(&product_id, quantity, kind.into(), notes)
                .await
        }
        Command::Forecast { product_id, days } => app.forecast(&product_id, days).await,
        Command::Restock {
            product_id,
            trending,
            low_stock,
        } => match product_id {
            Some(id) if !low_stock => app.restock(&id, trending).await,
            _ => app.restock_low_stock(trending).await,
        },
        Command::Dashboard => app.dashboard().await,
        Command::Ask { query, product } => app.ask(&query.join(" "), product.as_deref()).await,
    }
}
