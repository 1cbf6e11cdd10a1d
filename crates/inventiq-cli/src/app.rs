//! Application state and command handlers.
//!
//! `App` owns the configuration and the one `SessionStore` for this process.
//! Commands that only need the backend go through `session.api()` and never
//! look at authentication state themselves.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use futures::future::join_all;
use inventiq_core::auth::{CredentialStore, FileStorage, KeyValueStore};
use inventiq_core::models::{InventorySummary, ProductDraft, ProductUpdate, Transaction, TransactionType};
use inventiq_core::voice::{Speaker, VoiceAssistant};
use inventiq_core::{ApiClient, Config, SessionStore};
use serde::Serialize;
use tracing::{debug, warn};

use crate::output;

/// Maximum accepted email length at the prompt
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum accepted password length at the prompt
const MAX_PASSWORD_LENGTH: usize = 128;

pub struct App {
    config: Config,
    session: SessionStore,
    json: bool,
}

impl App {
    /// Load config, open storage and rehydrate the session
    pub fn new(api_url: Option<String>, json: bool) -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let api_url = api_url.unwrap_or_else(|| config.api_url());
        let data_dir = config.data_dir().context("Could not locate session storage")?;
        debug!(%api_url, ?data_dir, "Configured");

        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStorage::in_dir(&data_dir));
        let api = ApiClient::new(&api_url, storage.clone())?;
        let session = SessionStore::restore(storage, api);

        Ok(Self { config, session, json })
    }

    fn api(&self) -> &ApiClient {
        self.session.api()
    }

    fn print<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            print!("{}", text());
        }
        Ok(())
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn login(&mut self, email: Option<String>, remember: bool) -> Result<()> {
        let email = match email {
            Some(email) => email,
            None => prompt_email(self.config.last_email.as_deref())?,
        };
        if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
            bail!("Email required");
        }

        let password = if CredentialStore::has_credentials(&email) && confirm("Use stored password? [Y/n]: ")? {
            CredentialStore::get_password(&email)?
        } else {
            prompt_password("Password: ")?
        };

        eprintln!("Authenticating...");
        let user = self
            .session
            .login(&email, &password)
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;

        if remember {
            if let Err(e) = CredentialStore::store(&email, &password) {
                warn!(error = %e, "Failed to store credentials");
            }
        }

        self.config.last_email = Some(email);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        println!("Logged in as {} ({})", user.username, user.role);
        Ok(())
    }

    pub async fn register(&self, username: &str, email: &str) -> Result<()> {
        let password = prompt_password("Password: ")?;
        let confirm_password = prompt_password("Confirm password: ")?;
        if password != confirm_password {
            bail!("Passwords do not match");
        }

        self.session
            .register(username, email, &password)
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;

        println!("Account created. Run `inventiq login --email {}` to sign in.", email);
        Ok(())
    }

    pub fn logout(&self, forget: bool) -> Result<()> {
        let email = self.session.identity().map(|u| u.email).or_else(|| self.config.last_email.clone());
        self.session.logout();

        if forget {
            if let Some(email) = email {
                CredentialStore::delete(&email)?;
            }
        }
        println!("Logged out");
        Ok(())
    }

    pub fn status(&self) -> Result<()> {
        let state = self.session.snapshot();
        match state.identity() {
            Some(user) if state.is_authenticated() => {
                println!("Logged in as {} <{}> ({})", user.username, user.email, user.role);
            }
            _ => println!("Not logged in"),
        }
        println!("Backend: {}", self.api().base_url());
        Ok(())
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    pub async fn list_products(&self) -> Result<()> {
        let products = self.api().list_products().await?;
        self.print(&products, || output::product_table(&products))
    }

    pub async fn show_product(&self, id: &str) -> Result<()> {
        let product = self.api().get_product(id).await?;
        self.print(&product, || output::product_detail(&product))
    }

    pub async fn add_product(&self, draft: ProductDraft) -> Result<()> {
        let product = self.api().add_product(&draft).await?;
        self.print(&product, || format!("Created product {} ({})\n", product.name, product.id))
    }

    pub async fn update_product(&self, id: &str, update: ProductUpdate) -> Result<()> {
        if update.is_empty() {
            bail!("Nothing to update");
        }
        let product = self.api().update_product(id, &update).await?;
        self.print(&product, || output::product_detail(&product))
    }

    pub async fn delete_product(&self, id: &str) -> Result<()> {
        let ack = self.api().delete_product(id).await?;
        self.print(&ack, || {
            format!("{}\n", ack.message.clone().unwrap_or_else(|| format!("Deleted product {}", id)))
        })
    }

    pub async fn record_transaction(
        &self,
        product_id: &str,
        quantity: i64,
        kind: TransactionType,
        notes: Option<String>,
    ) -> Result<()> {
        if quantity <= 0 {
            bail!("Quantity must be positive");
        }
        let mut transaction = Transaction::new(product_id, quantity, kind);
        transaction.notes = notes;

        let ack = self.api().record_transaction(&transaction).await?;
        self.print(&ack, || {
            format!("{}\n", ack.message.clone().unwrap_or_else(|| "Transaction recorded".to_string()))
        })
    }

    // =========================================================================
    // Predictions
    // =========================================================================

    pub async fn forecast(&self, product_id: &str, days: u32) -> Result<()> {
        let forecast = self.api().demand_forecast(product_id, days).await?;
        self.print(&forecast, || output::forecast(product_id, &forecast))
    }

    pub async fn restock(&self, product_id: &str, trending: bool) -> Result<()> {
        let rec = self.api().restock_recommendation(product_id, trending).await?;
        self.print(&rec, || output::restock(product_id, &rec))
    }

    /// Recommendations for every product at or below its reorder level,
    /// fetched concurrently. Individual failures are reported and skipped.
    pub async fn restock_low_stock(&self, trending: bool) -> Result<()> {
        let products = self.api().list_products().await?;
        let low: Vec<_> = products.into_iter().filter(|p| p.needs_reorder()).collect();
        if low.is_empty() {
            println!("Nothing is running low");
            return Ok(());
        }

        let api = self.api();
        let futures = low.iter().map(|p| api.restock_recommendation(&p.id, trending));
        let results = join_all(futures).await;

        let mut recommendations = Vec::new();
        for (product, result) in low.iter().zip(results) {
            match result {
                Ok(rec) => recommendations.push((product.id.clone(), rec)),
                Err(e) => eprintln!("{}: {}", product.id, e),
            }
        }

        self.print(&recommendations, || {
            recommendations
                .iter()
                .map(|(id, rec)| output::restock(id, rec))
                .collect()
        })
    }

    pub async fn dashboard(&self) -> Result<()> {
        let products = self.api().list_products().await?;
        let summary = InventorySummary::from_products(&products);
        self.print(&summary, || output::summary(&summary))
    }

    pub async fn ask(&self, query: &str, product_id: Option<&str>) -> Result<()> {
        let speaker = ConsoleSpeaker { quiet: self.json };
        let mut assistant = VoiceAssistant::new(self.api().clone(), Box::new(speaker));
        let Some(answer) = assistant.respond(query, product_id).await else {
            bail!("Ask a question");
        };

        if self.json {
            let reply = AssistantReply {
                query,
                product_id,
                response: &answer,
            };
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct AssistantReply<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_id: Option<&'a str>,
    response: &'a str,
}

/// Stands in for speech synthesis by writing the answer to stdout.
/// Quiet in JSON mode, where the answer is part of the structured output.
struct ConsoleSpeaker {
    quiet: bool,
}

impl Speaker for ConsoleSpeaker {
    fn speak(&mut self, text: &str) {
        if !self.quiet {
            println!("{}", text);
        }
    }
}

fn prompt_email(default: Option<&str>) -> Result<String> {
    match default {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match default {
        Some(last) if input.is_empty() => last.to_string(),
        _ => input.to_string(),
    })
}

fn prompt_password(prompt: &str) -> Result<String> {
    let password = rpassword::prompt_password(prompt)?;
    if password.chars().count() > MAX_PASSWORD_LENGTH || password.chars().any(char::is_control) {
        bail!("Password contains invalid characters or is too long");
    }
    Ok(password)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_lowercase() != "n")
}
