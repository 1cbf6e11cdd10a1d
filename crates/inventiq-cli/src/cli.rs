use clap::{Args, Parser, Subcommand, ValueEnum};
use inventiq_core::api::DEFAULT_FORECAST_DAYS;
use inventiq_core::models::{ProductDraft, ProductUpdate, TransactionType};

#[derive(Parser, Debug)]
#[command(name = "inventiq", version, about = "InventIQ inventory management from the terminal")]
pub struct Cli {
    /// Backend address, e.g. http://localhost:5000/api
    #[arg(long, global = true, env = "INVENTIQ_API_URL")]
    pub api_url: Option<String>,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and remember the session on this machine
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Keep the password in the OS keychain for next time
        #[arg(long)]
        remember: bool,
    },
    /// Create an account (does not sign in)
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
    /// Forget the stored session
    Logout {
        /// Also remove the remembered password from the keychain
        #[arg(long)]
        forget: bool,
    },
    /// Show who is signed in
    Status,
    /// Inventory records
    #[command(subcommand)]
    Products(ProductsCommand),
    /// Record a sale or purchase
    Transaction {
        product_id: String,
        quantity: i64,
        #[arg(long = "type", value_enum, default_value_t = TransactionKind::Sale)]
        kind: TransactionKind,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Demand forecast for one product
    Forecast {
        product_id: String,
        #[arg(long, default_value_t = DEFAULT_FORECAST_DAYS)]
        days: u32,
    },
    /// Restock recommendation for one product, or for everything running low
    Restock {
        #[arg(required_unless_present = "low_stock")]
        product_id: Option<String>,
        /// Treat the product as trending (larger safety stock)
        #[arg(long)]
        trending: bool,
        /// Check every product at or below its reorder level
        #[arg(long, conflicts_with = "product_id")]
        low_stock: bool,
    },
    /// Headline inventory numbers
    Dashboard,
    /// Ask the inventory assistant a question
    Ask {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        #[arg(long)]
        product: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProductsCommand {
    List,
    Get { id: String },
    Add(ProductFields),
    Update {
        id: String,
        #[command(flatten)]
        changes: ProductChanges,
    },
    Delete { id: String },
}

#[derive(Args, Debug)]
pub struct ProductFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub category: String,
    #[arg(long)]
    pub supplier: String,
    #[arg(long, default_value_t = 0)]
    pub stock: i64,
    #[arg(long, default_value_t = 0)]
    pub reorder_level: i64,
    #[arg(long)]
    pub purchase_price: f64,
    #[arg(long)]
    pub selling_price: f64,
    /// Supplier lead time in days
    #[arg(long, default_value_t = 7)]
    pub lead_time: i64,
}

impl From<ProductFields> for ProductDraft {
    fn from(f: ProductFields) -> Self {
        ProductDraft {
            name: f.name,
            category: f.category,
            supplier: f.supplier,
            current_stock: f.stock,
            reorder_level: f.reorder_level,
            purchase_price: f.purchase_price,
            selling_price: f.selling_price,
            lead_time: f.lead_time,
            ..Default::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct ProductChanges {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub supplier: Option<String>,
    #[arg(long)]
    pub stock: Option<i64>,
    #[arg(long)]
    pub reorder_level: Option<i64>,
    #[arg(long)]
    pub purchase_price: Option<f64>,
    #[arg(long)]
    pub selling_price: Option<f64>,
    #[arg(long)]
    pub lead_time: Option<i64>,
}

impl From<ProductChanges> for ProductUpdate {
    fn from(c: ProductChanges) -> Self {
        ProductUpdate {
            name: c.name,
            category: c.category,
            supplier: c.supplier,
            current_stock: c.stock,
            reorder_level: c.reorder_level,
            purchase_price: c.purchase_price,
            selling_price: c.selling_price,
            lead_time: c.lead_time,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Sale,
    Purchase,
}

impl From<TransactionKind> for TransactionType {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Sale => TransactionType::Sale,
            TransactionKind::Purchase => TransactionType::Purchase,
        }
    }
}
