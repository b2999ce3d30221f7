//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use stockpulse_realtime::{AlertItem, Notification};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Notification display row for table output
#[derive(Debug, Serialize, Tabled)]
pub struct NotificationRow {
    /// Notification ID
    pub id: String,
    /// Category
    pub kind: String,
    /// Message
    pub message: String,
    /// Products, with stock against minimum
    pub products: String,
    /// Occurred at
    pub occurred_at: String,
    /// Read flag
    pub read: bool,
}

impl From<&Notification> for NotificationRow {
    fn from(n: &Notification) -> Self {
        let products = n
            .items
            .iter()
            .map(|item| format!("{} ({}/{})", item.name, item.stock, item.min_amount))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            id: n.id.to_string(),
            kind: n.kind.clone(),
            message: n.message.clone(),
            products,
            occurred_at: n.occurred_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            read: n.read,
        }
    }
}

/// Product display row for table output
#[derive(Debug, Serialize, Tabled)]
pub struct ProductRow {
    /// Product ID
    pub id: i64,
    /// Code
    pub code: String,
    /// Name
    pub name: String,
    /// Price
    pub price: f64,
    /// Stock
    pub stock: f64,
    /// Minimum
    pub min_amount: f64,
}

impl From<&AlertItem> for ProductRow {
    fn from(item: &AlertItem) -> Self {
        Self {
            id: item.id,
            code: item.code.clone().unwrap_or_else(|| "-".to_string()),
            name: item.name.clone(),
            price: item.price,
            stock: item.stock,
            min_amount: item.min_amount,
        }
    }
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                let table = Table::new(items).to_string();
                println!("{}", table);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{}", json);
        }
    }
}

/// Print a single item in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("{:#?}", item);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
            println!("{}", json);
        }
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {}", msg);
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{}:", key), value);
}
