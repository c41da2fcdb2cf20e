pub mod banks;
pub mod init;
pub mod mappings;
pub mod status;
pub mod transactions;

use clap::{Parser, Subcommand};

use crate::models::TransactionType;

#[derive(Parser)]
#[command(name = "bankrecon", about = "Bank/merchant mappings and settlement transactions for reconciliation.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for data (default: ~/Documents/bankrecon)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Show current database and row counts.
    Status,
    /// Manage bank/merchant profiles.
    Banks {
        #[command(subcommand)]
        command: BanksCommands,
    },
    /// Manage per-bank header mappings.
    Mappings {
        #[command(subcommand)]
        command: MappingsCommands,
    },
    /// Add, browse and export transaction records.
    Transactions {
        #[command(subcommand)]
        command: TransactionsCommands,
    },
}

#[derive(Subcommand)]
pub enum BanksCommands {
    /// Add a bank/merchant profile.
    Add {
        /// Bank name, e.g. 'HDFC Bank'
        bank_name: String,
        /// Bank identifier (unique)
        #[arg(long = "bank-id")]
        bank_id: String,
        /// Merchant identifier (unique)
        #[arg(long)]
        mid: String,
        /// Merchant name
        #[arg(long = "merchant-name")]
        merchant_name: String,
        /// Transaction type: SALE, REFUND, NET SETTLED
        #[arg(long = "type", value_parser = parse_transaction_type)]
        transaction_type: TransactionType,
        /// Free-text rule mapping
        #[arg(long = "rule-mapping")]
        rule_mapping: Option<String>,
    },
    /// Change fields of an existing profile.
    Update {
        /// Bank identifier of the profile to change
        bank_id: String,
        #[arg(long = "bank-name")]
        bank_name: Option<String>,
        #[arg(long)]
        mid: Option<String>,
        #[arg(long = "merchant-name")]
        merchant_name: Option<String>,
        #[arg(long = "type", value_parser = parse_transaction_type)]
        transaction_type: Option<TransactionType>,
        #[arg(long = "rule-mapping")]
        rule_mapping: Option<String>,
    },
    /// List all profiles.
    List,
    /// Remove the profile with this bank identifier.
    Remove {
        bank_id: String,
    },
}

#[derive(Subcommand)]
pub enum MappingsCommands {
    /// Add a header mapping for a bank.
    Add {
        #[arg(long = "bank-id")]
        bank_id: String,
        #[arg(long = "bank-name")]
        bank_name: String,
        /// Headers as JSON, e.g. '[{"SALE": "AMOUNT"}]' or '{"SALE": ["AMOUNT"]}'
        #[arg(long, conflicts_with = "header", required_unless_present = "header")]
        headers: Option<String>,
        /// One TYPE=COLUMN pair; repeat to add more
        #[arg(long)]
        header: Vec<String>,
    },
    /// List header mappings.
    List {
        #[arg(long = "bank-id")]
        bank_id: Option<String>,
    },
    /// Print one mapping's grouped headers as JSON.
    Show {
        id: i64,
    },
    /// Remove a mapping by ID.
    Remove {
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum TransactionsCommands {
    /// Add one transaction from a JSON object.
    Add {
        /// JSON object; settlement_date and payable_merchant are required
        json: String,
    },
    /// List recent transactions.
    List {
        /// Only rows with this order id
        #[arg(long = "order-id")]
        order_id: Option<String>,
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Print one transaction as JSON.
    Show {
        id: i64,
    },
    /// Export all transactions to CSV.
    Export {
        /// Output path (default: <data_dir>/exports/transactions-YYYY-MM-DD.csv)
        #[arg(long)]
        output: Option<String>,
    },
}

fn parse_transaction_type(s: &str) -> std::result::Result<TransactionType, String> {
    s.parse().map_err(|e: crate::error::ReconError| e.to_string())
}
