mod cli;
mod db;
mod error;
mod fmt;
mod mappings;
mod models;
mod profiles;
mod settings;
mod transactions;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{BanksCommands, Cli, Commands, MappingsCommands, TransactionsCommands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Status => cli::status::run(),
        Commands::Banks { command } => match command {
            BanksCommands::Add {
                bank_name,
                bank_id,
                mid,
                merchant_name,
                transaction_type,
                rule_mapping,
            } => cli::banks::add(
                &bank_name,
                &bank_id,
                &mid,
                &merchant_name,
                transaction_type,
                rule_mapping.as_deref(),
            ),
            BanksCommands::Update {
                bank_id,
                bank_name,
                mid,
                merchant_name,
                transaction_type,
                rule_mapping,
            } => cli::banks::update(
                &bank_id,
                cli::banks::ProfileChanges {
                    bank_name,
                    mid,
                    merchant_name,
                    transaction_type,
                    rule_mapping,
                },
            ),
            BanksCommands::List => cli::banks::list(),
            BanksCommands::Remove { bank_id } => cli::banks::remove(&bank_id),
        },
        Commands::Mappings { command } => match command {
            MappingsCommands::Add {
                bank_id,
                bank_name,
                headers,
                header,
            } => cli::mappings::add(&bank_id, &bank_name, headers.as_deref(), &header),
            MappingsCommands::List { bank_id } => cli::mappings::list(bank_id.as_deref()),
            MappingsCommands::Show { id } => cli::mappings::show(id),
            MappingsCommands::Remove { id } => cli::mappings::remove(id),
        },
        Commands::Transactions { command } => match command {
            TransactionsCommands::Add { json } => cli::transactions::add(&json),
            TransactionsCommands::List { order_id, limit } => {
                cli::transactions::list(order_id.as_deref(), limit)
            }
            TransactionsCommands::Show { id } => cli::transactions::show(id),
            TransactionsCommands::Export { output } => cli::transactions::export(output),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
