use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::{ReconError, Result};
use crate::fmt::{amount, opt_amount};
use crate::models::TransactionRecord;
use crate::settings::{get_data_dir, get_db_path, load_settings};
use crate::transactions;

pub fn add(json: &str) -> Result<()> {
    let mut txn: TransactionRecord = serde_json::from_str(json)?;
    if txn.user_name.is_none() {
        let user = load_settings().user_name;
        if !user.is_empty() {
            txn.user_name = Some(user);
        }
    }
    let conn = get_connection(&get_db_path())?;
    let id = transactions::insert(&conn, &txn)?;
    println!("Added transaction {id}: {txn}");
    Ok(())
}

pub fn list(order_id: Option<&str>, limit: usize) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    let rows = match order_id {
        Some(order_id) => transactions::find_by_order_id(&conn, order_id)?,
        None => transactions::list(&conn, limit)?,
    };

    let mut table = Table::new();
    table.set_header(vec!["ID", "Order ID", "Txn ID", "MID", "Settled", "Type", "Gross", "Payable", "Recon"]);
    for t in &rows {
        table.add_row(vec![
            Cell::new(t.id.unwrap_or_default()),
            Cell::new(t),
            Cell::new(t.transaction_id.as_deref().unwrap_or_default()),
            Cell::new(&t.mid),
            Cell::new(t.settlement_date),
            Cell::new(&t.transaction_type),
            Cell::new(opt_amount(t.gross_amount)),
            Cell::new(amount(t.payable_merchant)),
            Cell::new(t.recon_status.as_deref().unwrap_or_default()),
        ]);
    }
    println!("Transactions\n{table}");
    if rows.is_empty() {
        println!("{}", "No transactions found.".dimmed());
    }
    Ok(())
}

pub fn show(id: i64) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    let txn = transactions::get(&conn, id)?
        .ok_or_else(|| ReconError::NotFound(format!("transaction {id}")))?;
    println!("{}", serde_json::to_string_pretty(&txn)?);
    Ok(())
}

pub fn export(output: Option<String>) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    let path = match output {
        Some(p) => PathBuf::from(p),
        None => {
            let date = chrono::Local::now().format("%Y-%m-%d");
            get_data_dir().join("exports").join(format!("transactions-{date}.csv"))
        }
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(&path)?;
    let written = transactions::export_csv(&conn, file)?;
    println!("Exported {written} transactions to {}", path.display().to_string().bold());
    Ok(())
}
