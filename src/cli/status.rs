use crate::db::get_connection;
use crate::error::Result;
use crate::settings::{get_data_dir, get_db_path, load_settings};
use crate::transactions;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = get_db_path();

    println!("User:       {}", if settings.user_name.is_empty() { "(not set)" } else { &settings.user_name });
    println!("Data dir:   {}", get_data_dir().display());
    println!("Database:   {}", db_path.display());

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `bankrecon init` to set up.");
        return Ok(());
    }

    let conn = get_connection(&db_path)?;
    let banks: i64 = conn.query_row("SELECT count(*) FROM bank_details", [], |r| r.get(0))?;
    let mappings: i64 = conn.query_row("SELECT count(*) FROM bank_mappings", [], |r| r.get(0))?;
    let txns = transactions::count(&conn)?;

    println!();
    println!("Bank profiles:   {banks}");
    println!("Header mappings: {mappings}");
    println!("Transactions:    {txns}");
    Ok(())
}
