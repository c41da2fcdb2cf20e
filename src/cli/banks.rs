use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::{ReconError, Result};
use crate::models::{BankAccountProfile, TransactionType};
use crate::profiles;
use crate::settings::get_db_path;

pub fn add(
    bank_name: &str,
    bank_id: &str,
    mid: &str,
    merchant_name: &str,
    transaction_type: TransactionType,
    rule_mapping: Option<&str>,
) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    let profile = BankAccountProfile {
        id: None,
        bank_name: bank_name.to_string(),
        bank_id: bank_id.to_string(),
        mid: mid.to_string(),
        merchant_name: merchant_name.to_string(),
        transaction_type,
        bank_rule_mapping: rule_mapping.map(str::to_string),
    };
    profiles::insert(&conn, &profile).map_err(|e| with_conflict_hint(&profile, e))?;
    println!("Added bank: {profile}");
    Ok(())
}

pub struct ProfileChanges {
    pub bank_name: Option<String>,
    pub mid: Option<String>,
    pub merchant_name: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub rule_mapping: Option<String>,
}

pub fn update(bank_id: &str, changes: ProfileChanges) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    let mut profile = profiles::find_by_bank_id(&conn, bank_id)?
        .ok_or_else(|| ReconError::NotFound(format!("bank {bank_id}")))?;
    if let Some(v) = changes.bank_name {
        profile.bank_name = v;
    }
    if let Some(v) = changes.mid {
        profile.mid = v;
    }
    if let Some(v) = changes.merchant_name {
        profile.merchant_name = v;
    }
    if let Some(v) = changes.transaction_type {
        profile.transaction_type = v;
    }
    if let Some(v) = changes.rule_mapping {
        profile.bank_rule_mapping = Some(v);
    }
    profiles::update(&conn, &profile).map_err(|e| with_conflict_hint(&profile, e))?;
    let id = profile.id.unwrap_or_default();
    let stored = profiles::get(&conn, id)?
        .ok_or_else(|| ReconError::NotFound(format!("profile {id}")))?;
    println!("Updated bank: {stored} [{}]", stored.transaction_type);
    Ok(())
}

fn conflict_hint(profile: &BankAccountProfile) -> String {
    format!(
        "bank_id '{}' or mid '{}' is already used by another profile, or a field is longer than allowed",
        profile.bank_id, profile.mid
    )
}

/// Print a hint next to store constraint failures; the error itself is passed through.
fn with_conflict_hint(profile: &BankAccountProfile, e: ReconError) -> ReconError {
    if e.is_constraint_violation() {
        eprintln!("{}", conflict_hint(profile).yellow());
    }
    e
}

pub fn list() -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    let rows = profiles::list(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Bank", "Bank ID", "MID", "Merchant", "Type", "Rule Mapping"]);
    for p in rows {
        table.add_row(vec![
            Cell::new(p.id.unwrap_or_default()),
            Cell::new(&p.bank_name),
            Cell::new(&p.bank_id),
            Cell::new(&p.mid),
            Cell::new(&p.merchant_name),
            Cell::new(p.transaction_type),
            Cell::new(p.bank_rule_mapping.as_deref().unwrap_or_default()),
        ]);
    }
    println!("Banks\n{table}");
    Ok(())
}

pub fn remove(bank_id: &str) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    let profile = profiles::find_by_bank_id(&conn, bank_id)?
        .ok_or_else(|| ReconError::NotFound(format!("bank {bank_id}")))?;
    if let Some(id) = profile.id {
        profiles::delete(&conn, id)?;
    }
    println!("Removed bank: {profile}");
    Ok(())
}
