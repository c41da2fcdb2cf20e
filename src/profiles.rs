use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::error::{ReconError, Result};
use crate::models::BankAccountProfile;

const COLUMNS: &str = "id, bank_name, bank_id, mid, merchant_name, transaction_type, bank_rule_mapping";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BankAccountProfile> {
    Ok(BankAccountProfile {
        id: Some(row.get(0)?),
        bank_name: row.get(1)?,
        bank_id: row.get(2)?,
        mid: row.get(3)?,
        merchant_name: row.get(4)?,
        transaction_type: row.get(5)?,
        bank_rule_mapping: row.get(6)?,
    })
}

/// Insert a profile. A clash on `bank_id`, `mid` or the pair comes back as
/// a store constraint violation.
pub fn insert(conn: &Connection, profile: &BankAccountProfile) -> Result<i64> {
    conn.execute(
        "INSERT INTO bank_details (bank_name, bank_id, mid, merchant_name, transaction_type, bank_rule_mapping) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            profile.bank_name,
            profile.bank_id,
            profile.mid,
            profile.merchant_name,
            profile.transaction_type,
            profile.bank_rule_mapping,
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(id, profile = %profile, "added bank profile");
    Ok(id)
}

pub fn update(conn: &Connection, profile: &BankAccountProfile) -> Result<()> {
    let id = profile
        .id
        .ok_or_else(|| ReconError::NotFound(format!("profile {profile} has no id")))?;
    let changed = conn.execute(
        "UPDATE bank_details SET bank_name = ?1, bank_id = ?2, mid = ?3, merchant_name = ?4, \
         transaction_type = ?5, bank_rule_mapping = ?6 WHERE id = ?7",
        rusqlite::params![
            profile.bank_name,
            profile.bank_id,
            profile.mid,
            profile.merchant_name,
            profile.transaction_type,
            profile.bank_rule_mapping,
            id,
        ],
    )?;
    if changed == 0 {
        return Err(ReconError::NotFound(format!("profile {id}")));
    }
    info!(id, profile = %profile, "updated bank profile");
    Ok(())
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    let removed = conn.execute("DELETE FROM bank_details WHERE id = ?1", [id])?;
    if removed == 0 {
        return Err(ReconError::NotFound(format!("profile {id}")));
    }
    info!(id, "deleted bank profile");
    Ok(())
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<BankAccountProfile>> {
    Ok(conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM bank_details WHERE id = ?1"),
            [id],
            from_row,
        )
        .optional()?)
}

pub fn find_by_bank_id(conn: &Connection, bank_id: &str) -> Result<Option<BankAccountProfile>> {
    Ok(conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM bank_details WHERE bank_id = ?1"),
            [bank_id],
            from_row,
        )
        .optional()?)
}

pub fn list(conn: &Connection) -> Result<Vec<BankAccountProfile>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM bank_details ORDER BY bank_name, bank_id"))?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
