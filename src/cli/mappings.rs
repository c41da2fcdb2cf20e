use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::{ReconError, Result};
use crate::mappings::{self, HeaderMapping};
use crate::models::Headers;
use crate::settings::get_db_path;

/// Split repeated `TYPE=COLUMN` flags into list-form header entries.
pub(crate) fn parse_header_pairs(pairs: &[String]) -> Result<Headers> {
    let mut entries = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let (label, column) = pair
            .split_once('=')
            .ok_or_else(|| ReconError::InvalidHeaders(format!("expected TYPE=COLUMN, got '{pair}'")))?;
        entries.push((label.trim().to_string(), column.trim().to_string()));
    }
    Ok(Headers::Entries(entries))
}

pub fn add(bank_id: &str, bank_name: &str, headers: Option<&str>, header: &[String]) -> Result<()> {
    let headers = match headers {
        Some(text) => Headers::Raw(text.to_string()),
        None => parse_header_pairs(header)?,
    };
    let conn = get_connection(&get_db_path())?;
    let mut mapping = HeaderMapping::new(bank_id, bank_name, headers);
    let id = mapping.save(&conn)?;
    println!("Added mapping {id}: {mapping}");
    Ok(())
}

pub fn list(bank_id: Option<&str>) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    let rows = mappings::list(&conn, bank_id)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Bank", "Bank ID", "Headers"]);
    for m in rows {
        let summary = m
            .materialize()?
            .iter()
            .map(|(label, columns)| format!("{label}: {}", columns.join(", ")))
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(vec![
            Cell::new(m.id.unwrap_or_default()),
            Cell::new(&m.bank_name),
            Cell::new(&m.bank_id),
            Cell::new(summary),
        ]);
    }
    println!("Header Mappings\n{table}");
    Ok(())
}

pub fn show(id: i64) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    let mapping = mappings::get(&conn, id)?.ok_or_else(|| ReconError::NotFound(format!("mapping {id}")))?;
    println!("{mapping}");
    println!("{}", serde_json::to_string_pretty(&mapping.materialize()?.to_json())?);
    Ok(())
}

pub fn remove(id: i64) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    let mapping = mappings::get(&conn, id)?.ok_or_else(|| ReconError::NotFound(format!("mapping {id}")))?;
    mappings::delete(&conn, id)?;
    println!("Removed mapping {id}: {mapping}");
    Ok(())
}
