use std::fmt;

use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ReconError, Result};
use crate::models::{GroupedHeaders, Headers};

/// Per-bank declaration of which source columns belong to which
/// transaction type.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMapping {
    pub id: Option<i64>,
    pub bank_id: String,
    pub bank_name: String,
    pub headers: Headers,
}

impl fmt::Display for HeaderMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.bank_name, self.bank_id)
    }
}

// ---------------------------------------------------------------------------
// Header decoding
// ---------------------------------------------------------------------------

/// Decode serialized headers into whichever shape the text holds: a list of
/// `{label: column}` objects or an already grouped `{label: [columns]}`
/// object. A JSON string wrapping either shape is unwrapped first.
pub fn parse_headers(text: &str) -> Result<Headers> {
    let value: Value = serde_json::from_str(text)?;
    headers_from_value(value)
}

fn headers_from_value(value: Value) -> Result<Headers> {
    match value {
        Value::String(inner) => parse_headers(&inner),
        Value::Array(items) => {
            let mut pairs = Vec::new();
            for item in items {
                let entry = match item {
                    Value::Object(entry) => entry,
                    other => {
                        return Err(ReconError::InvalidHeaders(format!(
                            "expected an object per header entry, got {other}"
                        )))
                    }
                };
                for (label, column) in entry {
                    let Value::String(column) = column else {
                        return Err(ReconError::InvalidHeaders(format!(
                            "column name for {label} must be a string"
                        )));
                    };
                    pairs.push((label, column));
                }
            }
            Ok(Headers::Entries(pairs))
        }
        Value::Object(map) => {
            let mut grouped = GroupedHeaders::new();
            for (label, columns) in map {
                let Value::Array(columns) = columns else {
                    return Err(ReconError::InvalidHeaders(format!(
                        "columns for {label} must be a list"
                    )));
                };
                for column in columns {
                    let Value::String(column) = column else {
                        return Err(ReconError::InvalidHeaders(format!(
                            "column name for {label} must be a string"
                        )));
                    };
                    grouped.push(label.clone(), column);
                }
            }
            Ok(Headers::Grouped(grouped))
        }
        other => Err(ReconError::InvalidHeaders(format!(
            "expected a list or an object, got {other}"
        ))),
    }
}

fn into_grouped(headers: Headers) -> Result<GroupedHeaders> {
    match headers {
        Headers::Raw(text) => into_grouped(parse_headers(&text)?),
        Headers::Entries(pairs) => Ok(pairs.into_iter().collect()),
        Headers::Grouped(grouped) => Ok(grouped),
    }
}

// ---------------------------------------------------------------------------
// Entity operations
// ---------------------------------------------------------------------------

impl HeaderMapping {
    pub fn new(bank_id: impl Into<String>, bank_name: impl Into<String>, headers: Headers) -> Self {
        Self {
            id: None,
            bank_id: bank_id.into(),
            bank_name: bank_name.into(),
            headers,
        }
    }

    /// Replace the in-memory headers with their grouped form.
    ///
    /// `[{"NET SETTLED": "REF_NO"}, {"NET SETTLED": "AMOUNT"}]` becomes
    /// `{"NET SETTLED": ["REF_NO", "AMOUNT"]}`. Input that is already grouped
    /// is kept as is.
    pub fn normalize(&mut self, headers: Headers) -> Result<()> {
        self.headers = Headers::Grouped(into_grouped(headers)?);
        Ok(())
    }

    /// The grouped headers, decoding stored text first if it was never parsed.
    pub fn materialize(&self) -> Result<GroupedHeaders> {
        into_grouped(self.headers.clone())
    }

    /// Persist the mapping, inserting when it has no id and updating otherwise.
    ///
    /// Raw or list-shaped headers are grouped in place first, so after a
    /// successful write `self.headers` is always `Headers::Grouped`. The
    /// write is refused with [`ReconError::DuplicateMapping`] when any row,
    /// this one included, already holds the same bank id, bank name and
    /// headers. The check and the write are not atomic; `unique_bank_mapping`
    /// still rejects a racing duplicate as a constraint violation.
    pub fn save(&mut self, conn: &Connection) -> Result<i64> {
        if !self.headers.is_grouped() {
            let headers = std::mem::replace(&mut self.headers, Headers::Entries(Vec::new()));
            if let Err(e) = self.normalize(headers.clone()) {
                self.headers = headers;
                return Err(e);
            }
            debug!(bank_id = %self.bank_id, "grouped header entries");
        }
        let encoded = self.materialize()?.encode();

        if mapping_exists(conn, &self.bank_id, &self.bank_name, &encoded)? {
            warn!(bank_id = %self.bank_id, bank_name = %self.bank_name, "duplicate header mapping");
            return Err(ReconError::DuplicateMapping {
                bank_id: self.bank_id.clone(),
                bank_name: self.bank_name.clone(),
            });
        }

        let id = match self.id {
            Some(id) => {
                let changed = conn.execute(
                    "UPDATE bank_mappings SET bank_id = ?1, bank_name = ?2, headers = ?3 WHERE id = ?4",
                    rusqlite::params![self.bank_id, self.bank_name, encoded, id],
                )?;
                if changed == 0 {
                    return Err(ReconError::NotFound(format!("mapping {id}")));
                }
                id
            }
            None => {
                conn.execute(
                    "INSERT INTO bank_mappings (bank_id, bank_name, headers) VALUES (?1, ?2, ?3)",
                    rusqlite::params![self.bank_id, self.bank_name, encoded],
                )?;
                conn.last_insert_rowid()
            }
        };
        self.id = Some(id);
        info!(id, mapping = %self, "saved header mapping");
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

pub fn mapping_exists(conn: &Connection, bank_id: &str, bank_name: &str, encoded_headers: &str) -> Result<bool> {
    let mut stmt = conn.prepare_cached(
        "SELECT 1 FROM bank_mappings WHERE bank_id = ?1 AND bank_name = ?2 AND headers = ?3",
    )?;
    Ok(stmt.exists(rusqlite::params![bank_id, bank_name, encoded_headers])?)
}

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HeaderMapping> {
    Ok(HeaderMapping {
        id: Some(row.get(0)?),
        bank_id: row.get(1)?,
        bank_name: row.get(2)?,
        headers: Headers::Raw(row.get(3)?),
    })
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<HeaderMapping>> {
    Ok(conn
        .query_row(
            "SELECT id, bank_id, bank_name, headers FROM bank_mappings WHERE id = ?1",
            [id],
            from_row,
        )
        .optional()?)
}

pub fn list(conn: &Connection, bank_id: Option<&str>) -> Result<Vec<HeaderMapping>> {
    let mut stmt = conn.prepare(
        "SELECT id, bank_id, bank_name, headers FROM bank_mappings \
         WHERE ?1 IS NULL OR bank_id = ?1 ORDER BY bank_id, id",
    )?;
    let rows = stmt
        .query_map([bank_id], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    let removed = conn.execute("DELETE FROM bank_mappings WHERE id = ?1", [id])?;
    if removed == 0 {
        return Err(ReconError::NotFound(format!("mapping {id}")));
    }
    info!(id, "deleted header mapping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    fn entries(pairs: &[(&str, &str)]) -> Headers {
        Headers::Entries(
            pairs
                .iter()
                .map(|(l, c)| (l.to_string(), c.to_string()))
                .collect(),
        )
    }

    fn grouped(pairs: &[(&str, &str)]) -> GroupedHeaders {
        pairs
            .iter()
            .map(|(l, c)| (l.to_string(), c.to_string()))
            .collect()
    }

    #[test]
    fn test_normalize_groups_by_label() {
        let mut m = HeaderMapping::new("B1", "Bank", Headers::Entries(Vec::new()));
        m.normalize(entries(&[("NET_SETTLED", "A"), ("NET_SETTLED", "B"), ("SALE", "C")]))
            .unwrap();
        let Headers::Grouped(g) = &m.headers else {
            panic!("expected grouped headers, got {:?}", m.headers);
        };
        assert_eq!(g.encode(), r#"{"NET_SETTLED":["A","B"],"SALE":["C"]}"#);
    }

    #[test]
    fn test_normalize_parses_text() {
        let mut m = HeaderMapping::new("B1", "Bank", Headers::Entries(Vec::new()));
        let text = r#"[{"NET SETTLED": "BANK BOOKING REF.NO."}, {"NET SETTLED": "REFUND AMOUNT"}, {"NET SETTLED": "REFUND DATE"}]"#;
        m.normalize(Headers::Raw(text.to_string())).unwrap();
        assert_eq!(
            m.headers,
            Headers::Grouped(grouped(&[
                ("NET SETTLED", "BANK BOOKING REF.NO."),
                ("NET SETTLED", "REFUND AMOUNT"),
                ("NET SETTLED", "REFUND DATE"),
            ]))
        );
    }

    #[test]
    fn test_normalize_leaves_grouped_untouched() {
        let g = grouped(&[("SALE", "X"), ("REFUND", "Y")]);
        let mut m = HeaderMapping::new("B1", "Bank", Headers::Grouped(g.clone()));
        m.normalize(Headers::Grouped(g.clone())).unwrap();
        assert_eq!(m.headers, Headers::Grouped(g));
    }

    #[test]
    fn test_normalize_rejects_scalar_columns() {
        let mut m = HeaderMapping::new("B1", "Bank", Headers::Entries(Vec::new()));
        let err = m
            .normalize(Headers::Raw(r#"[{"SALE": 3}]"#.to_string()))
            .unwrap_err();
        assert!(matches!(err, ReconError::InvalidHeaders(_)));
    }

    #[test]
    fn test_materialize_decodes_text() {
        let m = HeaderMapping::new("B1", "Bank", Headers::Raw(r#"{"SALE":["X"]}"#.to_string()));
        assert_eq!(m.materialize().unwrap(), grouped(&[("SALE", "X")]));
    }

    #[test]
    fn test_materialize_unwraps_double_encoded_text() {
        let m = HeaderMapping::new("B1", "Bank", Headers::Raw(r#""{\"SALE\":[\"X\"]}""#.to_string()));
        assert_eq!(m.materialize().unwrap(), grouped(&[("SALE", "X")]));
    }

    #[test]
    fn test_save_groups_entries_and_persists() {
        let (_dir, conn) = test_db();
        let mut m = HeaderMapping::new("B1", "Bank", entries(&[("SALE", "AMT"), ("SALE", "DATE")]));
        let id = m.save(&conn).unwrap();
        assert!(matches!(m.headers, Headers::Grouped(_)));

        let stored: String = conn
            .query_row("SELECT headers FROM bank_mappings WHERE id = ?1", [id], |r| r.get(0))
            .unwrap();
        assert_eq!(stored, r#"{"SALE":["AMT","DATE"]}"#);

        let loaded = get(&conn, id).unwrap().unwrap();
        assert_eq!(loaded.materialize().unwrap(), grouped(&[("SALE", "AMT"), ("SALE", "DATE")]));
        assert_eq!(loaded.to_string(), "Bank - B1");
    }

    #[test]
    fn test_save_rejects_duplicate_before_store() {
        let (_dir, conn) = test_db();
        HeaderMapping::new("B1", "Bank", entries(&[("SALE", "AMT")]))
            .save(&conn)
            .unwrap();
        let err = HeaderMapping::new("B1", "Bank", Headers::Grouped(grouped(&[("SALE", "AMT")])))
            .save(&conn)
            .unwrap_err();
        assert!(matches!(
            err,
            ReconError::DuplicateMapping { ref bank_id, ref bank_name } if bank_id == "B1" && bank_name == "Bank"
        ));
        assert_eq!(list(&conn, None).unwrap().len(), 1);
    }

    #[test]
    fn test_save_rejects_reordered_labels() {
        let (_dir, conn) = test_db();
        HeaderMapping::new("B1", "Bank", Headers::Raw(r#"{"SALE":["X"],"REFUND":["Y"]}"#.to_string()))
            .save(&conn)
            .unwrap();
        let err = HeaderMapping::new("B1", "Bank", Headers::Raw(r#"{"REFUND":["Y"],"SALE":["X"]}"#.to_string()))
            .save(&conn)
            .unwrap_err();
        assert!(matches!(err, ReconError::DuplicateMapping { .. }), "{err}");
        assert_eq!(list(&conn, None).unwrap().len(), 1);
    }

    #[test]
    fn test_store_constraint_rejects_reordered_labels() {
        let (_dir, conn) = test_db();
        let sale_first = grouped(&[("SALE", "X"), ("REFUND", "Y")]).encode();
        let refund_first = grouped(&[("REFUND", "Y"), ("SALE", "X")]).encode();
        let insert = "INSERT INTO bank_mappings (bank_id, bank_name, headers) VALUES ('B1', 'Bank', ?1)";
        conn.execute(insert, [&sale_first]).unwrap();
        let err: ReconError = conn.execute(insert, [&refund_first]).unwrap_err().into();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_save_groups_raw_list_in_memory() {
        let (_dir, conn) = test_db();
        let mut m = HeaderMapping::new("B1", "Bank", Headers::Raw(r#"[{"SALE":"A"},{"SALE":"B"}]"#.to_string()));
        m.save(&conn).unwrap();
        assert!(matches!(m.headers, Headers::Grouped(_)), "{:?}", m.headers);
        assert_eq!(m.headers, Headers::Grouped(grouped(&[("SALE", "A"), ("SALE", "B")])));
    }

    #[test]
    fn test_save_keeps_raw_text_when_undecodable() {
        let (_dir, conn) = test_db();
        let mut m = HeaderMapping::new("B1", "Bank", Headers::Raw("[1, 2]".to_string()));
        assert!(matches!(m.save(&conn), Err(ReconError::InvalidHeaders(_))));
        assert_eq!(m.headers, Headers::Raw("[1, 2]".to_string()));
        assert!(list(&conn, None).unwrap().is_empty());
    }

    #[test]
    fn test_store_constraint_rejects_duplicate_insert() {
        let (_dir, conn) = test_db();
        let encoded = grouped(&[("SALE", "AMT")]).encode();
        let insert = "INSERT INTO bank_mappings (bank_id, bank_name, headers) VALUES ('B1', 'Bank', ?1)";
        conn.execute(insert, [&encoded]).unwrap();
        let err: ReconError = conn.execute(insert, [&encoded]).unwrap_err().into();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_same_headers_different_bank_allowed() {
        let (_dir, conn) = test_db();
        HeaderMapping::new("B1", "Bank", entries(&[("SALE", "AMT")]))
            .save(&conn)
            .unwrap();
        HeaderMapping::new("B2", "Bank", entries(&[("SALE", "AMT")]))
            .save(&conn)
            .unwrap();
        HeaderMapping::new("B1", "Bank", entries(&[("REFUND", "AMT")]))
            .save(&conn)
            .unwrap();
        assert_eq!(list(&conn, Some("B1")).unwrap().len(), 2);
        assert_eq!(list(&conn, None).unwrap().len(), 3);
    }

    #[test]
    fn test_resave_unchanged_mapping_hits_guard() {
        let (_dir, conn) = test_db();
        let mut m = HeaderMapping::new("B1", "Bank", entries(&[("SALE", "AMT")]));
        m.save(&conn).unwrap();
        let err = m.save(&conn).unwrap_err();
        assert!(matches!(err, ReconError::DuplicateMapping { .. }));
    }

    #[test]
    fn test_update_changes_headers() {
        let (_dir, conn) = test_db();
        let mut m = HeaderMapping::new("B1", "Bank", entries(&[("SALE", "AMT")]));
        let id = m.save(&conn).unwrap();
        m.headers = entries(&[("SALE", "AMT"), ("SALE", "FEE")]);
        assert_eq!(m.save(&conn).unwrap(), id);
        let loaded = get(&conn, id).unwrap().unwrap();
        assert_eq!(loaded.materialize().unwrap().get("SALE").unwrap(), ["AMT", "FEE"]);
    }

    #[test]
    fn test_delete_missing_mapping() {
        let (_dir, conn) = test_db();
        assert!(matches!(delete(&conn, 42), Err(ReconError::NotFound(_))));
    }
}
