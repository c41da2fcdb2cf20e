use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::ReconError;

/// How a bank/merchant pairing settles. Stored as the labels the admin
/// screens have always used, so `NetSettled` is written `NET SETTLED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "SALE")]
    Sale,
    #[serde(rename = "REFUND")]
    Refund,
    #[serde(rename = "NET SETTLED", alias = "NET_SETTLED")]
    NetSettled,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sale => "SALE",
            Self::Refund => "REFUND",
            Self::NetSettled => "NET SETTLED",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "SALE" => Ok(Self::Sale),
            "REFUND" => Ok(Self::Refund),
            "NET SETTLED" | "NET_SETTLED" => Ok(Self::NetSettled),
            other => Err(ReconError::InvalidTransactionType(other.to_string())),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Identity record for one bank + merchant pairing.
#[derive(Debug, Clone, PartialEq)]
pub struct BankAccountProfile {
    pub id: Option<i64>,
    pub bank_name: String,
    pub bank_id: String,
    pub mid: String,
    pub merchant_name: String,
    pub transaction_type: TransactionType,
    pub bank_rule_mapping: Option<String>,
}

impl fmt::Display for BankAccountProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.bank_name, self.bank_id)
    }
}

/// Source column names grouped by transaction-type label, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedHeaders(Vec<(String, Vec<String>)>);

impl GroupedHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `column` to the list for `label`, creating the list on first use.
    pub fn push(&mut self, label: impl Into<String>, column: impl Into<String>) {
        let label = label.into();
        let column = column.into();
        match self.0.iter_mut().find(|(l, _)| *l == label) {
            Some((_, columns)) => columns.push(column),
            None => self.0.push((label, vec![column])),
        }
    }

    #[cfg(test)]
    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, columns)| columns.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(l, c)| (l.as_str(), c.as_slice()))
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .0
            .iter()
            .map(|(label, columns)| (label.clone(), serde_json::json!(columns)))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Compact JSON text as persisted, labels sorted and each column list in
    /// its own order. Groupings that differ only in label order encode
    /// identically, which is what the `unique_bank_mapping` index compares.
    pub fn encode(&self) -> String {
        let canonical: BTreeMap<&str, &[String]> = self.iter().collect();
        serde_json::json!(canonical).to_string()
    }
}

impl FromIterator<(String, String)> for GroupedHeaders {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut grouped = GroupedHeaders::new();
        for (label, column) in iter {
            grouped.push(label, column);
        }
        grouped
    }
}

/// The three shapes a mapping's headers can be in before it is persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum Headers {
    /// Serialized JSON text, not yet decoded.
    Raw(String),
    /// `[{"SALE": "AMOUNT"}, ...]` flattened to (label, column) pairs.
    Entries(Vec<(String, String)>),
    Grouped(GroupedHeaders),
}

impl Headers {
    pub fn is_grouped(&self) -> bool {
        matches!(self, Headers::Grouped(_))
    }
}

/// One row of a bank settlement/MPR file as loaded by ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(default, skip_serializing)]
    pub id: Option<i64>,
    pub merchant_name: Option<String>,
    #[serde(default)]
    pub mid: String,
    pub transaction_id: Option<String>,
    pub order_id: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub settlement_date: NaiveDate,
    pub refund_request_date: Option<NaiveDate>,
    #[serde(default)]
    pub transaction_type: String,
    pub gross_amount: Option<f64>,
    pub aggregator_com: Option<f64>,
    pub acquirer_comm: Option<f64>,
    pub payable_merchant: f64,
    pub payout_from_nodal: Option<f64>,
    pub bank_name_receive_funds: Option<String>,
    pub nodal_account_no: Option<String>,
    pub aggregator_name: Option<String>,
    pub acquirer_name: Option<String>,
    pub refund_flag: Option<String>,
    pub payments_type: Option<String>,
    pub mop_type: Option<String>,
    pub credit_debit_date: Option<NaiveDate>,
    pub bank_name: Option<String>,
    pub refund_order_id: Option<String>,
    pub acq_id: Option<String>,
    pub approve_code: Option<String>,
    pub arn_no: Option<String>,
    pub card_no: Option<String>,
    pub tid: Option<String>,
    pub remarks: Option<String>,
    pub bank_ref_id: Option<String>,
    pub file_upload_date: Option<NaiveDateTime>,
    pub user_name: Option<String>,
    pub recon_status: Option<String>,
    pub mpr_summary_trans: Option<String>,
    pub merchant_code: Option<String>,
    pub rec_fmt: Option<String>,
    pub card_type: Option<String>,
    pub intl_amount: Option<f64>,
    pub domestic_amount: Option<f64>,
    pub udf1: Option<String>,
    pub udf2: Option<String>,
    pub udf3: Option<String>,
    pub udf4: Option<String>,
    pub udf5: Option<String>,
    pub udf6: Option<String>,
    pub gst_number: Option<String>,
    pub credit_debit_amount: Option<String>,
}

/// Displays as the order id, which may be absent; an absent id renders empty.
impl fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.order_id.as_deref().unwrap_or_default())
    }
}
