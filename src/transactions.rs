use std::io::Write;

use rusqlite::{named_params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::Result;
use crate::models::TransactionRecord;

/// Stored columns in struct order, `id` excluded.
pub const FIELDS: &[&str] = &[
    "merchant_name",
    "mid",
    "transaction_id",
    "order_id",
    "transaction_date",
    "settlement_date",
    "refund_request_date",
    "transaction_type",
    "gross_amount",
    "aggregator_com",
    "acquirer_comm",
    "payable_merchant",
    "payout_from_nodal",
    "bank_name_receive_funds",
    "nodal_account_no",
    "aggregator_name",
    "acquirer_name",
    "refund_flag",
    "payments_type",
    "mop_type",
    "credit_debit_date",
    "bank_name",
    "refund_order_id",
    "acq_id",
    "approve_code",
    "arn_no",
    "card_no",
    "tid",
    "remarks",
    "bank_ref_id",
    "file_upload_date",
    "user_name",
    "recon_status",
    "mpr_summary_trans",
    "merchant_code",
    "rec_fmt",
    "card_type",
    "intl_amount",
    "domestic_amount",
    "udf1",
    "udf2",
    "udf3",
    "udf4",
    "udf5",
    "udf6",
    "gst_number",
    "credit_debit_amount",
];

fn select_sql(tail: &str) -> String {
    format!("SELECT id, {} FROM transactions {tail}", FIELDS.join(", "))
}

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TransactionRecord> {
    Ok(TransactionRecord {
        id: Some(row.get("id")?),
        merchant_name: row.get("merchant_name")?,
        mid: row.get("mid")?,
        transaction_id: row.get("transaction_id")?,
        order_id: row.get("order_id")?,
        transaction_date: row.get("transaction_date")?,
        settlement_date: row.get("settlement_date")?,
        refund_request_date: row.get("refund_request_date")?,
        transaction_type: row.get("transaction_type")?,
        gross_amount: row.get("gross_amount")?,
        aggregator_com: row.get("aggregator_com")?,
        acquirer_comm: row.get("acquirer_comm")?,
        payable_merchant: row.get("payable_merchant")?,
        payout_from_nodal: row.get("payout_from_nodal")?,
        bank_name_receive_funds: row.get("bank_name_receive_funds")?,
        nodal_account_no: row.get("nodal_account_no")?,
        aggregator_name: row.get("aggregator_name")?,
        acquirer_name: row.get("acquirer_name")?,
        refund_flag: row.get("refund_flag")?,
        payments_type: row.get("payments_type")?,
        mop_type: row.get("mop_type")?,
        credit_debit_date: row.get("credit_debit_date")?,
        bank_name: row.get("bank_name")?,
        refund_order_id: row.get("refund_order_id")?,
        acq_id: row.get("acq_id")?,
        approve_code: row.get("approve_code")?,
        arn_no: row.get("arn_no")?,
        card_no: row.get("card_no")?,
        tid: row.get("tid")?,
        remarks: row.get("remarks")?,
        bank_ref_id: row.get("bank_ref_id")?,
        file_upload_date: row.get("file_upload_date")?,
        user_name: row.get("user_name")?,
        recon_status: row.get("recon_status")?,
        mpr_summary_trans: row.get("mpr_summary_trans")?,
        merchant_code: row.get("merchant_code")?,
        rec_fmt: row.get("rec_fmt")?,
        card_type: row.get("card_type")?,
        intl_amount: row.get("intl_amount")?,
        domestic_amount: row.get("domestic_amount")?,
        udf1: row.get("udf1")?,
        udf2: row.get("udf2")?,
        udf3: row.get("udf3")?,
        udf4: row.get("udf4")?,
        udf5: row.get("udf5")?,
        udf6: row.get("udf6")?,
        gst_number: row.get("gst_number")?,
        credit_debit_amount: row.get("credit_debit_amount")?,
    })
}

/// Insert one record. Nothing is deduplicated: a second row with the same
/// order id and transaction id is stored alongside the first.
pub fn insert(conn: &Connection, txn: &TransactionRecord) -> Result<i64> {
    let placeholders: Vec<String> = FIELDS.iter().map(|f| format!(":{f}")).collect();
    let sql = format!(
        "INSERT INTO transactions ({}) VALUES ({})",
        FIELDS.join(", "),
        placeholders.join(", ")
    );
    conn.execute(
        &sql,
        named_params! {
            ":merchant_name": txn.merchant_name,
            ":mid": txn.mid,
            ":transaction_id": txn.transaction_id,
            ":order_id": txn.order_id,
            ":transaction_date": txn.transaction_date,
            ":settlement_date": txn.settlement_date,
            ":refund_request_date": txn.refund_request_date,
            ":transaction_type": txn.transaction_type,
            ":gross_amount": txn.gross_amount,
            ":aggregator_com": txn.aggregator_com,
            ":acquirer_comm": txn.acquirer_comm,
            ":payable_merchant": txn.payable_merchant,
            ":payout_from_nodal": txn.payout_from_nodal,
            ":bank_name_receive_funds": txn.bank_name_receive_funds,
            ":nodal_account_no": txn.nodal_account_no,
            ":aggregator_name": txn.aggregator_name,
            ":acquirer_name": txn.acquirer_name,
            ":refund_flag": txn.refund_flag,
            ":payments_type": txn.payments_type,
            ":mop_type": txn.mop_type,
            ":credit_debit_date": txn.credit_debit_date,
            ":bank_name": txn.bank_name,
            ":refund_order_id": txn.refund_order_id,
            ":acq_id": txn.acq_id,
            ":approve_code": txn.approve_code,
            ":arn_no": txn.arn_no,
            ":card_no": txn.card_no,
            ":tid": txn.tid,
            ":remarks": txn.remarks,
            ":bank_ref_id": txn.bank_ref_id,
            ":file_upload_date": txn.file_upload_date,
            ":user_name": txn.user_name,
            ":recon_status": txn.recon_status,
            ":mpr_summary_trans": txn.mpr_summary_trans,
            ":merchant_code": txn.merchant_code,
            ":rec_fmt": txn.rec_fmt,
            ":card_type": txn.card_type,
            ":intl_amount": txn.intl_amount,
            ":domestic_amount": txn.domestic_amount,
            ":udf1": txn.udf1,
            ":udf2": txn.udf2,
            ":udf3": txn.udf3,
            ":udf4": txn.udf4,
            ":udf5": txn.udf5,
            ":udf6": txn.udf6,
            ":gst_number": txn.gst_number,
            ":credit_debit_amount": txn.credit_debit_amount,
        },
    )?;
    let id = conn.last_insert_rowid();
    debug!(id, order_id = %txn, "inserted transaction");
    Ok(id)
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<TransactionRecord>> {
    Ok(conn
        .query_row(&select_sql("WHERE id = ?1"), [id], from_row)
        .optional()?)
}

/// Uses `idx_transactions_order_txn`.
pub fn find_by_order_id(conn: &Connection, order_id: &str) -> Result<Vec<TransactionRecord>> {
    let mut stmt = conn.prepare(&select_sql("WHERE order_id = ?1 ORDER BY id"))?;
    let rows = stmt
        .query_map([order_id], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Most recently inserted first.
pub fn list(conn: &Connection, limit: usize) -> Result<Vec<TransactionRecord>> {
    let mut stmt = conn.prepare(&select_sql("ORDER BY id DESC LIMIT ?1"))?;
    let rows = stmt
        .query_map([limit as i64], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))?)
}

/// Write every row as CSV with a header line. Returns the number of rows.
pub fn export_csv<W: Write>(conn: &Connection, out: W) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    wtr.write_record(FIELDS)?;

    let mut stmt = conn.prepare(&select_sql("ORDER BY id"))?;
    let mut rows = stmt.query([])?;
    let mut written = 0usize;
    while let Some(row) = rows.next()? {
        wtr.serialize(from_row(row)?)?;
        written += 1;
    }
    wtr.flush()?;
    Ok(written)
}
