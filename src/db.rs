use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const DB_FILE: &str = "bankrecon.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS bank_details (
    id INTEGER PRIMARY KEY,
    bank_name TEXT NOT NULL CHECK (length(bank_name) <= 100),
    bank_id TEXT NOT NULL UNIQUE CHECK (length(bank_id) <= 20),
    mid TEXT NOT NULL UNIQUE CHECK (length(mid) <= 50),
    merchant_name TEXT NOT NULL CHECK (length(merchant_name) <= 100),
    transaction_type TEXT NOT NULL CHECK (transaction_type IN ('SALE', 'REFUND', 'NET SETTLED')),
    bank_rule_mapping TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    UNIQUE (bank_id, mid)
);

CREATE TABLE IF NOT EXISTS bank_mappings (
    id INTEGER PRIMARY KEY,
    bank_id TEXT NOT NULL CHECK (length(bank_id) <= 255),
    bank_name TEXT NOT NULL CHECK (length(bank_name) <= 255),
    headers TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE UNIQUE INDEX IF NOT EXISTS unique_bank_mapping
    ON bank_mappings (bank_id, bank_name, headers);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    merchant_name TEXT CHECK (length(merchant_name) <= 50),
    mid TEXT NOT NULL DEFAULT '' CHECK (length(mid) <= 50),
    transaction_id TEXT CHECK (length(transaction_id) <= 50),
    order_id TEXT CHECK (length(order_id) <= 50),
    transaction_date TEXT,
    settlement_date TEXT NOT NULL,
    refund_request_date TEXT,
    transaction_type TEXT NOT NULL DEFAULT '' CHECK (length(transaction_type) <= 50),
    gross_amount REAL,
    aggregator_com REAL,
    acquirer_comm REAL,
    payable_merchant REAL NOT NULL,
    payout_from_nodal REAL,
    bank_name_receive_funds TEXT CHECK (length(bank_name_receive_funds) <= 50),
    nodal_account_no TEXT CHECK (length(nodal_account_no) <= 50),
    aggregator_name TEXT CHECK (length(aggregator_name) <= 50),
    acquirer_name TEXT CHECK (length(acquirer_name) <= 50),
    refund_flag TEXT CHECK (length(refund_flag) <= 10),
    payments_type TEXT CHECK (length(payments_type) <= 50),
    mop_type TEXT CHECK (length(mop_type) <= 50),
    credit_debit_date TEXT,
    bank_name TEXT CHECK (length(bank_name) <= 15),
    refund_order_id TEXT CHECK (length(refund_order_id) <= 50),
    acq_id TEXT CHECK (length(acq_id) <= 125),
    approve_code TEXT CHECK (length(approve_code) <= 50),
    arn_no TEXT CHECK (length(arn_no) <= 150),
    card_no TEXT CHECK (length(card_no) <= 150),
    tid TEXT CHECK (length(tid) <= 125),
    remarks TEXT CHECK (length(remarks) <= 50),
    bank_ref_id TEXT CHECK (length(bank_ref_id) <= 125),
    file_upload_date TEXT,
    user_name TEXT CHECK (length(user_name) <= 25),
    recon_status TEXT CHECK (length(recon_status) <= 25),
    mpr_summary_trans TEXT CHECK (length(mpr_summary_trans) <= 10),
    merchant_code TEXT CHECK (length(merchant_code) <= 50),
    rec_fmt TEXT CHECK (length(rec_fmt) <= 50),
    card_type TEXT CHECK (length(card_type) <= 100),
    intl_amount REAL,
    domestic_amount REAL,
    udf1 TEXT CHECK (length(udf1) <= 300),
    udf2 TEXT CHECK (length(udf2) <= 300),
    udf3 TEXT CHECK (length(udf3) <= 300),
    udf4 TEXT CHECK (length(udf4) <= 300),
    udf5 TEXT CHECK (length(udf5) <= 300),
    udf6 TEXT CHECK (length(udf6) <= 300),
    gst_number TEXT CHECK (length(gst_number) <= 50),
    credit_debit_amount TEXT CHECK (length(credit_debit_amount) <= 6),
    created_at TEXT DEFAULT (datetime('now'))
);

-- Lookup only: duplicate (order_id, transaction_id) rows are allowed.
CREATE INDEX IF NOT EXISTS idx_transactions_order_txn
    ON transactions (order_id, transaction_id);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_db() -> (tempfile::TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = get_connection(&dir.path().join("test.db")).unwrap();
    init_db(&conn).unwrap();
    (dir, conn)
}
