use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bankrecon(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bankrecon").unwrap();
    cmd.env("HOME", home.path())
        .env_remove("RUST_LOG")
        .env_remove("BANKRECON_DATA_DIR");
    cmd
}

fn initialized() -> TempDir {
    let home = tempfile::tempdir().unwrap();
    let data_dir = home.path().join("data");
    bankrecon(&home)
        .args(["init", "--data-dir"])
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized bankrecon"));
    home
}

#[test]
fn init_creates_database() {
    let home = initialized();
    assert!(home.path().join("data").join("bankrecon.db").exists());
    assert!(home.path().join(".config/bankrecon/settings.json").exists());
    bankrecon(&home)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bank profiles:   0"));
}

#[test]
fn data_dir_env_overrides_settings() {
    let home = initialized();
    let other = home.path().join("elsewhere");
    bankrecon(&home)
        .env("BANKRECON_DATA_DIR", &other)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains(other.join("bankrecon.db").to_string_lossy().into_owned()))
        .stdout(predicate::str::contains("Database not found"));
}

#[test]
fn banks_reject_reused_bank_id() {
    let home = initialized();
    bankrecon(&home)
        .args(["banks", "add", "HDFC Bank", "--bank-id", "HDFC01", "--mid", "M100"])
        .args(["--merchant-name", "Acme", "--type", "NET_SETTLED"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added bank: HDFC Bank (HDFC01)"));
    bankrecon(&home)
        .args(["banks", "add", "HDFC Bank", "--bank-id", "HDFC01", "--mid", "M200"])
        .args(["--merchant-name", "Other", "--type", "SALE"])
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("UNIQUE constraint failed")
                .and(predicate::str::contains("bank_id 'HDFC01' or mid 'M200' is already used")),
        );
    bankrecon(&home)
        .args(["banks", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NET SETTLED"));
}

#[test]
fn banks_reject_unknown_type() {
    let home = initialized();
    bankrecon(&home)
        .args(["banks", "add", "HDFC Bank", "--bank-id", "HDFC01", "--mid", "M100"])
        .args(["--merchant-name", "Acme", "--type", "CHARGEBACK"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CHARGEBACK"));
}

#[test]
fn banks_update_and_remove() {
    let home = initialized();
    bankrecon(&home)
        .args(["banks", "add", "HDFC Bank", "--bank-id", "HDFC01", "--mid", "M100"])
        .args(["--merchant-name", "Acme", "--type", "SALE"])
        .assert()
        .success();
    bankrecon(&home)
        .args(["banks", "update", "HDFC01", "--type", "REFUND", "--rule-mapping", "AMT=gross"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated bank: HDFC Bank (HDFC01) [REFUND]"));
    bankrecon(&home)
        .args(["banks", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("REFUND").and(predicate::str::contains("AMT=gross")));
    bankrecon(&home)
        .args(["banks", "remove", "HDFC01"])
        .assert()
        .success();
    bankrecon(&home)
        .args(["banks", "remove", "HDFC01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn mappings_group_pairs_and_refuse_duplicates() {
    let home = initialized();
    bankrecon(&home)
        .args(["mappings", "add", "--bank-id", "B1", "--bank-name", "Bank"])
        .args(["--header", "NET SETTLED=REF NO", "--header", "NET SETTLED=AMOUNT"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added mapping 1: Bank - B1"));
    bankrecon(&home)
        .args(["mappings", "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"NET SETTLED\": [").and(predicate::str::contains("\"AMOUNT\"")));
    bankrecon(&home)
        .args(["mappings", "add", "--bank-id", "B1", "--bank-name", "Bank"])
        .args(["--headers", r#"{"SALE": ["X"], "REFUND": ["Y"]}"#])
        .assert()
        .success();
    bankrecon(&home)
        .args(["mappings", "add", "--bank-id", "B1", "--bank-name", "Bank"])
        .args(["--headers", r#"{"REFUND": ["Y"], "SALE": ["X"]}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    bankrecon(&home)
        .args(["mappings", "add", "--bank-id", "B1", "--bank-name", "Bank"])
        .args(["--headers", r#"{"NET SETTLED": ["REF NO", "AMOUNT"]}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Mapping with bank_id B1, bank_name Bank, and these headers already exists.",
        ));
}

#[test]
fn transactions_allow_duplicates_and_export() {
    let home = initialized();
    let json = r#"{"order_id": "ORD-1", "transaction_id": "TXN-1", "settlement_date": "2025-01-16", "payable_merchant": 98.5}"#;
    for _ in 0..2 {
        bankrecon(&home)
            .args(["transactions", "add", json])
            .assert()
            .success()
            .stdout(predicate::str::contains("ORD-1"));
    }
    bankrecon(&home)
        .args(["transactions", "list", "--order-id", "ORD-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("98.50"));

    let out = home.path().join("out.csv");
    bankrecon(&home)
        .args(["transactions", "export", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 transactions"));
    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().count(), 3);
}

#[test]
fn transactions_require_settlement_date() {
    let home = initialized();
    bankrecon(&home)
        .args(["transactions", "add", r#"{"order_id": "ORD-1", "payable_merchant": 1.0}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("settlement_date"));
}
