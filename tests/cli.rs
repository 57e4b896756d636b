use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tally(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.env("TALLYBOOK_DATA_DIR", data_dir.path())
        .env_remove("TALLY_LOG");
    cmd
}

fn seed(data_dir: &TempDir) {
    tally(data_dir)
        .args(["customer", "add", "Amina", "--phone", "0712"])
        .assert()
        .success();
    tally(data_dir)
        .args(["customer", "add", "Brian"])
        .assert()
        .success();
    tally(data_dir)
        .args(["entry", "add", "Amina", "debt", "100"])
        .assert()
        .success();
    tally(data_dir)
        .args(["entry", "add", "Amina", "payment", "20"])
        .assert()
        .success();
    tally(data_dir)
        .args(["entry", "add", "Brian", "debt", "50"])
        .assert()
        .success();
}

#[test]
fn init_writes_settings() {
    let dir = TempDir::new().unwrap();
    tally(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialization complete!"));
    assert!(dir.path().join("config.json").exists());
}

#[test]
fn customer_list_shows_balances() {
    let dir = TempDir::new().unwrap();
    seed(&dir);

    tally(&dir)
        .args(["customer", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Amina"))
        .stdout(predicate::str::contains("$80.00"))
        .stdout(predicate::str::contains("2 customers, $130.00 owed"));
}

#[test]
fn summary_reports_total_owed() {
    let dir = TempDir::new().unwrap();
    seed(&dir);

    tally(&dir)
        .args(["report", "summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total owed"))
        .stdout(predicate::str::contains("$130.00"));
}

#[test]
fn overpayment_is_credit_not_debt() {
    let dir = TempDir::new().unwrap();
    tally(&dir)
        .args(["customer", "add", "Chen", "--initial-balance", "100"])
        .assert()
        .success();
    tally(&dir)
        .args(["entry", "repay", "Chen", "120"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Balance now: -$20.00"));

    tally(&dir)
        .args(["report", "top"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nobody owes anything."));
}

#[test]
fn invalid_input_fails() {
    let dir = TempDir::new().unwrap();
    tally(&dir)
        .args(["customer", "add", "Dana"])
        .assert()
        .success();

    tally(&dir)
        .args(["entry", "add", "Dana", "loan", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid entry kind"));
    tally(&dir)
        .args(["entry", "add", "Dana", "debt", "0"])
        .assert()
        .failure();
    tally(&dir)
        .args(["entry", "add", "Nobody", "debt", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Customer not found"));
}

#[test]
fn backup_and_restore_round_trip() {
    let dir = TempDir::new().unwrap();
    seed(&dir);

    tally(&dir)
        .args(["backup", "create"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup created: backup-"));
    tally(&dir)
        .args(["customer", "delete", "Brian", "--force"])
        .assert()
        .success();

    tally(&dir)
        .args(["backup", "restore", "latest", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restore complete!"));

    tally(&dir)
        .args(["customer", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Brian"));
    tally(&dir)
        .args(["backup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 2 backup(s)"));
}

#[test]
fn archived_customers_are_left_out_of_exports() {
    let dir = TempDir::new().unwrap();
    seed(&dir);
    tally(&dir)
        .args(["customer", "archive", "Brian"])
        .assert()
        .success();

    tally(&dir)
        .args(["export", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"schema_version\":\"1.0.0\""))
        .stdout(predicate::str::contains("Amina"))
        .stdout(predicate::str::contains("Brian").not());
}

#[test]
fn import_replaces_everything() {
    let dir = TempDir::new().unwrap();
    seed(&dir);
    let export = dir.path().join("ledger.json");

    tally(&dir)
        .args(["export", "json", "--output"])
        .arg(&export)
        .assert()
        .success();
    tally(&dir)
        .args(["customer", "add", "Eve", "--initial-balance", "5"])
        .assert()
        .success();

    tally(&dir)
        .arg("import")
        .arg(&export)
        .arg("--force")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 customers and 3 entries restored"));

    tally(&dir)
        .args(["customer", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Eve").not());
}

#[test]
fn history_lists_audited_changes() {
    let dir = TempDir::new().unwrap();
    seed(&dir);

    tally(&dir)
        .args(["history", "-n", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE LedgerEntry"))
        .stdout(predicate::str::contains("Customer ").not());
}
