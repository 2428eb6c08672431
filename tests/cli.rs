use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("expense-tracker").unwrap();
    cmd.env("EXPENSE_TRACKER_HOME", home).env_remove("EXPENSE_TRACKER_LOG");
    cmd
}

/// A fresh home with the database initialized and one default user.
fn setup() -> TempDir {
    let home = tempfile::tempdir().unwrap();
    cmd(home.path()).arg("init").assert().success();
    cmd(home.path())
        .args(["users", "add", "harsh@example.com", "--first-name", "Harsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("now the default user"));
    home
}

#[test]
fn test_commands_require_init() {
    let home = tempfile::tempdir().unwrap();
    cmd(home.path())
        .args(["users", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No database found"));
}

#[test]
fn test_template_prints_upload_header() {
    let home = tempfile::tempdir().unwrap();
    cmd(home.path())
        .arg("template")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Amount,Date,Description,CategoryName"));
}

#[test]
fn test_template_writes_file() {
    let home = tempfile::tempdir().unwrap();
    let out = home.path().join("upload.csv");
    cmd(home.path())
        .args(["template", "--output"])
        .arg(&out)
        .assert()
        .success();
    let content = std::fs::read_to_string(out).unwrap();
    assert!(content.starts_with("Amount,Date,Description,CategoryName"));
}

#[test]
fn test_validate_reports_missing_columns() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("bad.csv");
    std::fs::write(&file, "Description,Amount\nLunch,5\n").unwrap();
    cmd(home.path())
        .arg("validate")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Template is missing column for Date"));
}

#[test]
fn test_validate_accepts_reordered_columns() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("good.csv");
    std::fs::write(&file, "date,Extra,amount\n").unwrap();
    cmd(home.path())
        .arg("validate")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("matches the upload template"));
}

#[test]
fn test_import_then_list() {
    let home = setup();
    cmd(home.path())
        .args(["categories", "add", "Food"])
        .assert()
        .success();

    let file = home.path().join("upload.csv");
    std::fs::write(
        &file,
        "Amount,Date,Description,CategoryName\n\
         1234.5,2024-01-15,Team lunch,food\n\
         \n\
         20,1/16/2024,Taxi,\n",
    )
    .unwrap();
    cmd(home.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 expenses imported"));

    cmd(home.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("already been imported"));

    cmd(home.path())
        .args(["expenses", "count"])
        .assert()
        .success()
        .stdout("2\n");

    cmd(home.path())
        .args(["expenses", "list", "--category", "Food"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1,234.50"))
        .stdout(predicate::str::contains("Team lunch"))
        .stdout(predicate::str::contains("Taxi").not());
}

#[test]
fn test_import_rejects_unknown_category() {
    let home = setup();
    let file = home.path().join("upload.csv");
    std::fs::write(&file, "Amount,Date,CategoryName\n5,2024-01-01,Travel\n").unwrap();
    cmd(home.path())
        .arg("import")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Line 2: Category with Name : Travel does not exist."))
        .stderr(predicate::str::contains("Nothing imported"));
}

#[test]
fn test_import_reports_bad_cell_with_line() {
    let home = setup();
    let file = home.path().join("upload.csv");
    std::fs::write(&file, "Amount,Date\n5,2024-01-01\nfive,2024-01-02\n").unwrap();
    cmd(home.path())
        .arg("import")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Value 'five' for Amount is not a valid number on line 3",
        ));
    cmd(home.path())
        .args(["expenses", "count"])
        .assert()
        .success()
        .stdout("0\n");
}

#[test]
fn test_import_quoted_flag() {
    let home = setup();
    let file = home.path().join("upload.csv");
    std::fs::write(&file, "Amount,Date,Description\n3,2024-05-01,\"Pens, paper\"\n").unwrap();
    cmd(home.path())
        .args(["import", "--quoted"])
        .arg(&file)
        .assert()
        .success();
    cmd(home.path())
        .args(["expenses", "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pens, paper"));
}

#[test]
fn test_users_are_isolated() {
    let home = setup();
    cmd(home.path())
        .args(["users", "add", "other@example.com"])
        .assert()
        .success();
    cmd(home.path())
        .args(["expenses", "add", "10", "--date", "2024-02-01"])
        .assert()
        .success();
    cmd(home.path())
        .args(["--user", "other@example.com", "expenses", "show", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Expense with Id : 1 does not exist."));
    cmd(home.path())
        .args(["expenses", "count", "--user", "other@example.com"])
        .assert()
        .success()
        .stdout("0\n");
}

#[test]
fn test_category_lifecycle() {
    let home = setup();
    cmd(home.path())
        .args(["categories", "add", "Travel"])
        .assert()
        .success();
    cmd(home.path())
        .args(["categories", "add", "travel"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    cmd(home.path())
        .args(["expenses", "add", "99", "--category", "travel"])
        .assert()
        .success();
    cmd(home.path())
        .args(["categories", "rename", "Travel", "Trips"])
        .assert()
        .success();
    cmd(home.path())
        .args(["categories", "delete", "trips"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 expenses now uncategorized"));
    cmd(home.path())
        .args(["expenses", "count"])
        .assert()
        .success()
        .stdout("1\n");
}

#[test]
fn test_commands_without_user_fail() {
    let home = tempfile::tempdir().unwrap();
    cmd(home.path()).arg("init").assert().success();
    cmd(home.path())
        .args(["expenses", "count"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No user selected"));
}
