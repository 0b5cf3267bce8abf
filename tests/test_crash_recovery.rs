use std::fs;
use std::sync::Arc;

use flatdb::storage::commit::{candidate_path, write_candidate};
use flatdb::{ExecutionEngine, Store, StoreConfig};
use tempfile::TempDir;

fn setup(dir: &TempDir) -> ExecutionEngine {
    let store = Store::open(StoreConfig::in_dir(dir.path())).unwrap();
    let mut engine = ExecutionEngine::new(Arc::new(store));
    engine.execute("CREATE DATABASE shop");
    engine.execute("USE shop");
    engine.execute("CREATE TABLE t (a, b)");
    engine.execute("INSERT INTO t VALUES (1, x)");
    engine
}

#[test]
fn test_interrupted_commit_leaves_previous_content() {
    let dir = TempDir::new().unwrap();
    let table = dir.path().join("data/shop/t.txt");
    drop(setup(&dir));
    let before = fs::read_to_string(&table).unwrap();

    // A crash between writing the candidate and renaming it
    let candidate = write_candidate(&table, "a,b\n1,x\n2,y\n", false).unwrap();
    assert!(candidate.exists());

    let store = Store::open(StoreConfig::in_dir(dir.path())).unwrap();
    assert!(!candidate.exists());
    assert_eq!(fs::read_to_string(&table).unwrap(), before);

    let mut engine = ExecutionEngine::new(Arc::new(store));
    engine.execute("USE shop");
    assert_eq!(engine.execute("SELECT * FROM t"), "---- t ----\na,b\n1,x");
}

#[test]
fn test_recovery_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let table = dir.path().join("data/shop/t.txt");
    drop(setup(&dir));
    fs::write(candidate_path(&table), "garbage").unwrap();

    let store = Store::open(StoreConfig::in_dir(dir.path())).unwrap();
    let after_first = fs::read_to_string(&table).unwrap();

    let report = store.recover();
    assert!(report.is_clean());
    assert_eq!(fs::read_to_string(&table).unwrap(), after_first);
}

#[test]
fn test_commits_are_logged() {
    let dir = TempDir::new().unwrap();
    let mut engine = setup(&dir);
    engine.execute("INSERT INTO t VALUES (2, y)");

    let log = fs::read_to_string(dir.path().join("commit.log")).unwrap();
    let commits: Vec<&str> = log.lines().collect();
    assert_eq!(commits.len(), 2);
    assert!(commits
        .iter()
        .all(|line| line.starts_with("COMMIT ") && line.contains("t.txt")));
}

#[test]
fn test_recovery_ignores_other_files() {
    let dir = TempDir::new().unwrap();
    drop(setup(&dir));
    let notes = dir.path().join("data/shop/notes.md");
    fs::write(&notes, "keep me").unwrap();

    Store::open(StoreConfig::in_dir(dir.path())).unwrap();
    assert!(notes.exists());
}

#[cfg(target_os = "linux")]
#[test]
fn test_failed_commit_reports_io_error() {
    use std::path::Path;

    if !Path::new("/dev/full").exists() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let table = dir.path().join("data/shop/t.txt");
    // Every log append fails once the candidate is already written
    let config = StoreConfig::in_dir(dir.path()).commit_log("/dev/full");
    let mut engine = ExecutionEngine::new(Arc::new(Store::open(config).unwrap()));
    engine.execute("CREATE DATABASE shop");
    engine.execute("USE shop");
    assert_eq!(engine.execute("CREATE TABLE t (a, b)"), "Table created: t");
    let before = fs::read(&table).unwrap();

    let output = engine.execute("INSERT INTO t VALUES (1, x)");
    assert!(output.starts_with("Insert failed: I/O error: "), "{}", output);
    assert_eq!(fs::read(&table).unwrap(), before);
    assert!(!candidate_path(&table).exists());

    // The table lock was released and the store keeps answering
    assert_eq!(engine.execute("SELECT * FROM t"), "---- t ----\na,b");
    let output = engine.execute("UPDATE t SET a=2 WHERE b=x");
    assert!(output.starts_with("Update failed: I/O error: "), "{}", output);

    // With a working log the same store directory accepts the insert
    let store = Store::open(StoreConfig::in_dir(dir.path())).unwrap();
    let mut engine = ExecutionEngine::new(Arc::new(store));
    engine.execute("USE shop");
    assert_eq!(
        engine.execute("INSERT INTO t VALUES (1, x)"),
        "Row inserted successfully."
    );
    assert_eq!(engine.execute("SELECT * FROM t"), "---- t ----\na,b\n1,x");
}
