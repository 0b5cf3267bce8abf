use std::fs;
use std::sync::Arc;

use flatdb::{ExecutionEngine, Store, StoreConfig};
use tempfile::TempDir;

fn open(dir: &TempDir) -> Arc<Store> {
    Arc::new(Store::open(StoreConfig::in_dir(dir.path())).unwrap())
}

fn engine_with_table(dir: &TempDir) -> ExecutionEngine {
    let mut engine = ExecutionEngine::new(open(dir));
    engine.execute("CREATE DATABASE shop");
    engine.execute("USE shop");
    engine.execute("CREATE TABLE t (a, b)");
    engine
}

fn table_file(dir: &TempDir) -> String {
    fs::read_to_string(dir.path().join("data/shop/t.txt")).unwrap()
}

#[test]
fn test_insert_shape_is_enforced() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_with_table(&dir);
    let before = table_file(&dir);

    let output = engine.execute("INSERT INTO t VALUES (1,2,3)");
    assert!(output.starts_with("Insert failed:"), "{}", output);

    assert_eq!(table_file(&dir), before);
    assert_eq!(engine.execute("SELECT * FROM t"), "---- t ----\na,b");
}

#[test]
fn test_update_is_selective() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_with_table(&dir);
    engine.execute("INSERT INTO t VALUES (1, x)");
    engine.execute("INSERT INTO t VALUES (2, y)");

    assert_eq!(
        engine.execute("UPDATE t SET b='z' WHERE a='1'"),
        "Update successful."
    );
    assert_eq!(table_file(&dir), "a,b\n1,z\n2,y\n");
}

#[test]
fn test_delete_preserves_schema() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_with_table(&dir);
    engine.execute("INSERT INTO t VALUES (1, x)");

    assert_eq!(engine.execute("DELETE FROM t"), "All rows deleted.");
    assert_eq!(engine.execute("SELECT * FROM t"), "---- t ----\na,b");
    assert_eq!(table_file(&dir), "a,b\n");
}

#[test]
fn test_quoted_values_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_with_table(&dir);

    engine.execute("INSERT INTO t VALUES ('a,b', 2)");
    assert_eq!(
        engine.execute("SELECT * FROM t"),
        "---- t ----\na,b\n\"a,b\",2"
    );

    // Survives a reopen of the store
    let mut reopened = ExecutionEngine::new(open(&dir));
    reopened.execute("USE shop");
    assert_eq!(
        reopened.execute("SELECT * FROM t WHERE b=2"),
        "---- t WHERE b=2 ----\na,b\n\"a,b\",2"
    );
}

#[test]
fn test_unquoted_values_keep_punctuation() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_with_table(&dir);

    assert_eq!(
        engine.execute("INSERT INTO t VALUES (O'Brien, a;b)"),
        "Row inserted successfully."
    );
    assert_eq!(
        engine.execute("INSERT INTO t VALUES (f(x), 'c;d')"),
        "Row inserted successfully."
    );
    assert_eq!(
        engine.execute("SELECT * FROM t"),
        "---- t ----\na,b\nO'Brien,a;b\nf(x),c;d"
    );
    assert_eq!(table_file(&dir), "a,b\nO'Brien,a;b\nf(x),c;d\n");
}

#[test]
fn test_dropping_selected_database_clears_session() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_with_table(&dir);

    assert_eq!(engine.execute("DROP DATABASE shop"), "Database deleted: shop");
    assert_eq!(engine.current_database(), None);
    assert_eq!(engine.execute("SHOW TABLES"), "Error: No database selected.");
    assert_eq!(
        engine.execute("INSERT INTO t VALUES (1, 2)"),
        "Error: No database selected."
    );
}

#[test]
fn test_sessions_are_independent() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let mut first = ExecutionEngine::new(store.clone());
    let mut second = ExecutionEngine::new(store);

    first.execute("CREATE DATABASE one");
    first.execute("CREATE DATABASE two");
    first.execute("USE one");
    second.execute("USE two");

    assert_eq!(first.current_database(), Some("one"));
    assert_eq!(second.current_database(), Some("two"));

    first.execute("CREATE TABLE only_in_one (x)");
    assert_eq!(second.execute("SHOW TABLES"), "No tables found.");
    assert_eq!(first.execute("SHOW TABLES"), "only_in_one");
}

#[test]
fn test_rejected_commands_do_not_mutate() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_with_table(&dir);
    engine.execute("INSERT INTO t VALUES (1, x)");
    let before = table_file(&dir);

    assert_eq!(engine.execute("TRUNCATE t"), "Unknown command: TRUNCATE t");
    assert_eq!(engine.execute("DELETE FROM t WHERE a=1"), "Invalid DELETE syntax.");
    assert_eq!(engine.execute("UPDATE t SET b=1"), "Invalid UPDATE syntax.");
    assert_eq!(
        engine.execute("INSERT INTO t VALUES ('unterminated, 2)"),
        "Invalid INSERT syntax."
    );

    assert_eq!(table_file(&dir), before);
}

#[test]
fn test_names_cannot_escape_data_directory() {
    let dir = TempDir::new().unwrap();
    let mut engine = ExecutionEngine::new(open(&dir));

    let output = engine.execute("CREATE DATABASE ..");
    assert!(output.starts_with("Invalid name"), "{}", output);
    assert_eq!(engine.execute("SHOW DATABASES"), "No databases found.");
}
