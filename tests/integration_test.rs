use csvql::error::EvalError;
use csvql::executor::Executor;
use csvql::storage;
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

fn setup_marks(executor: &mut Executor) {
    executor.execute("CREATE DATABASE school;").unwrap();
    executor.execute("USE school;").unwrap();
    executor
        .execute("CREATE TABLE marks (student STRING, marks INT);")
        .unwrap();
    for (student, marks) in [("amy", 20), ("bob", 50), ("cas", 80)] {
        executor
            .execute(&format!("INSERT INTO marks VALUES ('{}', {});", student, marks))
            .unwrap();
    }
}

fn data_rows(rendered: &str) -> Vec<&str> {
    // Skip the header and separator lines of a rendered result
    rendered.lines().skip(2).collect()
}

#[test]
fn test_round_trip() {
    let dir = tempdir().unwrap();
    let mut executor = Executor::new(dir.path());

    executor.execute("CREATE DATABASE school;").unwrap();
    executor.execute("USE school;").unwrap();
    executor
        .execute("CREATE TABLE students (id INT, name STRING);")
        .unwrap();
    executor
        .execute("INSERT INTO students VALUES (1, 'a');")
        .unwrap();

    let out = executor.execute("SELECT * FROM students;").unwrap();
    let rows = data_rows(&out);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].contains('1'));
    assert!(rows[0].contains('a'));
    // The constraint row is never part of query results
    assert!(!out.contains("INT"));
    assert!(!out.contains("STRING"));

    // But it is the first data row of the stored file
    let raw = fs::read_to_string(dir.path().join("school").join("students.csv")).unwrap();
    let mut lines = raw.lines();
    assert_eq!(lines.next(), Some("id,name"));
    assert_eq!(lines.next(), Some("INT,STRING"));
    assert_eq!(lines.next(), Some("1,a"));
}

#[test]
fn test_constraint_enforcement() {
    let dir = tempdir().unwrap();
    let mut executor = Executor::new(dir.path());
    executor.execute("CREATE DATABASE school;").unwrap();
    executor.execute("USE school;").unwrap();
    executor
        .execute("CREATE TABLE students (id INT, name STRING);")
        .unwrap();

    // Wrong type for `name`
    let err = executor
        .execute("INSERT INTO students VALUES (1, 2);")
        .unwrap_err();
    assert!(matches!(err, EvalError::ConstraintViolation(_)));

    // Arity mismatch
    let err = executor
        .execute("INSERT INTO students VALUES (1, 'a', 'b');")
        .unwrap_err();
    match err {
        EvalError::ConstraintViolation(message) => {
            assert!(message.contains("number of values"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let out = executor.execute("SELECT * FROM students;").unwrap();
    assert!(data_rows(&out).is_empty());
}

#[test]
fn test_filter_left_fold_truth_table() {
    let dir = tempdir().unwrap();
    let mut executor = Executor::new(dir.path());
    setup_marks(&mut executor);

    // ((marks > 30 AND marks < 100) OR marks = 20) as a strict left fold:
    //   20: (F AND T) OR T = T
    //   50: (T AND T) OR F = T
    //   80: (T AND T) OR F = T
    let out = executor
        .execute("SELECT * FROM marks WHERE marks > 30 AND marks < 100 OR marks = 20;")
        .unwrap();
    assert_eq!(data_rows(&out).len(), 3);

    // ((marks = 20 OR marks > 30) AND marks < 60) — the fold gives AND no
    // lower precedence, so the 80 row is dropped.
    let out = executor
        .execute("SELECT * FROM marks WHERE marks = 20 OR marks > 30 AND marks < 60;")
        .unwrap();
    let rows = data_rows(&out);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| !row.contains("cas")));
}

#[test]
fn test_delete_select_agreement() {
    let dir = tempdir().unwrap();
    let mut executor = Executor::new(dir.path());
    setup_marks(&mut executor);

    let filter = "marks > 30 AND marks < 100 OR marks = 20";

    let selected = executor
        .execute(&format!("SELECT * FROM marks WHERE {};", filter))
        .unwrap();
    let would_delete = data_rows(&selected).len();

    let out = executor
        .execute(&format!("DELETE FROM marks WHERE {};", filter))
        .unwrap();
    assert!(out.contains(&format!("Deleted {} row(s)", would_delete)));

    let remaining = executor.execute("SELECT * FROM marks;").unwrap();
    assert_eq!(data_rows(&remaining).len(), 3 - would_delete);

    // Constraint row survived both operations
    let raw = fs::read_to_string(dir.path().join("school").join("marks.csv")).unwrap();
    assert_eq!(raw.lines().nth(1), Some("STRING,INT"));
}

#[test]
fn test_delete_all_rows_keeps_constraint_row() {
    let dir = tempdir().unwrap();
    let mut executor = Executor::new(dir.path());
    setup_marks(&mut executor);

    executor
        .execute("DELETE FROM marks WHERE marks >= 0;")
        .unwrap();

    let out = executor.execute("SELECT * FROM marks;").unwrap();
    assert!(data_rows(&out).is_empty());

    let raw = fs::read_to_string(dir.path().join("school").join("marks.csv")).unwrap();
    assert_eq!(raw.lines().count(), 2); // header + constraint row
}

#[test]
fn test_idempotent_use() {
    let dir = tempdir().unwrap();
    let mut executor = Executor::new(dir.path());
    executor.execute("CREATE DATABASE school;").unwrap();

    executor.execute("USE school;").unwrap();
    let selected_once = executor.session().selected().map(str::to_string);
    executor.execute("USE school;").unwrap();
    assert_eq!(
        executor.session().selected().map(str::to_string),
        selected_once
    );
}

#[test]
fn test_lifecycle_after_drop_database() {
    let dir = tempdir().unwrap();
    let mut executor = Executor::new(dir.path());
    executor.execute("CREATE DATABASE school;").unwrap();
    executor.execute("USE school;").unwrap();
    executor.execute("CREATE TABLE t (id INT);").unwrap();

    executor.execute("DROP DATABASE school;").unwrap();
    assert!(!dir.path().join("school").exists());

    // Without re-attempting USE, the cleared session reports no selection
    let err = executor.execute("SHOW TABLES;").unwrap_err();
    assert!(matches!(err, EvalError::NoDatabaseSelected));

    // Re-attempting USE reports the missing database
    let err = executor.execute("USE school;").unwrap_err();
    assert!(matches!(err, EvalError::NotFound { .. }));
}

#[test]
fn test_negative_paths() {
    let dir = tempdir().unwrap();
    let mut executor = Executor::new(dir.path());

    let err = executor.execute("CREATE TABLE t (id INT);").unwrap_err();
    assert!(matches!(err, EvalError::NoDatabaseSelected));

    executor.execute("CREATE DATABASE school;").unwrap();
    executor.execute("USE school;").unwrap();

    let err = executor.execute("DROP TABLE ghost;").unwrap_err();
    assert!(matches!(err, EvalError::NotFound { .. }));

    fs::create_dir(dir.path().join("plain")).unwrap();
    let err = executor.execute("USE plain;").unwrap_err();
    assert!(matches!(err, EvalError::NotADatabase(_)));
}

#[test]
fn test_show_databases_lists_only_marked_directories() {
    let dir = tempdir().unwrap();
    let mut executor = Executor::new(dir.path());

    assert_eq!(
        executor.execute("SHOW DATABASES;").unwrap(),
        "No databases in the current directory."
    );

    executor.execute("CREATE DATABASE alpha;").unwrap();
    executor.execute("CREATE DATABASE beta;").unwrap();
    fs::create_dir(dir.path().join("plain")).unwrap();

    assert_eq!(executor.execute("SHOW DATABASES;").unwrap(), "alpha beta");
}

#[test]
fn test_concurrent_inserts_serialize_per_table() {
    let dir = tempdir().unwrap();
    let locks = Arc::new(storage::LockRegistry::new());

    {
        let mut executor = Executor::with_locks(dir.path(), locks.clone());
        executor.execute("CREATE DATABASE school;").unwrap();
        executor.execute("USE school;").unwrap();
        executor.execute("CREATE TABLE t (id INT);").unwrap();
    }

    let mut handles = Vec::new();
    for worker in 0..4 {
        let locks = locks.clone();
        let root = dir.path().to_path_buf();
        handles.push(thread::spawn(move || {
            let mut executor = Executor::with_locks(root, locks);
            executor.execute("USE school;").unwrap();
            for i in 0..25 {
                executor
                    .execute(&format!("INSERT INTO t VALUES ({});", worker * 100 + i))
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let mut executor = Executor::with_locks(dir.path(), locks);
    executor.execute("USE school;").unwrap();
    let out = executor.execute("SELECT * FROM t;").unwrap();
    assert_eq!(out.lines().count() - 2, 100);
}
