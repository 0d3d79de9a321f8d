//! CSV-as-table storage layer.
//!
//! A database is a directory whose root carries a `database.json` marker
//! record; its tables are CSV files directly inside it. Each table file has a
//! header row of column names and a first data row of declared type names
//! (the constraint row), followed by zero or more data rows.
//!
//! All mutation is a single non-atomic read-modify-write cycle per statement.
//! The [`LockRegistry`] makes multi-caller use safe within one process; two
//! separate processes writing the same table can still interleave
//! destructively.

use crate::error::{EvalError, EvalResult, ObjectKind};
use crate::sql::ColumnDef;
use chrono::Local;
use csv::{ReaderBuilder, WriterBuilder};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const MARKER_FILE: &str = "database.json";
pub const TABLE_EXTENSION: &str = "csv";

/// Marker record identifying a directory as a database.
#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseMarker {
    pub created: String,
}

impl DatabaseMarker {
    pub fn new() -> Self {
        DatabaseMarker {
            created: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl Default for DatabaseMarker {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory form of one table file.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub constraint_row: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A directory is a database iff the marker record exists at its root.
pub fn is_database(dir: &Path) -> bool {
    dir.join(MARKER_FILE).is_file()
}

pub fn create_database(path: &Path, name: &str) -> EvalResult<()> {
    if path.exists() {
        return Err(EvalError::AlreadyExists(name.to_string()));
    }
    fs::create_dir(path)?;
    let file = File::create(path.join(MARKER_FILE))?;
    serde_json::to_writer_pretty(file, &DatabaseMarker::new())?;
    log::info!("created database {}", path.display());
    Ok(())
}

pub fn drop_database(path: &Path, name: &str) -> EvalResult<()> {
    if !path.exists() {
        return Err(EvalError::not_found(ObjectKind::Database, name));
    }
    if !is_database(path) {
        return Err(EvalError::NotADatabase(name.to_string()));
    }
    fs::remove_dir_all(path)?;
    log::info!("dropped database {}", path.display());
    Ok(())
}

/// List databases directly under `root`, sorted by name.
pub fn list_databases(root: &Path) -> EvalResult<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() && is_database(&path) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

pub fn table_path(database: &Path, table: &str) -> PathBuf {
    database.join(format!("{}.{}", table, TABLE_EXTENSION))
}

/// List table base names (extension stripped) in a database, sorted.
pub fn list_tables(database: &Path) -> EvalResult<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(database)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some(TABLE_EXTENSION) {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Write a fresh table file: header row plus the constraint row, no data.
pub fn create_table(path: &Path, columns: &[ColumnDef]) -> EvalResult<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(columns.iter().map(|c| c.name.as_str()))?;
    writer.write_record(columns.iter().map(|c| c.column_type.name()))?;
    writer.flush()?;
    log::info!("created table {}", path.display());
    Ok(())
}

/// Read an entire table file into memory.
pub fn read_table(path: &Path) -> EvalResult<Table> {
    let mut reader = ReaderBuilder::new().from_path(path)?;
    let columns = reader.headers()?.iter().map(|s| s.to_string()).collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    if rows.is_empty() {
        return Err(EvalError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("table file {} is missing its constraint row", path.display()),
        )));
    }
    let constraint_row = rows.remove(0);

    Ok(Table {
        columns,
        constraint_row,
        rows,
    })
}

/// Rewrite an entire table file. The constraint row always comes first.
pub fn write_table(path: &Path, table: &Table) -> EvalResult<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(&table.columns)?;
    writer.write_record(&table.constraint_row)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Append one data row without rewriting the file.
pub fn append_row(path: &Path, cells: &[String]) -> EvalResult<()> {
    let file = OpenOptions::new().append(true).open(path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    writer.write_record(cells)?;
    writer.flush()?;
    Ok(())
}

/// Per-table advisory locks, keyed by table path. One registry is shared by
/// every session of a process, so concurrent in-process callers serialize
/// their read-modify-write cycles on the same table.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        LockRegistry {
            locks: DashMap::new(),
        }
    }

    pub fn for_table(&self, path: &Path) -> Arc<Mutex<()>> {
        self.locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
