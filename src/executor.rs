//! Statement evaluation.
//!
//! Each parsed statement maps to one handler. Handlers return either a
//! human-readable success message or a typed [`EvalError`]; nothing here
//! writes to a terminal or socket, and nothing terminates the process. The
//! only state carried between calls is the session's selected database.

pub mod filter;

use crate::constraint;
use crate::error::{EvalError, EvalResult, ObjectKind};
use crate::sql::{self, ColumnDef, FilterChain, PrintExpr, Projection, Statement};
use crate::storage::{self, LockRegistry, Table};
use crate::value::Value;
use log::debug;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Session state: the single optional selected-database reference, mutated
/// only by USE and consulted by every table-scoped statement.
#[derive(Debug, Default)]
pub struct Session {
    database: Option<String>,
}

impl Session {
    pub fn selected(&self) -> Option<&str> {
        self.database.as_deref()
    }
}

/// Evaluates statements against database directories under `root`.
pub struct Executor {
    root: PathBuf,
    session: Session,
    locks: Arc<LockRegistry>,
}

impl Executor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_locks(root, Arc::new(LockRegistry::new()))
    }

    /// Create an executor sharing a lock registry with other sessions of the
    /// same process.
    pub fn with_locks(root: impl Into<PathBuf>, locks: Arc<LockRegistry>) -> Self {
        Executor {
            root: root.into(),
            session: Session::default(),
            locks,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Parse and evaluate one statement, returning its textual result.
    pub fn execute(&mut self, input: &str) -> EvalResult<String> {
        let statement = sql::parse_statement(input)?;
        debug!("executing {:?}", statement);

        match statement {
            Statement::CreateDatabase { name } => self.create_database(&name),
            Statement::CreateTable { name, columns } => self.create_table(&name, &columns),
            Statement::DropDatabase { name } => self.drop_database(&name),
            Statement::DropTable { name } => self.drop_table(&name),
            Statement::ShowDatabases => self.show_databases(),
            Statement::ShowTables => self.show_tables(),
            Statement::Insert { table, values } => self.insert(&table, &values),
            Statement::Delete { table, filter } => self.delete(&table, &filter),
            Statement::Select {
                projection,
                table,
                filter,
            } => self.select(&projection, &table, filter.as_ref()),
            Statement::Print(expr) => Ok(print_expr(&expr)),
            Statement::Use { name } => self.use_database(&name),
        }
    }

    fn create_database(&self, name: &str) -> EvalResult<String> {
        storage::create_database(&self.root.join(name), name)?;
        Ok(format!("Database {} successfully created.", name))
    }

    fn create_table(&self, name: &str, columns: &[ColumnDef]) -> EvalResult<String> {
        let database = self.selected_database()?;
        let path = storage::table_path(&database, name);
        if path.exists() {
            return Err(EvalError::AlreadyExists(name.to_string()));
        }
        storage::create_table(&path, columns)?;
        Ok(format!("Table {} successfully created.", name))
    }

    fn drop_database(&mut self, name: &str) -> EvalResult<String> {
        storage::drop_database(&self.root.join(name), name)?;
        // Never leave the session pointing at a removed directory.
        if self.session.database.as_deref() == Some(name) {
            self.session.database = None;
        }
        Ok(format!("Database {} successfully dropped.", name))
    }

    fn drop_table(&self, name: &str) -> EvalResult<String> {
        let database = self.selected_database()?;
        let path = storage::table_path(&database, name);
        let lock = self.locks.for_table(&path);
        let _guard = lock.lock();

        if !path.exists() {
            return Err(EvalError::not_found(ObjectKind::Table, name));
        }
        fs::remove_file(&path)?;
        Ok(format!("Table {} successfully dropped.", name))
    }

    fn show_databases(&self) -> EvalResult<String> {
        let names = storage::list_databases(&self.root)?;
        if names.is_empty() {
            Ok("No databases in the current directory.".to_string())
        } else {
            Ok(names.join(" "))
        }
    }

    fn show_tables(&self) -> EvalResult<String> {
        let database = self.selected_database()?;
        let names = storage::list_tables(&database)?;
        if names.is_empty() {
            Ok("No tables in the current database.".to_string())
        } else {
            Ok(names.join(" "))
        }
    }

    fn insert(&self, table: &str, values: &[Value]) -> EvalResult<String> {
        let database = self.selected_database()?;
        let path = storage::table_path(&database, table);
        let lock = self.locks.for_table(&path);
        let _guard = lock.lock();

        if !path.exists() {
            return Err(EvalError::not_found(ObjectKind::Table, table));
        }
        let stored = storage::read_table(&path)?;
        constraint::check_row(&stored.constraint_row, values)?;

        let cells: Vec<String> = values.iter().map(Value::to_cell).collect();
        storage::append_row(&path, &cells)?;
        Ok(format!("Successfully inserted into table {}.", table))
    }

    fn delete(&self, table: &str, filter: &FilterChain) -> EvalResult<String> {
        let database = self.selected_database()?;
        let path = storage::table_path(&database, table);
        let lock = self.locks.for_table(&path);
        let _guard = lock.lock();

        if !path.exists() {
            return Err(EvalError::not_found(ObjectKind::Table, table));
        }
        let stored = storage::read_table(&path)?;
        let mask = filter::evaluate(&stored, filter)?;

        // Anti-match: keep every row the filter does not match.
        let Table {
            columns,
            constraint_row,
            rows,
        } = stored;
        let mut kept = Vec::with_capacity(rows.len());
        let mut deleted = 0usize;
        for (row, matched) in rows.into_iter().zip(mask) {
            if matched {
                deleted += 1;
            } else {
                kept.push(row);
            }
        }

        storage::write_table(
            &path,
            &Table {
                columns,
                constraint_row,
                rows: kept,
            },
        )?;
        Ok(format!("Deleted {} row(s) from table {}.", deleted, table))
    }

    fn select(
        &self,
        projection: &Projection,
        table: &str,
        filter: Option<&FilterChain>,
    ) -> EvalResult<String> {
        let database = self.selected_database()?;
        let path = storage::table_path(&database, table);
        let lock = self.locks.for_table(&path);
        let _guard = lock.lock();

        if !path.exists() {
            return Err(EvalError::not_found(ObjectKind::Table, table));
        }
        let stored = storage::read_table(&path)?;

        let mask = match filter {
            Some(filter) => filter::evaluate(&stored, filter)?,
            None => vec![true; stored.rows.len()],
        };

        // Resolve the projection to column indices.
        let indices: Vec<usize> = match projection {
            Projection::All => (0..stored.columns.len()).collect(),
            Projection::Columns(names) => names
                .iter()
                .map(|name| {
                    stored
                        .columns
                        .iter()
                        .position(|c| c == name)
                        .ok_or_else(|| EvalError::Filter(format!("unknown column '{}'", name)))
                })
                .collect::<EvalResult<_>>()?,
        };

        let headers: Vec<String> = indices
            .iter()
            .map(|&i| stored.columns[i].clone())
            .collect();
        let rows: Vec<Vec<String>> = stored
            .rows
            .iter()
            .zip(&mask)
            .filter(|(_, matched)| **matched)
            .map(|(row, _)| {
                indices
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(render(&headers, &rows))
    }

    fn use_database(&mut self, name: &str) -> EvalResult<String> {
        let path = self.root.join(name);
        if !path.exists() {
            return Err(EvalError::not_found(ObjectKind::Database, name));
        }
        if !storage::is_database(&path) {
            return Err(EvalError::NotADatabase(name.to_string()));
        }
        self.session.database = Some(name.to_string());
        Ok(format!("Database {} successfully selected.", name))
    }

    /// Guard shared by all table-scoped handlers: requires a selected
    /// database and re-verifies the directory is still a database on disk.
    fn selected_database(&self) -> EvalResult<PathBuf> {
        let name = self
            .session
            .database
            .as_ref()
            .ok_or(EvalError::NoDatabaseSelected)?;
        let path = self.root.join(name);
        if !storage::is_database(&path) {
            return Err(EvalError::not_found(ObjectKind::Database, name));
        }
        Ok(path)
    }
}

fn print_expr(expr: &PrintExpr) -> String {
    match expr {
        PrintExpr::Value(value) => value.to_string(),
        PrintExpr::Bool(b) => b.to_string(),
        PrintExpr::Values(values) => values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Render result rows as an aligned text table. The constraint row never
/// reaches this function; query results carry data rows only.
fn render(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }

    let mut out = String::new();
    out.push_str(&render_line(headers, &widths));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in rows {
        out.push('\n');
        out.push_str(&render_line(row, &widths));
    }
    out
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}
