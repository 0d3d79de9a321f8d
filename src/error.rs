//! Error taxonomy for statement evaluation.
//!
//! Every layer reports through [`EvalError`]; handlers return
//! success-or-error explicitly and nothing in the core terminates the
//! process. Front-ends decide presentation (the REPL prints and continues,
//! the server writes the message back to the client).

use std::fmt;
use std::io;
use thiserror::Error;

/// What a not-found error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Database,
    Table,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Database => f.write_str("database"),
            ObjectKind::Table => f.write_str("table"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EvalError {
    /// Statement text rejected, with the byte offset of the offending token.
    #[error("parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("no database selected")]
    NoDatabaseSelected,

    #[error("{kind} {name} does not exist")]
    NotFound { kind: ObjectKind, name: String },

    #[error("{0} already exists")]
    AlreadyExists(String),

    /// The directory exists but carries no marker record.
    #[error("{0} is not a database")]
    NotADatabase(String),

    #[error("{0}")]
    ConstraintViolation(String),

    /// Malformed or unresolvable filter expression.
    #[error("filter error: {0}")]
    Filter(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl EvalError {
    pub fn not_found(kind: ObjectKind, name: impl Into<String>) -> Self {
        EvalError::NotFound {
            kind,
            name: name.into(),
        }
    }
}

pub type EvalResult<T> = Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = EvalError::Parse {
            position: 19,
            message: "expected a column type".to_string(),
        };
        assert_eq!(err.to_string(), "parse error at position 19: expected a column type");

        assert_eq!(
            EvalError::not_found(ObjectKind::Table, "students").to_string(),
            "table students does not exist"
        );
        assert_eq!(
            EvalError::NotADatabase("notes".to_string()).to_string(),
            "notes is not a database"
        );
    }

    #[test]
    fn test_io_conversion() {
        fn read() -> EvalResult<String> {
            Ok(std::fs::read_to_string("/nonexistent/csvql")?)
        }
        assert!(matches!(read().unwrap_err(), EvalError::Io(_)));
    }
}
