//! Constraint engine: schema derivation and typed row validation.
//!
//! A table's schema lives in its first data row (the constraint row), which
//! stores one declared type name per column. INSERT runs every value of the
//! incoming row through these constraints before anything is written.

use crate::error::{EvalError, EvalResult};
use crate::value::{ColumnType, Value};

/// Derive per-column declared types from a table's constraint row.
///
/// A cell with an unrecognized type name yields `None`; such a column is
/// treated as text by the filter evaluator.
pub fn derive_schema(constraint_row: &[String]) -> Vec<Option<ColumnType>> {
    constraint_row
        .iter()
        .map(|cell| ColumnType::parse(cell))
        .collect()
}

/// Validate one row of parsed values against the constraint row.
///
/// Arity is checked first, then each position in order; the first mismatch
/// is reported for the whole row and nothing is inserted.
pub fn check_row(constraint_row: &[String], values: &[Value]) -> EvalResult<()> {
    if values.len() != constraint_row.len() {
        return Err(EvalError::ConstraintViolation(format!(
            "the number of values ({}) does not match the number of columns ({})",
            values.len(),
            constraint_row.len(),
        )));
    }

    for (i, (cell, value)) in constraint_row.iter().zip(values).enumerate() {
        // Unrecognized type names constrain nothing.
        if let Some(column_type) = ColumnType::parse(cell) {
            if !value.conforms_to(column_type) {
                return Err(EvalError::ConstraintViolation(format!(
                    "value '{}' at position {} does not satisfy the {} constraint",
                    value,
                    i + 1,
                    column_type,
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_derive_schema() {
        assert_eq!(
            derive_schema(&row(&["INT", "STRING", "FLOAT", "JSON"])),
            vec![
                Some(ColumnType::Int),
                Some(ColumnType::String),
                Some(ColumnType::Float),
                None,
            ]
        );
    }

    #[test]
    fn test_check_row_accepts_conforming_values() {
        let constraints = row(&["INT", "STRING"]);
        assert!(check_row(
            &constraints,
            &[Value::Int(1), Value::Text("a".to_string())]
        )
        .is_ok());
    }

    #[test]
    fn test_check_row_arity_mismatch() {
        let constraints = row(&["INT", "STRING"]);
        let err = check_row(
            &constraints,
            &[
                Value::Int(1),
                Value::Text("a".to_string()),
                Value::Text("b".to_string()),
            ],
        )
        .unwrap_err();
        assert!(err.to_string().contains("number of values"));
    }

    #[test]
    fn test_check_row_type_mismatch() {
        let constraints = row(&["INT", "STRING"]);
        let err = check_row(&constraints, &[Value::Int(1), Value::Int(2)]).unwrap_err();
        assert!(err.to_string().contains("STRING constraint"));
    }

    #[test]
    fn test_check_row_float_column_rejects_integer_literal() {
        let constraints = row(&["FLOAT"]);
        assert!(check_row(&constraints, &[Value::Int(1)]).is_err());
        assert!(check_row(&constraints, &[Value::Float(1.0)]).is_ok());
    }

    #[test]
    fn test_check_row_unknown_type_constrains_nothing() {
        let constraints = row(&["JSON"]);
        assert!(check_row(&constraints, &[Value::Int(1)]).is_ok());
        assert!(check_row(&constraints, &[Value::Text("x".to_string())]).is_ok());
    }
}
