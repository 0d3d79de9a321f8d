//! Filter evaluation over table rows.
//!
//! A filter is a flat chain of comparisons joined by AND/OR. The chain is
//! evaluated as a strict left fold with NO precedence between AND and OR:
//! each combinator applies to the running boolean accumulator and the next
//! predicate, i.e. `(((p0 OP p1) OP p2) ...)`. This mirrors the flat grammar
//! and is a deliberate semantics choice, not standard SQL precedence.

use crate::constraint::derive_schema;
use crate::error::{EvalError, EvalResult};
use crate::sql::{Combinator, Comparator, Comparison, FilterChain, Operand};
use crate::storage::Table;
use crate::value::{ColumnType, Value};
use std::cmp::Ordering;

/// Evaluate the filter against every data row of the table. Returns one
/// boolean per row; `true` marks a matching row. The constraint row is not
/// part of `table.rows` and is never filtered.
pub fn evaluate(table: &Table, filter: &FilterChain) -> EvalResult<Vec<bool>> {
    let schema = derive_schema(&table.constraint_row);
    table
        .rows
        .iter()
        .map(|row| evaluate_row(table, &schema, row, filter))
        .collect()
}

fn evaluate_row(
    table: &Table,
    schema: &[Option<ColumnType>],
    row: &[String],
    filter: &FilterChain,
) -> EvalResult<bool> {
    let mut acc = evaluate_comparison(table, schema, row, &filter.first)?;

    for (combinator, comparison) in &filter.rest {
        // Strict evaluation: a resolution error in any predicate surfaces
        // even when the accumulator already decides the outcome.
        let next = evaluate_comparison(table, schema, row, comparison)?;
        acc = match combinator {
            Combinator::And => acc && next,
            Combinator::Or => acc || next,
        };
    }

    Ok(acc)
}

fn evaluate_comparison(
    table: &Table,
    schema: &[Option<ColumnType>],
    row: &[String],
    comparison: &Comparison,
) -> EvalResult<bool> {
    let left = resolve(table, schema, row, &comparison.left)?;
    let right = resolve(table, schema, row, &comparison.right)?;
    let ordering = compare(&left, &right)?;

    Ok(match comparison.op {
        Comparator::Eq => ordering == Ordering::Equal,
        Comparator::Ne => ordering != Ordering::Equal,
        Comparator::Gt => ordering == Ordering::Greater,
        Comparator::Lt => ordering == Ordering::Less,
        Comparator::Ge => ordering != Ordering::Less,
        Comparator::Le => ordering != Ordering::Greater,
    })
}

/// Resolve one side of a comparison: literals stand for themselves, column
/// names resolve to the row's cell coerced to the column's declared type.
fn resolve(
    table: &Table,
    schema: &[Option<ColumnType>],
    row: &[String],
    operand: &Operand,
) -> EvalResult<Value> {
    match operand {
        Operand::Literal(value) => Ok(value.clone()),
        Operand::Column(name) => {
            let index = table
                .columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| EvalError::Filter(format!("unknown column '{}'", name)))?;
            let cell = row.get(index).ok_or_else(|| {
                EvalError::Filter(format!("row is missing a value for column '{}'", name))
            })?;
            coerce(cell, schema.get(index).copied().flatten(), name)
        }
    }
}

/// Cast a cell to its column's declared type. A column with an unrecognized
/// declared type defaults to text.
fn coerce(cell: &str, declared: Option<ColumnType>, column: &str) -> EvalResult<Value> {
    match declared {
        Some(ColumnType::Int) => cell.trim().parse::<i64>().map(Value::Int).map_err(|e| {
            EvalError::Filter(format!(
                "column '{}': cannot read '{}' as INT: {}",
                column, cell, e
            ))
        }),
        Some(ColumnType::Float) => cell.trim().parse::<f64>().map(Value::Float).map_err(|e| {
            EvalError::Filter(format!(
                "column '{}': cannot read '{}' as FLOAT: {}",
                column, cell, e
            ))
        }),
        Some(ColumnType::String) | None => Ok(Value::Text(cell.to_string())),
    }
}

/// Compare two values: numeric comparison when both sides are numeric,
/// lexicographic when both are text. Mixing text with a number is an error.
fn compare(left: &Value, right: &Value) -> EvalResult<Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Text(a), Value::Text(b)) => Ok(a.cmp(b)),
        (Value::Text(_), _) | (_, Value::Text(_)) => Err(EvalError::Filter(format!(
            "cannot compare '{}' with '{}'",
            left, right
        ))),
        _ => {
            let a = match left {
                Value::Int(i) => *i as f64,
                Value::Float(f) => *f,
                Value::Text(_) => unreachable!(),
            };
            let b = match right {
                Value::Int(i) => *i as f64,
                Value::Float(f) => *f,
                Value::Text(_) => unreachable!(),
            };
            a.partial_cmp(&b).ok_or_else(|| {
                EvalError::Filter(format!("cannot compare '{}' with '{}'", left, right))
            })
        }
    }
}
