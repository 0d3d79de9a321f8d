// Abstract syntax tree for CSVQL statements

use crate::value::{ColumnType, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateDatabase { name: String },
    CreateTable { name: String, columns: Vec<ColumnDef> },
    DropDatabase { name: String },
    DropTable { name: String },
    ShowDatabases,
    ShowTables,
    Insert { table: String, values: Vec<Value> },
    Delete { table: String, filter: FilterChain },
    Select {
        projection: Projection,
        table: String,
        filter: Option<FilterChain>,
    },
    Print(PrintExpr),
    Use { name: String },
}

/// A column definition in CREATE TABLE.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    All,
    Columns(Vec<String>),
}

/// Comparison operators. A closed enum so every comparator is matched
/// exhaustively instead of dispatched by string key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

/// One side of a comparison: a column reference or a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(String),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub left: Operand,
    pub op: Comparator,
    pub right: Operand,
}

/// A chain of comparisons joined by AND/OR, kept flat on purpose: the chain
/// is evaluated as a strict left fold with no precedence between AND and OR.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChain {
    pub first: Comparison,
    pub rest: Vec<(Combinator, Comparison)>,
}

/// Argument of PRINT. Arithmetic and boolean chains are folded to a single
/// result at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum PrintExpr {
    Value(Value),
    Bool(bool),
    Values(Vec<Value>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_chain_shape() {
        let chain = FilterChain {
            first: Comparison {
                left: Operand::Column("marks".to_string()),
                op: Comparator::Gt,
                right: Operand::Literal(Value::Int(30)),
            },
            rest: vec![(
                Combinator::And,
                Comparison {
                    left: Operand::Column("marks".to_string()),
                    op: Comparator::Lt,
                    right: Operand::Literal(Value::Int(100)),
                },
            )],
        };
        assert_eq!(chain.rest.len(), 1);
        assert_eq!(chain.rest[0].0, Combinator::And);
    }
}
