// Parser - converts one line of statement text to an AST

use super::ast::*;
use super::lexer::Lexer;
use super::token::Token;
use crate::error::{EvalError, EvalResult};
use crate::value::{ColumnType, Value};
use std::cmp::Ordering;

/// Parse a single statement. Convenience wrapper around [`Parser`].
pub fn parse_statement(input: &str) -> EvalResult<Statement> {
    Parser::new(input)?.parse()
}

pub struct Parser {
    tokens: Vec<Token>,
    offsets: Vec<usize>,
    position: usize,
}

#[derive(Debug, Clone, Copy)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl Parser {
    pub fn new(input: &str) -> EvalResult<Self> {
        let spanned = Lexer::new(input)
            .tokenize()
            .map_err(|(position, message)| EvalError::Parse { position, message })?;
        let (tokens, offsets): (Vec<_>, Vec<_>) = spanned.into_iter().unzip();
        Ok(Parser {
            tokens,
            offsets,
            position: 0,
        })
    }

    /// Parse exactly one statement, with an optional trailing semicolon.
    pub fn parse(&mut self) -> EvalResult<Statement> {
        let statement = match self.current_token() {
            Token::Create => self.parse_create()?,
            Token::Drop => self.parse_drop()?,
            Token::Show => self.parse_show()?,
            Token::Insert => self.parse_insert()?,
            Token::Delete => self.parse_delete()?,
            Token::Select => self.parse_select()?,
            Token::Print => self.parse_print()?,
            Token::Use => self.parse_use()?,
            _ => return Err(self.error("expected a statement keyword")),
        };

        if self.match_token(&Token::Semicolon) {
            self.advance();
        }
        if !self.match_token(&Token::Eof) {
            return Err(self.error("expected end of statement"));
        }

        Ok(statement)
    }

    /// Parse CREATE DATABASE name / CREATE TABLE name (col TYPE, ...)
    fn parse_create(&mut self) -> EvalResult<Statement> {
        self.expect_token(Token::Create)?;

        match self.current_token() {
            Token::Database => {
                self.advance();
                let name = self.expect_identifier()?;
                Ok(Statement::CreateDatabase { name })
            }
            Token::Table => {
                self.advance();
                let name = self.expect_identifier()?;
                let columns = self.parse_column_defs()?;
                Ok(Statement::CreateTable { name, columns })
            }
            _ => Err(self.error("expected DATABASE or TABLE")),
        }
    }

    fn parse_drop(&mut self) -> EvalResult<Statement> {
        self.expect_token(Token::Drop)?;

        match self.current_token() {
            Token::Database => {
                self.advance();
                let name = self.expect_identifier()?;
                Ok(Statement::DropDatabase { name })
            }
            Token::Table => {
                self.advance();
                let name = self.expect_identifier()?;
                Ok(Statement::DropTable { name })
            }
            _ => Err(self.error("expected DATABASE or TABLE")),
        }
    }

    fn parse_show(&mut self) -> EvalResult<Statement> {
        self.expect_token(Token::Show)?;

        match self.current_token() {
            Token::Databases => {
                self.advance();
                Ok(Statement::ShowDatabases)
            }
            Token::Tables => {
                self.advance();
                Ok(Statement::ShowTables)
            }
            _ => Err(self.error("expected DATABASES or TABLES")),
        }
    }

    fn parse_insert(&mut self) -> EvalResult<Statement> {
        self.expect_token(Token::Insert)?;
        self.expect_token(Token::Into)?;
        let table = self.expect_identifier()?;
        let values = self.parse_values_list()?;
        Ok(Statement::Insert { table, values })
    }

    fn parse_delete(&mut self) -> EvalResult<Statement> {
        self.expect_token(Token::Delete)?;
        self.expect_token(Token::From)?;
        let table = self.expect_identifier()?;
        self.expect_token(Token::Where)?;
        let filter = self.parse_filter_chain()?;
        Ok(Statement::Delete { table, filter })
    }

    fn parse_select(&mut self) -> EvalResult<Statement> {
        self.expect_token(Token::Select)?;

        let projection = if self.match_token(&Token::Star) {
            self.advance();
            Projection::All
        } else {
            let mut columns = vec![self.expect_identifier()?];
            while self.match_token(&Token::Comma) {
                self.advance();
                columns.push(self.expect_identifier()?);
            }
            Projection::Columns(columns)
        };

        self.expect_token(Token::From)?;
        let table = self.expect_identifier()?;

        let filter = if self.match_token(&Token::Where) {
            self.advance();
            Some(self.parse_filter_chain()?)
        } else {
            None
        };

        Ok(Statement::Select {
            projection,
            table,
            filter,
        })
    }

    /// Parse PRINT expr. Alternatives are tried in a fixed order so that a
    /// bare literal does not greedily truncate a longer expression:
    /// arithmetic first (a lone number is a zero-operator fold), then a
    /// boolean chain when a comparator follows, then a VALUES list, then a
    /// string literal.
    fn parse_print(&mut self) -> EvalResult<Statement> {
        self.expect_token(Token::Print)?;

        let expr = match self.current_token() {
            Token::Values => PrintExpr::Values(self.parse_values_list()?),
            Token::Number(_) | Token::Plus | Token::Minus | Token::String(_) => {
                let head = self.parse_print_operand()?;
                if self.at_comparator() {
                    PrintExpr::Bool(self.parse_boolean_fold(head)?)
                } else {
                    PrintExpr::Value(head)
                }
            }
            _ => return Err(self.error("expected an expression")),
        };

        Ok(Statement::Print(expr))
    }

    /// One operand of a PRINT expression: a string literal, or an arithmetic
    /// fold (so `1 + 1 < 3` compares 2 with 3).
    fn parse_print_operand(&mut self) -> EvalResult<Value> {
        match self.current_token() {
            Token::String(s) => {
                self.advance();
                Ok(Value::Text(s))
            }
            _ => self.parse_arithmetic(),
        }
    }

    fn at_comparator(&self) -> bool {
        matches!(
            self.current_token(),
            Token::Equal
                | Token::Greater
                | Token::Less
                | Token::GreaterEqual
                | Token::LessEqual
                | Token::NotEqual
        )
    }

    /// Eagerly fold `cmp (AND|OR cmp)*` where the left operand of the first
    /// comparison has already been consumed. Same strict left fold as row
    /// filters: no precedence between AND and OR, each combinator applies to
    /// the running accumulator.
    fn parse_boolean_fold(&mut self, first_left: Value) -> EvalResult<bool> {
        let mut acc = self.parse_literal_comparison(first_left)?;

        loop {
            let combinator = match self.current_token() {
                Token::And => Combinator::And,
                Token::Or => Combinator::Or,
                _ => break,
            };
            self.advance();
            let left = self.parse_print_operand()?;
            let next = self.parse_literal_comparison(left)?;
            acc = match combinator {
                Combinator::And => acc && next,
                Combinator::Or => acc || next,
            };
        }

        Ok(acc)
    }

    /// Parse `op operand` and evaluate the comparison against `left`.
    fn parse_literal_comparison(&mut self, left: Value) -> EvalResult<bool> {
        let op_offset = self.current_offset();
        let op = self.parse_comparator()?;
        let right = self.parse_print_operand()?;

        let ordering = compare_literals(&left, &right).map_err(|message| EvalError::Parse {
            position: op_offset,
            message,
        })?;

        Ok(match op {
            Comparator::Eq => ordering == Ordering::Equal,
            Comparator::Ne => ordering != Ordering::Equal,
            Comparator::Gt => ordering == Ordering::Greater,
            Comparator::Lt => ordering == Ordering::Less,
            Comparator::Ge => ordering != Ordering::Less,
            Comparator::Le => ordering != Ordering::Greater,
        })
    }

    fn parse_use(&mut self) -> EvalResult<Statement> {
        self.expect_token(Token::Use)?;
        let name = self.expect_identifier()?;
        Ok(Statement::Use { name })
    }

    /// Parse `( name TYPE, name TYPE, ... )`.
    fn parse_column_defs(&mut self) -> EvalResult<Vec<ColumnDef>> {
        self.expect_token(Token::LeftParen)?;

        let mut columns = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            let column_type = self.parse_column_type()?;
            columns.push(ColumnDef { name, column_type });

            if !self.match_token(&Token::Comma) {
                break;
            }
            self.advance();
        }

        self.expect_token(Token::RightParen)?;
        Ok(columns)
    }

    fn parse_column_type(&mut self) -> EvalResult<ColumnType> {
        let column_type = match self.current_token() {
            Token::IntType => ColumnType::Int,
            Token::FloatType => ColumnType::Float,
            Token::StringType => ColumnType::String,
            _ => return Err(self.error("expected a column type (INT, FLOAT or STRING)")),
        };
        self.advance();
        Ok(column_type)
    }

    /// Parse `VALUES ( v1, v2, ... )`.
    fn parse_values_list(&mut self) -> EvalResult<Vec<Value>> {
        self.expect_token(Token::Values)?;
        self.expect_token(Token::LeftParen)?;

        let mut values = vec![self.parse_literal()?];
        while self.match_token(&Token::Comma) {
            self.advance();
            values.push(self.parse_literal()?);
        }

        self.expect_token(Token::RightParen)?;
        Ok(values)
    }

    /// Parse a comparison chain joined by AND/OR, kept flat for the
    /// left-fold evaluation.
    fn parse_filter_chain(&mut self) -> EvalResult<FilterChain> {
        let first = self.parse_comparison()?;

        let mut rest = Vec::new();
        loop {
            let combinator = match self.current_token() {
                Token::And => Combinator::And,
                Token::Or => Combinator::Or,
                _ => break,
            };
            self.advance();
            rest.push((combinator, self.parse_comparison()?));
        }

        Ok(FilterChain { first, rest })
    }

    fn parse_comparison(&mut self) -> EvalResult<Comparison> {
        let left = self.parse_operand()?;
        let op = self.parse_comparator()?;
        let right = self.parse_operand()?;
        Ok(Comparison { left, op, right })
    }

    fn parse_operand(&mut self) -> EvalResult<Operand> {
        match self.current_token() {
            Token::Identifier(name) => {
                self.advance();
                Ok(Operand::Column(name))
            }
            _ => Ok(Operand::Literal(self.parse_literal()?)),
        }
    }

    fn parse_comparator(&mut self) -> EvalResult<Comparator> {
        let op = match self.current_token() {
            Token::Equal => Comparator::Eq,
            Token::Greater => Comparator::Gt,
            Token::Less => Comparator::Lt,
            Token::GreaterEqual => Comparator::Ge,
            Token::LessEqual => Comparator::Le,
            Token::NotEqual => Comparator::Ne,
            _ => return Err(self.error("expected a comparison operator")),
        };
        self.advance();
        Ok(op)
    }

    /// Parse a literal: a quoted string or a signed number.
    fn parse_literal(&mut self) -> EvalResult<Value> {
        match self.current_token() {
            Token::String(s) => {
                self.advance();
                Ok(Value::Text(s))
            }
            _ => self.parse_signed_number(),
        }
    }

    fn parse_signed_number(&mut self) -> EvalResult<Value> {
        let negative = match self.current_token() {
            Token::Minus => {
                self.advance();
                true
            }
            Token::Plus => {
                self.advance();
                false
            }
            _ => false,
        };

        match self.current_token() {
            Token::Number(raw) => {
                let offset = self.current_offset();
                self.advance();
                if raw.contains('.') {
                    let v: f64 = raw.parse().map_err(|_| EvalError::Parse {
                        position: offset,
                        message: format!("invalid number '{}'", raw),
                    })?;
                    Ok(Value::Float(if negative { -v } else { v }))
                } else {
                    let v: i64 = raw.parse().map_err(|_| EvalError::Parse {
                        position: offset,
                        message: format!("integer literal '{}' out of range", raw),
                    })?;
                    Ok(Value::Int(if negative { -v } else { v }))
                }
            }
            _ => Err(self.error("expected a number")),
        }
    }

    /// Eagerly fold `number (op number)*` left to right. No operator
    /// precedence: the grammar is flat, and each operator applies to the
    /// running accumulator. Integer operands stay integer except under
    /// division, which is always true division.
    fn parse_arithmetic(&mut self) -> EvalResult<Value> {
        let mut acc = self.parse_signed_number()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => ArithOp::Add,
                Token::Minus => ArithOp::Sub,
                Token::Star => ArithOp::Mul,
                Token::Slash => ArithOp::Div,
                _ => break,
            };
            let op_offset = self.current_offset();
            self.advance();
            let rhs = self.parse_signed_number()?;

            acc = apply_arith(acc, op, rhs).map_err(|message| EvalError::Parse {
                position: op_offset,
                message,
            })?;
        }

        Ok(acc)
    }

    // Helper methods

    fn current_token(&self) -> Token {
        self.tokens
            .get(self.position)
            .cloned()
            .unwrap_or(Token::Eof)
    }

    fn current_offset(&self) -> usize {
        self.offsets.get(self.position).copied().unwrap_or(0)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn match_token(&self, token: &Token) -> bool {
        self.current_token() == *token
    }

    fn expect_token(&mut self, token: Token) -> EvalResult<()> {
        if self.current_token() == token {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected {}", token.describe())))
        }
    }

    fn expect_identifier(&mut self) -> EvalResult<String> {
        match self.current_token() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error("expected an identifier")),
        }
    }

    fn error(&self, message: impl Into<String>) -> EvalError {
        EvalError::Parse {
            position: self.current_offset(),
            message: format!(
                "{}, found {}",
                message.into(),
                self.current_token().describe()
            ),
        }
    }
}

fn apply_arith(lhs: Value, op: ArithOp, rhs: Value) -> Result<Value, String> {
    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        match op {
            ArithOp::Add => {
                return a
                    .checked_add(*b)
                    .map(Value::Int)
                    .ok_or_else(|| "integer overflow".to_string());
            }
            ArithOp::Sub => {
                return a
                    .checked_sub(*b)
                    .map(Value::Int)
                    .ok_or_else(|| "integer overflow".to_string());
            }
            ArithOp::Mul => {
                return a
                    .checked_mul(*b)
                    .map(Value::Int)
                    .ok_or_else(|| "integer overflow".to_string());
            }
            ArithOp::Div => {} // falls through to true division below
        }
    }

    let a = numeric(&lhs)?;
    let b = numeric(&rhs)?;
    match op {
        ArithOp::Add => Ok(Value::Float(a + b)),
        ArithOp::Sub => Ok(Value::Float(a - b)),
        ArithOp::Mul => Ok(Value::Float(a * b)),
        ArithOp::Div => {
            if b == 0.0 {
                Err("division by zero".to_string())
            } else {
                Ok(Value::Float(a / b))
            }
        }
    }
}

fn numeric(value: &Value) -> Result<f64, String> {
    match value {
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        Value::Text(_) => Err("expected a number".to_string()),
    }
}

/// Compare two literals: numeric when both are numeric, lexicographic when
/// both are text. Mixing text with a number is an error.
fn compare_literals(left: &Value, right: &Value) -> Result<Ordering, String> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Text(a), Value::Text(b)) => Ok(a.cmp(b)),
        (Value::Text(_), _) | (_, Value::Text(_)) => {
            Err(format!("cannot compare '{}' with '{}'", left, right))
        }
        _ => {
            let a = numeric(left)?;
            let b = numeric(right)?;
            a.partial_cmp(&b)
                .ok_or_else(|| format!("cannot compare '{}' with '{}'", left, right))
        }
    }
}
