//! Values and declared column types.
//!
//! A [`Value`] is a literal as it appears in statement text: an integer, a
//! float, or a quoted string. A [`ColumnType`] is a declared type name from a
//! table's constraint row. Conformance is lexical: a value conforms to a type
//! only when its literal form matches that type's grammar, so an integer
//! literal does not conform to FLOAT and a bare number never conforms to
//! STRING.

use std::fmt;

/// Declared column types. The set is closed; a constraint-row cell naming
/// anything else constrains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
    String,
}

impl ColumnType {
    /// Parse a type name, case-insensitively. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "INT" => Some(ColumnType::Int),
            "FLOAT" => Some(ColumnType::Float),
            "STRING" => Some(ColumnType::String),
            _ => None,
        }
    }

    /// The canonical type name as written into a constraint row.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Int => "INT",
            ColumnType::Float => "FLOAT",
            ColumnType::String => "STRING",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Lexical conformance to a declared type. Each literal form satisfies
    /// exactly one type: integer literals are INT only (a FLOAT column wants
    /// a decimal point), real literals are FLOAT only, quoted text is STRING
    /// only.
    pub fn conforms_to(&self, column_type: ColumnType) -> bool {
        matches!(
            (self, column_type),
            (Value::Int(_), ColumnType::Int)
                | (Value::Float(_), ColumnType::Float)
                | (Value::Text(_), ColumnType::String)
        )
    }

    /// The value as a CSV cell: text unquoted, floats always with a decimal
    /// point so the cell still conforms to its column on re-read.
    pub fn to_cell(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => {
                // A round float keeps its decimal point ("2.0", not "2").
                if v.is_finite() && v.fract() == 0.0 {
                    write!(f, "{:.1}", v)
                } else {
                    write!(f, "{}", v)
                }
            }
            Value::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_parse() {
        assert_eq!(ColumnType::parse("INT"), Some(ColumnType::Int));
        assert_eq!(ColumnType::parse("float"), Some(ColumnType::Float));
        assert_eq!(ColumnType::parse("String"), Some(ColumnType::String));
        assert_eq!(ColumnType::parse("JSON"), None);
        assert_eq!(ColumnType::parse(""), None);
    }

    #[test]
    fn test_conformance_is_exact() {
        assert!(Value::Int(1).conforms_to(ColumnType::Int));
        assert!(!Value::Int(1).conforms_to(ColumnType::Float));
        assert!(!Value::Int(1).conforms_to(ColumnType::String));

        assert!(Value::Float(1.5).conforms_to(ColumnType::Float));
        assert!(!Value::Float(1.5).conforms_to(ColumnType::Int));

        assert!(Value::Text("a".to_string()).conforms_to(ColumnType::String));
        assert!(!Value::Text("1".to_string()).conforms_to(ColumnType::Int));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Float(0.5).to_string(), "0.5");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(-3.0).to_string(), "-3.0");
        assert_eq!(Value::Text("amy".to_string()).to_string(), "amy");
    }

    #[test]
    fn test_to_cell_round_trips_float_conformance() {
        let cell = Value::Float(2.0).to_cell();
        assert_eq!(cell, "2.0");
        // The written cell is still a real literal, not a bare integer.
        assert!(cell.contains('.'));
    }
}
