// Tokens for lexical analysis of CSVQL statements

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Identifier(String),
    Number(String),
    String(String),

    // Statement keywords
    Create,
    Drop,
    Show,
    Insert,
    Delete,
    Select,
    Print,
    Use,

    // Clause keywords
    Database,
    Databases,
    Table,
    Tables,
    Into,
    Values,
    From,
    Where,
    And,
    Or,

    // Column type names
    IntType,
    FloatType,
    StringType,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,

    // Delimiters
    LeftParen,
    RightParen,
    Comma,
    Semicolon,

    // Special
    Eof,
}

impl Token {
    /// Convert a word to a keyword token if it matches (case-insensitive).
    pub fn keyword_from_str(s: &str) -> Option<Token> {
        match s.to_uppercase().as_str() {
            "CREATE" => Some(Token::Create),
            "DROP" => Some(Token::Drop),
            "SHOW" => Some(Token::Show),
            "INSERT" => Some(Token::Insert),
            "DELETE" => Some(Token::Delete),
            "SELECT" => Some(Token::Select),
            "PRINT" => Some(Token::Print),
            "USE" => Some(Token::Use),
            "DATABASE" => Some(Token::Database),
            "DATABASES" => Some(Token::Databases),
            "TABLE" => Some(Token::Table),
            "TABLES" => Some(Token::Tables),
            "INTO" => Some(Token::Into),
            "VALUES" => Some(Token::Values),
            "FROM" => Some(Token::From),
            "WHERE" => Some(Token::Where),
            "AND" => Some(Token::And),
            "OR" => Some(Token::Or),
            "INT" => Some(Token::IntType),
            "FLOAT" => Some(Token::FloatType),
            "STRING" => Some(Token::StringType),
            _ => None,
        }
    }

    /// Short description used in parse error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Identifier(name) => format!("identifier '{}'", name),
            Token::Number(n) => format!("number '{}'", n),
            Token::String(s) => format!("string '{}'", s),
            Token::Eof => "end of input".to_string(),
            other => format!("{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_from_str() {
        assert_eq!(Token::keyword_from_str("SELECT"), Some(Token::Select));
        assert_eq!(Token::keyword_from_str("select"), Some(Token::Select));
        assert_eq!(Token::keyword_from_str("Values"), Some(Token::Values));
        assert_eq!(Token::keyword_from_str("STRING"), Some(Token::StringType));
        assert_eq!(Token::keyword_from_str("marks"), None);
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            Token::Identifier("marks".to_string()).describe(),
            "identifier 'marks'"
        );
        assert_eq!(Token::Eof.describe(), "end of input");
    }
}
