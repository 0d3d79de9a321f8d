// Lexer - tokenizes statement text

use super::token::Token;

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenize the entire input. Each token is paired with the character
    /// offset where it starts, so the parser can report the offending
    /// position on failure.
    pub fn tokenize(&mut self) -> Result<Vec<(Token, usize)>, (usize, String)> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let offset = self.position;
            let token = self.next_token()?;
            let at_end = token == Token::Eof;
            tokens.push((token, offset));
            if at_end {
                break;
            }
        }

        Ok(tokens)
    }

    /// Get the next token from the input. Assumes leading whitespace has
    /// already been skipped.
    fn next_token(&mut self) -> Result<Token, (usize, String)> {
        let ch = match self.current_char() {
            Some(ch) => ch,
            None => return Ok(Token::Eof),
        };

        let token = match ch {
            '+' => {
                self.advance();
                Token::Plus
            }
            '-' => {
                self.advance();
                Token::Minus
            }
            '*' => {
                self.advance();
                Token::Star
            }
            '/' => {
                self.advance();
                Token::Slash
            }
            '=' => {
                self.advance();
                Token::Equal
            }
            '<' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::LessEqual
                } else {
                    Token::Less
                }
            }
            '>' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::GreaterEqual
                } else {
                    Token::Greater
                }
            }
            '!' => {
                let offset = self.position;
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::NotEqual
                } else {
                    return Err((offset, "expected '=' after '!'".to_string()));
                }
            }
            '(' => {
                self.advance();
                Token::LeftParen
            }
            ')' => {
                self.advance();
                Token::RightParen
            }
            ',' => {
                self.advance();
                Token::Comma
            }
            ';' => {
                self.advance();
                Token::Semicolon
            }
            '\'' | '"' => self.read_string(ch)?,
            c if c.is_ascii_alphabetic() || c == '_' => self.read_identifier(),
            c if c.is_ascii_digit() => self.read_number(),
            '.' if self.peek().map_or(false, |c| c.is_ascii_digit()) => self.read_number(),
            c => {
                return Err((self.position, format!("unexpected character '{}'", c)));
            }
        };

        Ok(token)
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read an identifier or keyword.
    fn read_identifier(&mut self) -> Token {
        let mut identifier = String::new();

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::keyword_from_str(&identifier).unwrap_or(Token::Identifier(identifier))
    }

    /// Read a quoted string literal. Both single and double quotes are
    /// accepted; the quotes are stripped.
    fn read_string(&mut self, quote: char) -> Result<Token, (usize, String)> {
        let start = self.position;
        self.advance(); // Skip opening quote
        let mut string = String::new();

        loop {
            match self.current_char() {
                Some(ch) if ch == quote => {
                    self.advance(); // Skip closing quote
                    return Ok(Token::String(string));
                }
                Some(ch) => {
                    string.push(ch);
                    self.advance();
                }
                None => {
                    return Err((start, "unterminated string literal".to_string()));
                }
            }
        }
    }

    /// Read an unsigned number (integer or real). Signs are handled by the
    /// parser so that `5 - 3` and `-3` both tokenize consistently.
    fn read_number(&mut self) -> Token {
        let mut number = String::new();
        let mut has_dot = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::Number(number)
    }
}
