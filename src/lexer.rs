use crate::error::{Diagnostic, Position, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Whole-line tokens, lexeme is the raw line text
    Blank,
    Comment,
    Native,

    // Directives
    If,
    Elif,
    Else,
    Endif,

    // Expression operands, lexeme is the quoted content or the variable name
    String,
    Variable,

    // Comparison operators
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Rest of a directive line that failed to lex; already reported
    Invalid,

    // Special
    Newline,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub span: Span,
    pub position: Position,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span, position: Position) -> Self {
        Self {
            token_type,
            lexeme,
            span,
            position,
        }
    }

    /// Source text of the token, as shown in diagnostics.
    pub fn text(&self) -> String {
        match self.token_type {
            TokenType::String => format!("\"{}\"", self.lexeme),
            TokenType::Variable => format!("${}", self.lexeme),
            TokenType::Newline => "<end of line>".to_string(),
            TokenType::Eof => "<end of file>".to_string(),
            _ => self.lexeme.clone(),
        }
    }
}

/// Splits a Dokafile into line tokens. Directive lines are further split
/// into expression tokens; every other line becomes a single token. Each
/// line is terminated by a `Newline` token and the stream by `Eof`.
///
/// Lexical problems are collected rather than returned early: the offending
/// remainder of the line becomes an `Invalid` token so the parser can still
/// check the block structure around it.
pub struct Lexer {
    source: String,
    path: String,
    tokens: Vec<Token>,
    errors: Vec<Diagnostic>,
    start: usize,
    current: usize,
    line: usize,
    line_start: usize,
    line_end: usize,
}

impl Lexer {
    pub fn new(source: &str, path: &str) -> Self {
        Self {
            source: source.to_string(),
            path: path.to_string(),
            tokens: Vec::new(),
            errors: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            line_start: 0,
            line_end: 0,
        }
    }

    pub fn scan_tokens(&mut self) -> Vec<Token> {
        let length = self.source.len();

        while self.line_start < length {
            let rest = &self.source[self.line_start..];
            let (line_length, terminator) = match rest.find('\n') {
                Some(index) => (index, 1),
                None => (rest.len(), 0),
            };

            self.line_end = self.line_start + line_length;
            if self.source[self.line_start..self.line_end].ends_with('\r') {
                self.line_end -= 1;
            }

            self.scan_line();

            self.start = self.line_end;
            self.current = self.line_end;
            self.add_token_with_content(TokenType::Newline, String::new());

            self.line_start += line_length + terminator;
            self.line += 1;
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            String::new(),
            Span::new(length, length),
            Position::new(self.line, 1),
        ));

        self.tokens.clone()
    }

    /// Lexical diagnostics collected by the last `scan_tokens` call.
    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    fn scan_line(&mut self) {
        let text = &self.source[self.line_start..self.line_end];
        let trimmed = text.trim_start();
        let indent = text.len() - trimmed.len();

        self.start = self.line_start;
        self.current = self.line_end;

        if trimmed.trim_end().is_empty() {
            self.add_token(TokenType::Blank);
        } else if trimmed.starts_with('#') {
            self.add_token(TokenType::Comment);
        } else if trimmed.starts_with('@') {
            self.start = self.line_start + indent;
            self.current = self.start;
            self.directive();
        } else {
            self.add_token(TokenType::Native);
        }
    }

    fn directive(&mut self) {
        // Consume the '@'
        self.advance();
        while is_identifier_char(self.peek()) {
            self.advance();
        }

        let word = self.source[self.start + 1..self.current].to_string();
        let token_type = match word.as_str() {
            "if" => TokenType::If,
            "elif" => TokenType::Elif,
            "else" => TokenType::Else,
            "endif" => TokenType::Endif,
            _ => {
                let directive = format!("@{}", word);
                let error = self.error_here("unknown directive", &directive).with_detail(format!(
                    "unknown directive '{}', expected one of '@if', '@elif', '@else' or '@endif'",
                    directive
                ));
                self.invalidate_line(error);
                return;
            }
        };
        self.add_token(token_type);

        while !self.is_at_line_end() {
            self.start = self.current;
            if let Err(error) = self.scan_token() {
                self.invalidate_line(error);
                return;
            }
        }
    }

    fn scan_token(&mut self) -> Result<(), Diagnostic> {
        let c = self.advance();

        match c {
            ' ' | '\t' => {
                // Ignore whitespace
            }
            '=' => {
                if self.match_char('=') {
                    self.add_token(TokenType::EqualEqual);
                } else {
                    return Err(self
                        .error_here("unexpected character", "=")
                        .with_help("use '==' to compare two values".to_string()));
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenType::BangEqual);
                } else {
                    return Err(self.error_here("unexpected character", "!"));
                }
            }
            '<' => {
                let token_type = if self.match_char('=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                };
                self.add_token(token_type);
            }
            '>' => {
                let token_type = if self.match_char('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.add_token(token_type);
            }
            '"' => self.string()?,
            '$' => self.variable()?,
            c if c.is_whitespace() => {}
            _ => {
                return Err(self.error_here("unexpected character", &c.to_string()));
            }
        }

        Ok(())
    }

    fn string(&mut self) -> Result<(), Diagnostic> {
        while self.peek() != '"' && !self.is_at_line_end() {
            self.advance();
        }

        if self.is_at_line_end() {
            let literal = self.source[self.start..self.current].to_string();
            return Err(self
                .error_here("unterminated string literal", &literal)
                .with_help("string literals must be closed with '\"' on the same line".to_string()));
        }

        // Consume the closing "
        self.advance();

        let content = self.source[self.start + 1..self.current - 1].to_string();
        self.add_token_with_content(TokenType::String, content);
        Ok(())
    }

    fn variable(&mut self) -> Result<(), Diagnostic> {
        let first = self.peek();
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(self
                .error_here("expected variable name after", "$")
                .with_detail("expected a variable name matching [a-zA-Z_][a-zA-Z0-9_]* after '$'".to_string()));
        }

        while is_identifier_char(self.peek()) {
            self.advance();
        }

        let name = self.source[self.start + 1..self.current].to_string();
        self.add_token_with_content(TokenType::Variable, name);
        Ok(())
    }

    /// Records `error` and turns the rest of the line into one `Invalid` token.
    fn invalidate_line(&mut self, error: Diagnostic) {
        self.errors.push(error);
        self.current = self.line_end;
        self.add_token(TokenType::Invalid);
    }

    fn error_here(&self, message: &str, token: &str) -> Diagnostic {
        Diagnostic::syntax_error(
            &self.path,
            self.position_of(self.start),
            Span::new(self.start, self.current.max(self.start + 1)),
            message,
            token,
        )
    }

    fn position_of(&self, offset: usize) -> Position {
        let column = self.source[self.line_start..offset].chars().count() + 1;
        Position::new(self.line, column)
    }

    fn is_at_line_end(&self) -> bool {
        self.current >= self.line_end
    }

    fn advance(&mut self) -> char {
        if self.is_at_line_end() {
            return '\0';
        }

        let c = self.source[self.current..].chars().next().unwrap_or('\0');
        self.current += c.len_utf8();
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_line_end() || self.peek() != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn peek(&self) -> char {
        if self.is_at_line_end() {
            return '\0';
        }
        self.source[self.current..].chars().next().unwrap_or('\0')
    }

    fn add_token(&mut self, token_type: TokenType) {
        let text = self.source[self.start..self.current].to_string();
        self.add_token_with_content(token_type, text);
    }

    fn add_token_with_content(&mut self, token_type: TokenType, lexeme: String) {
        let position = self.position_of(self.start);
        self.tokens.push(Token::new(
            token_type,
            lexeme,
            Span::new(self.start, self.current),
            position,
        ));
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
