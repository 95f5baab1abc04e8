use crate::ast::{BinaryOp, Branch, Conditional, Document, Expression, Instruction, Value};
use crate::error::{Diagnostic, Position, Span};
use crate::lexer::{Lexer, Token, TokenType};

/// Deepest allowed `@if` nesting. Deeper chains are reported and skipped.
pub const MAX_NESTING: usize = 64;

/// Lexes and parses a Dokafile.
///
/// Returns the document, or every lexical and structural diagnostic found,
/// sorted by position. The two outcomes never mix.
pub fn parse(source: &str, path: &str) -> Result<Document, Vec<Diagnostic>> {
    let mut lexer = Lexer::new(source, path);
    let tokens = lexer.scan_tokens();
    let mut errors = lexer.errors().to_vec();

    let mut parser = Parser::new(tokens, path);
    match parser.parse() {
        Ok(document) if errors.is_empty() => Ok(document),
        Ok(_) => Err(errors),
        Err(parse_errors) => {
            errors.extend(parse_errors);
            errors.sort_by_key(|error| error.position);
            Err(errors)
        }
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    path: String,
    errors: Vec<Diagnostic>,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, path: &str) -> Self {
        Self {
            tokens,
            current: 0,
            path: path.to_string(),
            errors: Vec::new(),
            depth: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Document, Vec<Diagnostic>> {
        if let Some(error) = self.check_token_stream() {
            return Err(vec![error]);
        }

        let mut instructions = Vec::new();

        while !self.is_at_end() {
            if self.check_any(&[TokenType::Elif, TokenType::Else, TokenType::Endif]) {
                self.unmatched_directive();
            } else if let Some(instruction) = self.instruction() {
                instructions.push(instruction);
            }
        }

        if self.errors.is_empty() {
            Ok(Document {
                path: self.path.clone(),
                instructions,
            })
        } else {
            let mut errors = std::mem::take(&mut self.errors);
            errors.sort_by_key(|error| error.position);
            Err(errors)
        }
    }

    /// The lexer always terminates its stream with `Eof`; anything else is a
    /// contract violation between the two stages.
    fn check_token_stream(&self) -> Option<Diagnostic> {
        match self.tokens.last() {
            Some(token) if token.token_type == TokenType::Eof => None,
            Some(token) => Some(Diagnostic::internal_error(
                &self.path,
                token.position,
                token.span.clone(),
                "token stream does not end with end of input",
            )),
            None => Some(Diagnostic::internal_error(
                &self.path,
                Position::new(1, 1),
                Span::new(0, 0),
                "empty token stream",
            )),
        }
    }

    fn block(&mut self) -> Vec<Instruction> {
        let mut instructions = Vec::new();

        while !self.is_at_end()
            && !self.check_any(&[TokenType::Elif, TokenType::Else, TokenType::Endif])
        {
            if let Some(instruction) = self.instruction() {
                instructions.push(instruction);
            }
        }

        instructions
    }

    fn instruction(&mut self) -> Option<Instruction> {
        let token = self.advance().clone();

        match token.token_type {
            TokenType::Blank => {
                self.expect_line_end(&token);
                Some(Instruction::Empty {
                    position: token.position,
                    span: token.span,
                })
            }
            TokenType::Comment => {
                self.expect_line_end(&token);
                Some(Instruction::Comment {
                    text: token.lexeme,
                    position: token.position,
                    span: token.span,
                })
            }
            TokenType::Native => {
                self.expect_line_end(&token);
                Some(Instruction::NativeLine {
                    text: token.lexeme,
                    position: token.position,
                    span: token.span,
                })
            }
            TokenType::If => self.conditional(token),
            TokenType::Newline => None,
            TokenType::Invalid => {
                // Already reported by the lexer
                self.synchronize();
                None
            }
            _ => {
                self.error_at(&token, "unexpected token", &format!(
                    "unexpected '{}' at the start of a line",
                    token.text()
                ));
                self.synchronize();
                None
            }
        }
    }

    fn conditional(&mut self, if_token: Token) -> Option<Instruction> {
        if self.depth >= MAX_NESTING {
            self.error_at(&if_token, "conditional nested too deeply at", &format!(
                "conditionals cannot be nested more than {} levels deep",
                MAX_NESTING
            ));
            self.skip_conditional(&if_token);
            return None;
        }

        self.depth += 1;
        let conditional = self.conditional_chain(&if_token);
        self.depth -= 1;

        conditional.map(Instruction::Conditional)
    }

    fn conditional_chain(&mut self, if_token: &Token) -> Option<Conditional> {
        let condition = self.condition_line();
        let body = self.block();
        let mut valid = condition.is_some();
        let primary = condition.map(|condition| Branch { condition, body });

        let mut elif_branches = Vec::new();
        let mut else_body = None;
        let mut seen_else = false;

        loop {
            if self.match_types(&[TokenType::Elif]) {
                let elif_token = self.previous().clone();
                if seen_else {
                    self.error_at(&elif_token, "unexpected directive", &format!(
                        "'@elif' on line {} follows '@else'",
                        elif_token.position.line
                    ));
                    valid = false;
                }

                let condition = self.condition_line();
                let body = self.block();
                match condition {
                    Some(condition) => elif_branches.push(Branch { condition, body }),
                    None => valid = false,
                }
            } else if self.match_types(&[TokenType::Else]) {
                let else_token = self.previous().clone();
                if seen_else {
                    self.error_at(&else_token, "unexpected directive", &format!(
                        "duplicate '@else' on line {}",
                        else_token.position.line
                    ));
                    valid = false;
                }

                self.expect_line_end(&else_token);
                let body = self.block();
                if !seen_else {
                    else_body = Some(body);
                    seen_else = true;
                }
            } else {
                break;
            }
        }

        // block() only stops at a directive or at the end of input
        if !self.match_types(&[TokenType::Endif]) {
            self.error_at(if_token, "missing '@endif' for", &format!(
                "unterminated conditional: '@if' on line {} is never closed with '@endif'",
                if_token.position.line
            ));
            return None;
        }

        let endif_token = self.previous().clone();
        self.expect_line_end(&endif_token);

        if !valid {
            return None;
        }

        Some(Conditional {
            primary: primary?,
            elif_branches,
            else_body,
            position: if_token.position,
            span: Span::new(if_token.span.start, endif_token.span.end),
        })
    }

    /// Parses `value op value` followed by the end of the line.
    fn condition_line(&mut self) -> Option<Expression> {
        let left = self.value()?;

        let operator_token = self.peek().clone();
        let operator = match operator_token.token_type {
            TokenType::EqualEqual => BinaryOp::Equal,
            TokenType::BangEqual => BinaryOp::NotEqual,
            TokenType::Less | TokenType::LessEqual | TokenType::Greater | TokenType::GreaterEqual => {
                self.errors.push(Diagnostic::unsupported_operator(
                    &self.path,
                    operator_token.position,
                    operator_token.span.clone(),
                    &operator_token.lexeme,
                ));
                self.synchronize();
                return None;
            }
            TokenType::Invalid => {
                self.synchronize();
                return None;
            }
            _ => {
                self.error_at(&operator_token, "syntax error at", &format!(
                    "expected '==' or '!=' after the left operand, found '{}'",
                    operator_token.text()
                ));
                self.synchronize();
                return None;
            }
        };
        self.advance();

        let right = self.value()?;

        if !self.check(&TokenType::Newline) && !self.is_at_end() {
            let extra = self.peek().clone();
            if extra.token_type != TokenType::Invalid {
                self.error_at(&extra, "syntax error at", &format!(
                    "unexpected '{}' after the expression, a condition compares exactly two values",
                    extra.text()
                ));
            }
            self.synchronize();
            return None;
        }
        self.match_types(&[TokenType::Newline]);

        let span = Span::new(left.span().start, right.span().end);
        Some(Expression {
            left,
            operator,
            right,
            span,
        })
    }

    fn value(&mut self) -> Option<Value> {
        let token = self.peek().clone();

        match token.token_type {
            TokenType::String => {
                self.advance();
                Some(Value::Literal {
                    value: token.lexeme,
                    position: token.position,
                    span: token.span,
                })
            }
            TokenType::Variable => {
                self.advance();
                Some(Value::VariableRef {
                    name: token.lexeme,
                    position: token.position,
                    span: token.span,
                })
            }
            TokenType::Invalid => {
                self.synchronize();
                None
            }
            _ => {
                self.error_at(&token, "syntax error at", &format!(
                    "expected a string literal or a variable, found '{}'",
                    token.text()
                ));
                self.synchronize();
                None
            }
        }
    }

    fn unmatched_directive(&mut self) {
        let token = self.advance().clone();
        self.error_at(&token, "unexpected directive", &format!(
            "'{}' without a matching '@if'",
            token.lexeme
        ));
        self.synchronize();
    }

    /// Skips an over-nested conditional up to and including its `@endif` line.
    fn skip_conditional(&mut self, if_token: &Token) {
        let mut open = 1;

        while !self.is_at_end() {
            match self.advance().token_type {
                TokenType::If => open += 1,
                TokenType::Endif => {
                    open -= 1;
                    if open == 0 {
                        self.synchronize();
                        return;
                    }
                }
                _ => {}
            }
        }

        self.error_at(if_token, "missing '@endif' for", &format!(
            "unterminated conditional: '@if' on line {} is never closed with '@endif'",
            if_token.position.line
        ));
    }

    /// Directive lines like `@else` and `@endif` must end right after the keyword.
    fn expect_line_end(&mut self, after: &Token) {
        if self.match_types(&[TokenType::Newline]) || self.is_at_end() {
            return;
        }

        let extra = self.peek().clone();
        if extra.token_type != TokenType::Invalid {
            self.error_at(&extra, "syntax error at", &format!(
                "unexpected '{}' after '{}'",
                extra.text(),
                after.lexeme.trim()
            ));
        }
        self.synchronize();
    }

    /// Skips to the start of the next line.
    fn synchronize(&mut self) {
        if self.current > 0 && self.previous().token_type == TokenType::Newline {
            return;
        }

        while !self.is_at_end() {
            if self.advance().token_type == TokenType::Newline {
                return;
            }
        }
    }

    fn error_at(&mut self, token: &Token, message: &str, detail: &str) {
        let span = if token.span.start == token.span.end {
            Span::single(token.span.start)
        } else {
            token.span.clone()
        };

        self.errors.push(
            Diagnostic::syntax_error(&self.path, token.position, span, message, &token.text())
                .with_detail(detail.to_string()),
        );
    }

    fn match_types(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check_any(&self, types: &[TokenType]) -> bool {
        types.iter().any(|token_type| self.check(token_type))
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            false
        } else {
            &self.peek().token_type == token_type
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }
}
