use ariadne::{Color, Config, Fmt, Label, Report, ReportKind, Source};
use std::fmt;
use thiserror::Error;

/// Byte range into the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }
}

/// 1-based line and column (columns count characters, not bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Syntax,
    UnknownVariable,
    UnsupportedOperator,
    Internal,
}

impl DiagnosticKind {
    fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::Syntax => "Syntax Error",
            DiagnosticKind::UnknownVariable => "Unknown Variable",
            DiagnosticKind::UnsupportedOperator => "Unsupported Operator",
            DiagnosticKind::Internal => "Internal Error",
        }
    }

    fn color(&self) -> Color {
        match self {
            DiagnosticKind::Syntax => Color::Yellow,
            DiagnosticKind::UnknownVariable => Color::Magenta,
            DiagnosticKind::UnsupportedOperator => Color::Red,
            DiagnosticKind::Internal => Color::Red,
        }
    }
}

/// A position-tagged problem found while parsing or evaluating a Dokafile.
///
/// Terse rendering is `path:line:column: <message> '<token>'`, verbose
/// rendering is `path:line:column: <detail>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub path: String,
    pub position: Position,
    pub span: Span,
    pub message: String,
    pub token: String,
    pub detail: String,
    pub help: Option<String>,
    pub verbose: bool,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        path: &str,
        position: Position,
        span: Span,
        message: &str,
        token: &str,
    ) -> Self {
        Self {
            kind,
            path: path.to_string(),
            position,
            span,
            message: message.to_string(),
            token: token.to_string(),
            detail: format!("{} '{}'", message, token),
            help: None,
            verbose: false,
        }
    }

    pub fn syntax_error(path: &str, position: Position, span: Span, message: &str, token: &str) -> Self {
        Self::new(DiagnosticKind::Syntax, path, position, span, message, token)
    }

    pub fn unknown_variable(path: &str, position: Position, span: Span, name: &str) -> Self {
        Self::new(
            DiagnosticKind::UnknownVariable,
            path,
            position,
            span,
            "unknown variable",
            &format!("${}", name),
        )
        .with_help(format!(
            "pass it with '--var {}=VALUE' or export it in the environment",
            name
        ))
    }

    pub fn unsupported_operator(path: &str, position: Position, span: Span, operator: &str) -> Self {
        Self::new(
            DiagnosticKind::UnsupportedOperator,
            path,
            position,
            span,
            "operator not implemented",
            operator,
        )
        .with_detail(format!(
            "comparison operator '{}' is not supported, use '==' or '!='",
            operator
        ))
    }

    pub fn internal_error(path: &str, position: Position, span: Span, message: &str) -> Self {
        Self::new(DiagnosticKind::Internal, path, position, span, message, "")
            .with_detail(format!("internal error: {}", message))
    }

    /// Replaces the raw message shown in verbose mode.
    pub fn with_detail(mut self, detail: String) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// Selects the rendering mode for `Display`.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }

    /// Prints an annotated source excerpt to stderr.
    pub fn report(&self, source: &str) {
        let _ = self
            .build_report(source, true)
            .eprint((self.path.as_str(), Source::from(source)));
    }

    /// Same excerpt as `report`, uncolored, as a string.
    pub fn report_to_string(&self, source: &str) -> String {
        let mut buffer = Vec::new();
        let written = self
            .build_report(source, false)
            .write((self.path.as_str(), Source::from(source)), &mut buffer);
        match written {
            Ok(()) => String::from_utf8_lossy(&buffer).into_owned(),
            Err(_) => self.to_string(),
        }
    }

    fn build_report<'a>(&'a self, source: &str, color: bool) -> Report<'a, (&'a str, std::ops::Range<usize>)> {
        let filename = self.path.as_str();
        let kind_color = self.kind.color();

        // ariadne counts characters, spans count bytes. Spans at the end of
        // input are pulled back onto the last character.
        let total = source.chars().count();
        let start = char_offset(source, self.span.start).min(total.saturating_sub(1));
        let end = char_offset(source, self.span.end).max(start + 1).min(total.max(start));

        let title = if color {
            format!("{}: {}", self.kind.label().fg(kind_color), self.detail)
        } else {
            format!("{}: {}", self.kind.label(), self.detail)
        };

        let mut builder = Report::build(ReportKind::Error, filename, start)
            .with_config(Config::default().with_color(color))
            .with_message(title)
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(kind_color),
            );

        if let Some(ref help_text) = self.help {
            let note = if color {
                format!("{}: {}", "help".fg(Color::Cyan), help_text)
            } else {
                format!("help: {}", help_text)
            };
            builder = builder.with_note(note);
        }

        builder.finish()
    }
}

fn char_offset(source: &str, byte: usize) -> usize {
    let mut byte = byte.min(source.len());
    while !source.is_char_boundary(byte) {
        byte -= 1;
    }
    source[..byte].chars().count()
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}: ", self.path, self.position)?;
        if self.verbose {
            write!(f, "{}", self.detail)
        } else {
            write!(f, "{} '{}'", self.message, self.token)
        }
    }
}

impl std::error::Error for Diagnostic {}

/// Errors surfaced at the crate boundary.
#[derive(Error, Debug)]
pub enum DokaError {
    #[error("{} syntax error(s) in Dokafile", .0.len())]
    Syntax(Vec<Diagnostic>),

    #[error("{0}")]
    Evaluation(Diagnostic),

    #[error("invalid variable name: {0}")]
    InvalidVariableName(String),

    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl DokaError {
    /// The position-tagged diagnostics carried by this error, if any.
    pub fn diagnostics(&self) -> Vec<&Diagnostic> {
        match self {
            DokaError::Syntax(diagnostics) => diagnostics.iter().collect(),
            DokaError::Evaluation(diagnostic) => vec![diagnostic],
            DokaError::InvalidVariableName(_) | DokaError::Io { .. } => Vec::new(),
        }
    }
}
