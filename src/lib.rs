// Doka Preprocessor Library
//
// Compiles Dokafiles, Dockerfiles extended with `@if` / `@elif` / `@else` /
// `@endif` directives and `$variable` comparisons, down to plain Dockerfile
// text.

// Public modules
pub mod ast;
pub mod bindings;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod runner;

// Re-export commonly used items
pub use ast::{BinaryOp, Branch, Conditional, Document, Expression, Instruction, Value};
pub use bindings::{Bindings, Environment, ProcessEnvironment};
pub use error::{Diagnostic, DiagnosticKind, DokaError, Position, Span};
pub use evaluator::{evaluate, Evaluator};
pub use lexer::{Lexer, Token, TokenType};
pub use parser::{parse, Parser};

// Re-export main functions
pub use runner::{compile, compile_file, run};
