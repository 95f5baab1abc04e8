use crate::error::{Position, Span};

/// A parsed Dokafile. Each conditional owns its branch bodies outright.

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: String,
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// A whitespace-only line.
    Empty {
        position: Position,
        span: Span,
    },
    Comment {
        text: String,
        position: Position,
        span: Span,
    },
    /// Any line that is not a directive or a comment, kept verbatim.
    NativeLine {
        text: String,
        position: Position,
        span: Span,
    },
    Conditional(Conditional),
}

impl Instruction {
    pub fn position(&self) -> Position {
        match self {
            Instruction::Empty { position, .. } => *position,
            Instruction::Comment { position, .. } => *position,
            Instruction::NativeLine { position, .. } => *position,
            Instruction::Conditional(conditional) => conditional.position,
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            Instruction::Empty { span, .. } => span,
            Instruction::Comment { span, .. } => span,
            Instruction::NativeLine { span, .. } => span,
            Instruction::Conditional(conditional) => &conditional.span,
        }
    }
}

/// An `@if` / `@elif`* / `@else`? / `@endif` chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub primary: Branch,
    pub elif_branches: Vec<Branch>,
    pub else_body: Option<Vec<Instruction>>,
    /// Position of the `@if` directive.
    pub position: Position,
    /// From the `@if` through the `@endif` line.
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: Expression,
    pub body: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub left: Value,
    pub operator: BinaryOp,
    pub right: Value,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Equal,
    NotEqual,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Quotes already stripped.
    Literal {
        value: String,
        position: Position,
        span: Span,
    },
    VariableRef {
        name: String,
        position: Position,
        span: Span,
    },
}

impl Value {
    pub fn position(&self) -> Position {
        match self {
            Value::Literal { position, .. } => *position,
            Value::VariableRef { position, .. } => *position,
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            Value::Literal { span, .. } => span,
            Value::VariableRef { span, .. } => span,
        }
    }
}
