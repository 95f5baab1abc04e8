use crate::ast::{BinaryOp, Conditional, Document, Expression, Instruction, Value};
use crate::bindings::{Bindings, Environment};
use crate::error::Diagnostic;

/// Walks a parsed Dokafile and renders plain Dockerfile text.
///
/// Variables resolve from the bindings first and from the environment
/// second. The first failure aborts the walk.
pub struct Evaluator<'a, E: Environment> {
    bindings: &'a Bindings,
    environment: &'a E,
    path: String,
    output: String,
}

impl<'a, E: Environment> Evaluator<'a, E> {
    pub fn new(bindings: &'a Bindings, environment: &'a E) -> Self {
        Self {
            bindings,
            environment,
            path: String::new(),
            output: String::new(),
        }
    }

    pub fn evaluate_document(mut self, document: &Document) -> Result<String, Diagnostic> {
        self.path = document.path.clone();
        self.execute_instructions(&document.instructions)?;
        Ok(self.output)
    }

    fn execute_instructions(&mut self, instructions: &[Instruction]) -> Result<(), Diagnostic> {
        for instruction in instructions {
            self.execute_instruction(instruction)?;
        }
        Ok(())
    }

    fn execute_instruction(&mut self, instruction: &Instruction) -> Result<(), Diagnostic> {
        match instruction {
            Instruction::Empty { .. } => {
                self.output.push('\n');
            }
            Instruction::Comment { text, .. } | Instruction::NativeLine { text, .. } => {
                self.output.push_str(text);
                self.output.push('\n');
            }
            Instruction::Conditional(conditional) => {
                // The directive line of the taken branch renders as one blank line
                if let Some(body) = self.select_branch(conditional)? {
                    self.output.push('\n');
                    self.execute_instructions(body)?;
                }
            }
        }
        Ok(())
    }

    /// First matching branch wins; later conditions are never evaluated.
    fn select_branch<'c>(&self, conditional: &'c Conditional) -> Result<Option<&'c [Instruction]>, Diagnostic> {
        if self.evaluate_expression(&conditional.primary.condition)? {
            return Ok(Some(conditional.primary.body.as_slice()));
        }

        for branch in &conditional.elif_branches {
            if self.evaluate_expression(&branch.condition)? {
                return Ok(Some(branch.body.as_slice()));
            }
        }

        Ok(conditional.else_body.as_deref())
    }

    pub fn evaluate_expression(&self, expression: &Expression) -> Result<bool, Diagnostic> {
        let left = self.resolve_value(&expression.left)?;
        let right = self.resolve_value(&expression.right)?;

        Ok(match expression.operator {
            BinaryOp::Equal => left == right,
            BinaryOp::NotEqual => left != right,
        })
    }

    pub fn resolve_value(&self, value: &Value) -> Result<String, Diagnostic> {
        match value {
            Value::Literal { value, .. } => Ok(value.clone()),
            Value::VariableRef { name, position, span } => {
                if let Some(bound) = self.bindings.get(name) {
                    return Ok(bound.to_string());
                }

                self.environment.get(name).ok_or_else(|| {
                    Diagnostic::unknown_variable(&self.path, *position, span.clone(), name)
                })
            }
        }
    }
}

/// Renders `document` with the given bindings and environment fallback.
pub fn evaluate<E: Environment>(
    document: &Document,
    bindings: &Bindings,
    environment: &E,
) -> Result<String, Diagnostic> {
    Evaluator::new(bindings, environment).evaluate_document(document)
}
