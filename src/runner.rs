use crate::bindings::{Bindings, Environment, ProcessEnvironment};
use crate::error::DokaError;
use crate::evaluator::evaluate;
use crate::parser::parse;
use std::fs;
use std::path::Path;

/// Options collected by the command line front end.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub file: String,
    pub vars: Vec<String>,
    pub full_errors: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            file: "Dokafile".to_string(),
            vars: Vec::new(),
            full_errors: false,
        }
    }
}

/// Parses and evaluates `source` in one pass.
pub fn compile<E: Environment>(
    source: &str,
    path: &str,
    bindings: &Bindings,
    environment: &E,
) -> Result<String, DokaError> {
    let document = parse(source, path).map_err(DokaError::Syntax)?;
    evaluate(&document, bindings, environment).map_err(DokaError::Evaluation)
}

pub fn read_source(path: &Path) -> Result<String, DokaError> {
    fs::read_to_string(path).map_err(|source| DokaError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Reads and compiles a Dokafile, falling back to the process environment.
pub fn compile_file(path: &Path, bindings: &Bindings) -> Result<String, DokaError> {
    let source = read_source(path)?;
    compile(&source, &path.display().to_string(), bindings, &ProcessEnvironment)
}

/// One stderr line per problem carried by `error`.
pub fn format_error(error: &DokaError, full_errors: bool) -> Vec<String> {
    let diagnostics = error.diagnostics();
    if diagnostics.is_empty() {
        return vec![error.to_string()];
    }

    diagnostics
        .into_iter()
        .map(|diagnostic| diagnostic.clone().verbose(full_errors).to_string())
        .collect()
}

/// Runs the front end end to end and returns the process exit code.
pub fn run(options: &RunOptions) -> i32 {
    let environment = ProcessEnvironment;

    let bindings = match Bindings::from_var_args(&options.vars, &environment) {
        Ok(bindings) => bindings.with_host_defaults(),
        Err(error) => {
            eprintln!("{}", error);
            return 1;
        }
    };

    let source = match read_source(Path::new(&options.file)) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("{}", error);
            return 1;
        }
    };

    match compile(&source, &options.file, &bindings, &environment) {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(error) => {
            for line in format_error(&error, options.full_errors) {
                eprintln!("{}", line);
            }
            if options.full_errors {
                for diagnostic in error.diagnostics() {
                    diagnostic.report(&source);
                }
            }
            1
        }
    }
}
