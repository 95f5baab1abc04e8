use crate::error::DokaError;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn variable_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("variable name pattern is valid")
    })
}

pub fn is_valid_variable_name(name: &str) -> bool {
    variable_name_pattern().is_match(name)
}

/// Fallback lookup for variables missing from the bindings.
pub trait Environment {
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads the process environment. Empty values count as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|value| !value.is_empty())
    }
}

impl Environment for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).filter(|value| !value.is_empty()).cloned()
    }
}

/// Caller-supplied variables, keyed by validated name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: HashMap<String, String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds bindings from `--var` style arguments, later entries winning.
    pub fn from_var_args<I, S>(args: I, environment: &impl Environment) -> Result<Self, DokaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut bindings = Self::new();
        for arg in args {
            let (name, value) = parse_var_arg(arg.as_ref(), environment)?;
            bindings.values.insert(name, value);
        }
        Ok(bindings)
    }

    pub fn insert(&mut self, name: &str, value: &str) -> Result<(), DokaError> {
        if !is_valid_variable_name(name) {
            return Err(DokaError::InvalidVariableName(name.to_string()));
        }
        self.values.insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fills in `os` and `arch` from the host unless already bound.
    pub fn with_host_defaults(mut self) -> Self {
        self.values
            .entry("os".to_string())
            .or_insert_with(|| host_os().to_string());
        self.values
            .entry("arch".to_string())
            .or_insert_with(|| host_arch().to_string());
        self
    }
}

/// Splits `NAME=VALUE` on the first `=`. `NAME=` binds the empty string and a
/// bare `NAME` takes its value from `environment`, empty when unset.
pub fn parse_var_arg(arg: &str, environment: &impl Environment) -> Result<(String, String), DokaError> {
    let (name, value) = match arg.split_once('=') {
        Some((name, value)) => (name, value.to_string()),
        None => (arg, environment.get(arg).unwrap_or_default()),
    };

    if !is_valid_variable_name(name) {
        return Err(DokaError::InvalidVariableName(name.to_string()));
    }

    Ok((name.to_string(), value))
}

/// Host operating system as Docker platforms name it.
pub fn host_os() -> &'static str {
    docker_os(std::env::consts::OS)
}

/// Host CPU architecture as Docker platforms name it.
pub fn host_arch() -> &'static str {
    docker_arch(std::env::consts::ARCH)
}

pub fn docker_os(os: &'static str) -> &'static str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

pub fn docker_arch(arch: &'static str) -> &'static str {
    match arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => {
            if cfg!(target_endian = "little") {
                "ppc64le"
            } else {
                "ppc64"
            }
        }
        "loongarch64" => "loong64",
        other => other,
    }
}
