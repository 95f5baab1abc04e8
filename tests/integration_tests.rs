// Parser Robustness Tests for Doka
//
// Each suite feeds Dokafile sources through the lexer and parser and checks
// that well-formed input parses and malformed input is rejected with the
// expected diagnostic.

use doka::ast::Document;
use doka::error::Diagnostic;
use doka::parser::{parse, MAX_NESTING};

/// Test result for a single test case
#[derive(Debug)]
pub enum TestResult {
    Pass,
    Fail(String),
    Crash(String),
}

/// Individual test case
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub should_succeed: bool,
    pub expected_error_contains: Option<String>,
}

/// Test suite containing multiple test cases
#[derive(Debug)]
pub struct TestSuite {
    pub name: String,
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tests: Vec::new(),
        }
    }

    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    /// Run all tests in this suite
    pub fn run(&self) -> TestSuiteResults {
        let mut results = TestSuiteResults::new(&self.name);

        println!("Running test suite: {}", self.name);
        println!("{}", "=".repeat(50));

        for test in &self.tests {
            let result = run_single_test(test);
            results.add_result(&test.name, result);
        }

        results.print_summary();
        results
    }
}

/// Results for a test suite run
#[derive(Debug)]
pub struct TestSuiteResults {
    pub suite_name: String,
    pub results: Vec<(String, TestResult)>,
    pub passed: usize,
    pub failed: usize,
    pub crashed: usize,
}

impl TestSuiteResults {
    pub fn new(suite_name: &str) -> Self {
        Self {
            suite_name: suite_name.to_string(),
            results: Vec::new(),
            passed: 0,
            failed: 0,
            crashed: 0,
        }
    }

    pub fn add_result(&mut self, test_name: &str, result: TestResult) {
        match &result {
            TestResult::Pass => {
                self.passed += 1;
                println!("  ✓ {}", test_name);
            }
            TestResult::Fail(msg) => {
                self.failed += 1;
                println!("  ✗ {}: {}", test_name, msg);
            }
            TestResult::Crash(msg) => {
                self.crashed += 1;
                println!("  💥 {}: CRASHED - {}", test_name, msg);
            }
        }
        self.results.push((test_name.to_string(), result));
    }

    pub fn print_summary(&self) {
        println!();
        println!("Test Suite: {} - Summary", self.suite_name);
        println!("{}", "-".repeat(30));
        println!("Passed:  {}", self.passed);
        println!("Failed:  {}", self.failed);
        println!("Crashed: {}", self.crashed);
        println!("Total:   {}", self.results.len());
        println!();
    }

    pub fn is_all_passed(&self) -> bool {
        self.crashed == 0 && self.failed == 0
    }
}

/// Run a single test case
fn run_single_test(test: &TestCase) -> TestResult {
    // Catch any panics to detect crashes
    let result = std::panic::catch_unwind(|| parse_input(&test.input));

    match result {
        Ok(parse_result) => match (parse_result, test.should_succeed) {
            (Ok(_), true) => TestResult::Pass,
            (Ok(_), false) => {
                TestResult::Fail("Expected parsing to fail, but it succeeded".to_string())
            }
            (Err(errors), false) => {
                if errors.is_empty() {
                    return TestResult::Fail("Parsing failed without any diagnostic".to_string());
                }
                match &test.expected_error_contains {
                    Some(expected) if !errors.iter().any(|error| error.detail.contains(expected)) => {
                        TestResult::Fail(format!(
                            "No diagnostic contains '{}', got: {}",
                            expected,
                            describe(&errors)
                        ))
                    }
                    _ => TestResult::Pass,
                }
            }
            (Err(errors), true) => TestResult::Fail(format!(
                "Expected parsing to succeed, but got: {}",
                describe(&errors)
            )),
        },
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Unknown panic".to_string()
            };
            TestResult::Crash(panic_msg)
        }
    }
}

fn describe(errors: &[Diagnostic]) -> String {
    errors
        .iter()
        .map(|error| error.clone().verbose(true).to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse input and return result
fn parse_input(input: &str) -> Result<Document, Vec<Diagnostic>> {
    parse(input, "Dokafile")
}

/// Test case builder for convenience
impl TestCase {
    pub fn should_succeed(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: true,
            expected_error_contains: None,
        }
    }

    pub fn should_fail(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: None,
        }
    }

    pub fn should_fail_with_message(name: &str, input: &str, expected_msg: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: Some(expected_msg.to_string()),
        }
    }
}

fn nested_conditionals(depth: usize) -> String {
    let mut source = String::new();
    for level in 0..depth {
        source.push_str(&format!("@if $level == \"{}\"\n", level));
    }
    source.push_str("RUN deepest\n");
    for _ in 0..depth {
        source.push_str("@endif\n");
    }
    source
}

// ============================================================================
// Test Suite Creation Functions
// ============================================================================

fn create_directive_structure_tests() -> TestSuite {
    let mut suite = TestSuite::new("Directive Structure");

    suite.add_test(TestCase::should_fail_with_message(
        "unknown_directive",
        "@foreach $x\nRUN x\n",
        "unknown directive '@foreach'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "bare_at_sign",
        "@\n",
        "unknown directive '@'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "missing_endif",
        "@if $os == \"linux\"\nRUN apt-get update\n",
        "'@if' on line 1 is never closed with '@endif'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "unclosed_outer_conditional",
        "@if $a == \"1\"\n@if $b == \"2\"\n@endif\n",
        "'@if' on line 1 is never closed",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "endif_without_if",
        "FROM base\n@endif\n",
        "'@endif' without a matching '@if'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "else_without_if",
        "@else\n",
        "'@else' without a matching '@if'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "elif_without_if",
        "@elif $a == \"b\"\n",
        "'@elif' without a matching '@if'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "elif_after_else",
        "@if $a == \"1\"\n@else\n@elif $a == \"2\"\n@endif\n",
        "'@elif' on line 3 follows '@else'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "duplicate_else",
        "@if $a == \"1\"\n@else\n@else\n@endif\n",
        "duplicate '@else' on line 3",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "else_with_condition",
        "@if $a == \"x\"\n@else $a == \"y\"\n@endif\n",
        "unexpected '$a' after '@else'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "endif_with_trailing_value",
        "@if $a == \"x\"\n@endif \"x\"\n",
        "unexpected '\"x\"' after '@endif'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "too_deeply_nested",
        &nested_conditionals(MAX_NESTING + 1),
        "nested more than 64 levels deep",
    ));

    suite
}

fn create_expression_tests() -> TestSuite {
    let mut suite = TestSuite::new("Expressions");

    suite.add_test(TestCase::should_fail_with_message(
        "bare_if",
        "@if\n@endif\n",
        "expected a string literal or a variable, found '<end of line>'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "missing_left_operand",
        "@if == \"x\"\n@endif\n",
        "expected a string literal or a variable, found '=='",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "missing_right_operand",
        "@if $os ==\n@endif\n",
        "expected a string literal or a variable, found '<end of line>'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "missing_operator",
        "@if $os \"linux\"\n@endif\n",
        "expected '==' or '!='",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "single_equals",
        "@if $os = \"linux\"\n@endif\n",
        "unexpected character '='",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "lone_bang",
        "@if $os ! \"linux\"\n@endif\n",
        "unexpected character '!'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "trailing_operand",
        "@if $a == \"x\" \"y\"\n@endif\n",
        "a condition compares exactly two values",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "chained_comparison",
        "@if $a == $b == $c\n@endif\n",
        "a condition compares exactly two values",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "less_than",
        "@if $a < \"x\"\n@endif\n",
        "comparison operator '<' is not supported",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "greater_or_equal",
        "@if $a >= \"x\"\n@endif\n",
        "comparison operator '>=' is not supported",
    ));

    suite.add_test(TestCase::should_fail("stray_character", "@if $a == \"x\" &\n@endif\n"));

    suite
}

fn create_literal_tests() -> TestSuite {
    let mut suite = TestSuite::new("Literals and Variables");

    suite.add_test(TestCase::should_fail_with_message(
        "unterminated_string",
        "@if $os == \"linux\n@endif\n",
        "unterminated string literal '\"linux'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "dollar_without_name",
        "@if $ == \"x\"\n@endif\n",
        "expected a variable name",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "variable_starting_with_digit",
        "@if $1abc == \"x\"\n@endif\n",
        "expected a variable name",
    ));

    suite.add_test(TestCase::should_fail("single_quoted_string", "@if $a == 'x'\n@endif\n"));

    suite.add_test(TestCase::should_succeed("empty_string", "@if $a == \"\"\n@endif\n"));
    suite.add_test(TestCase::should_succeed(
        "string_with_operators",
        "@if $a == \"b == c != d\"\n@endif\n",
    ));
    suite.add_test(TestCase::should_succeed("unicode_string", "@if $a == \"héllo wörld\"\n@endif\n"));
    suite.add_test(TestCase::should_succeed("literal_on_both_sides", "@if \"a\" != \"b\"\n@endif\n"));
    suite.add_test(TestCase::should_succeed("variable_on_both_sides", "@if $a == $b\n@endif\n"));
    suite.add_test(TestCase::should_succeed(
        "underscore_variable",
        "@if $_private_1 == \"x\"\n@endif\n",
    ));
    suite.add_test(TestCase::should_succeed("no_spaces", "@if $a==\"x\"\n@endif\n"));

    suite
}

fn create_edge_case_tests() -> TestSuite {
    let mut suite = TestSuite::new("Edge Cases");

    suite.add_test(TestCase::should_succeed("empty_input", ""));
    suite.add_test(TestCase::should_succeed("only_whitespace", "   \n\t  "));
    suite.add_test(TestCase::should_succeed("only_comment", "# syntax=docker/dockerfile:1"));
    suite.add_test(TestCase::should_succeed("at_sign_inside_native_line", "RUN echo user@example.com"));
    suite.add_test(TestCase::should_succeed("dollar_in_native_line", "ENV PATH=$PATH:/opt/bin"));
    suite.add_test(TestCase::should_succeed("crlf_line_endings", "FROM a\r\n@if $a == \"b\"\r\nRUN c\r\n@endif\r\n"));
    suite.add_test(TestCase::should_succeed("no_trailing_newline", "@if $a != \"\"\nRUN x\n@endif"));
    suite.add_test(TestCase::should_succeed(
        "indented_directives",
        "@if $os == \"linux\"\n    @if $arch == \"amd64\"\n    RUN x\n    @endif\n@endif\n",
    ));
    suite.add_test(TestCase::should_succeed("empty_branches", "@if $a == \"b\"\n@elif $a == \"c\"\n@else\n@endif\n"));
    suite.add_test(TestCase::should_succeed("maximum_nesting", &nested_conditionals(MAX_NESTING)));

    suite
}

fn create_positive_tests() -> TestSuite {
    let mut suite = TestSuite::new("Positive Tests");

    suite.add_test(TestCase::should_succeed(
        "plain_dockerfile",
        "FROM debian:bookworm\n# install tools\nRUN apt-get update\n\nCMD [\"bash\"]\n",
    ));
    suite.add_test(TestCase::should_succeed(
        "if_else",
        "FROM base\n@if $os == \"linux\"\nRUN apt-get update\n@else\nRUN apk update\n@endif\n",
    ));
    suite.add_test(TestCase::should_succeed(
        "elif_chain",
        "@if $arch == \"amd64\"\nRUN a\n@elif $arch == \"arm64\"\nRUN b\n@elif $arch == \"386\"\nRUN c\n@else\nRUN d\n@endif\n",
    ));
    suite.add_test(TestCase::should_succeed(
        "nested_in_else",
        "@if $a == \"1\"\nRUN a\n@else\n@if $b != \"2\"\nRUN b\n@endif\n@endif\n",
    ));

    suite
}

// ============================================================================
// Main Test Function
// ============================================================================

#[test]
fn comprehensive_parser_tests() {
    let suites = vec![
        create_directive_structure_tests(),
        create_expression_tests(),
        create_literal_tests(),
        create_edge_case_tests(),
        create_positive_tests(),
    ];

    let mut failures = Vec::new();
    for suite in suites {
        let results = suite.run();
        if !results.is_all_passed() {
            failures.push(results.suite_name.clone());
        }
    }

    assert!(failures.is_empty(), "failing suites: {}", failures.join(", "));
}
