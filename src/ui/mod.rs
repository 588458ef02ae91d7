use std::io::IsTerminal;

use colored::Colorize;

use crate::error::UsageProblem;

/// Check if stderr, where diagnostics go, is an interactive terminal.
pub fn is_interactive() -> bool {
    std::io::stderr().is_terminal()
}

/// Print one argument problem in the usual `program: message` form.
pub fn print_problem(program: &str, problem: &UsageProblem) {
    if !is_interactive() {
        eprintln!("{program}: {problem}");
        return;
    }
    eprintln!("{}: {}", program.bold(), problem);
}

/// Print a problem that was noticed but does not stop the program.
pub fn print_warning(program: &str, problem: &UsageProblem) {
    if !is_interactive() {
        eprintln!("{program}: warning: {problem}");
        return;
    }
    eprintln!("{}: {} {}", program.bold(), "warning:".yellow().bold(), problem);
}

/// Print an error message with styling.
pub fn print_error(program: &str, msg: &str) {
    if !is_interactive() {
        eprintln!("{program}: Error: {msg}");
        return;
    }
    eprintln!("{}: {} {}", program.bold(), "Error:".red().bold(), msg);
}
