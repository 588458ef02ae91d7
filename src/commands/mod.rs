pub mod enrol;
pub mod enumerate;
pub mod generate;
pub mod help;
pub mod version;

use std::fmt;
use std::io::{self, Write};

use colored::Colorize;

use crate::error::Result;
use crate::invocation::Invocation;

/// What a subcommand is about to do, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub action: &'static str,
    pub rows: Vec<(&'static str, String)>,
}

impl Plan {
    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.action.bold())?;
        for (key, value) in &self.rows {
            writeln!(f, "  {:<18} {}", format!("{key}:"), value.as_str().cyan())?;
        }
        Ok(())
    }
}

/// Hand a validated invocation to the matching subcommand.
///
/// The invocation is consumed; its passphrase is zeroed when this returns.
pub fn run(program: &str, mut invocation: Invocation) -> Result<()> {
    tracing::debug!(subcommand = %invocation.subcommand(), "dispatching");
    let result = match &invocation {
        Invocation::Help { ignored } => help::run(program, ignored),
        Invocation::Version => version::run(),
        Invocation::Enumerate => emit(&enumerate::plan()),
        Invocation::Enrol(config) => enrol::plan(config).and_then(|plan| emit(&plan)),
        Invocation::Generate(config) => emit(&generate::plan(config)),
    };
    invocation.release();
    result
}

fn emit(plan: &Plan) -> Result<()> {
    let mut out = io::stdout().lock();
    write!(out, "{plan}")?;
    out.flush()?;
    Ok(())
}
