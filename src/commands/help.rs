use std::io::{self, Write};

use crate::cli;
use crate::error::{Result, UsageProblem};
use crate::ui;

pub fn run(program: &str, ignored: &[UsageProblem]) -> Result<()> {
    for problem in ignored {
        ui::print_warning(program, problem);
    }
    let mut out = io::stdout().lock();
    out.write_all(cli::long_help(program).as_bytes())?;
    out.flush()?;
    Ok(())
}
