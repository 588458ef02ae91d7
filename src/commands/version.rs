use std::io::{self, Write};

use crate::cli;
use crate::error::Result;

pub fn run() -> Result<()> {
    let mut out = io::stdout().lock();
    out.write_all(cli::version().as_bytes())?;
    out.flush()?;
    Ok(())
}
