mod cli;
mod commands;
mod config;
mod crypto;
mod error;
mod invocation;
mod logging;
mod terminal;
mod ui;

use std::env;
use std::ffi::OsString;
use std::process::ExitCode;

use error::{ExitStatus, KeysmithError};
use invocation::SystemHost;

fn main() -> ExitCode {
    let settings = config::Settings::from_env();
    logging::init(&settings);
    settings.apply_color();
    crypto::secure::harden_process();

    let args: Vec<OsString> = env::args_os().collect();
    let program = cli::program_name(args.first());

    let invocation = match invocation::from_args(&args, &mut SystemHost) {
        Ok(invocation) => invocation,
        Err(e) => {
            report(&program, &e);
            return e.exit_status().into();
        }
    };

    match commands::run(&program, invocation) {
        Ok(()) => ExitStatus::Success.into(),
        Err(e) => {
            report(&program, &e);
            e.exit_status().into()
        }
    }
}

fn report(program: &str, err: &KeysmithError) {
    match err {
        KeysmithError::InvalidInvocation { problems } => {
            for problem in problems {
                ui::print_problem(program, problem);
            }
        }
        other => ui::print_error(program, &other.to_string()),
    }
    if err.wants_usage() {
        eprint!("{}", cli::usage(program));
        eprintln!();
    }
}
