use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use clap::CommandFactory;
use clap_lex::{ArgCursor, ParsedArg, RawArgs, ShortFlags};

use crate::cli::Cli;
use crate::crypto::{KdfHardness, Passphrase};
use crate::error::{KeysmithError, Result, UsageProblem};

use super::{HardnessSetting, InvocationState, Subcommand};

/// What an option sets on the invocation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opt {
    Device,
    File,
    Passphrase,
    Mixin,
    KdfHardness,
    ObfuscateDevice,
    Help,
}

impl Opt {
    fn from_id(id: &str) -> Option<Self> {
        match id {
            "device" => Some(Opt::Device),
            "file" => Some(Opt::File),
            "passphrase" => Some(Opt::Passphrase),
            "mixin" => Some(Opt::Mixin),
            "kdf_hardness" => Some(Opt::KdfHardness),
            "obfuscate_device" => Some(Opt::ObfuscateDevice),
            "help" => Some(Opt::Help),
            _ => None,
        }
    }
}

/// One option as declared on [`Cli`].
#[derive(Debug, Clone)]
struct Switch {
    opt: Opt,
    short: Option<char>,
    long: String,
    takes_value: bool,
}

fn switches() -> Vec<Switch> {
    let command = Cli::command();
    command
        .get_arguments()
        .filter_map(|arg| {
            Some(Switch {
                opt: Opt::from_id(arg.get_id().as_str())?,
                short: arg.get_short(),
                long: arg.get_long()?.to_string(),
                takes_value: arg.get_action().takes_values(),
            })
        })
        .collect()
}

fn find_short(switches: &[Switch], c: char) -> Option<&Switch> {
    switches.iter().find(|switch| switch.short == Some(c))
}

enum LongMatch<'s> {
    Found(&'s Switch),
    Ambiguous,
    Unknown,
}

/// Exact names win; otherwise a prefix must pick out exactly one option.
fn match_long<'s>(switches: &'s [Switch], name: &str) -> LongMatch<'s> {
    if let Some(switch) = switches.iter().find(|switch| switch.long == name) {
        return LongMatch::Found(switch);
    }
    let mut candidates = switches
        .iter()
        .filter(|switch| !name.is_empty() && switch.long.starts_with(name));
    match (candidates.next(), candidates.next()) {
        (Some(switch), None) => LongMatch::Found(switch),
        (Some(_), Some(_)) => LongMatch::Ambiguous,
        _ => LongMatch::Unknown,
    }
}

/// Whether `arg` asks for help: `--help` (or a prefix of it), or a short
/// cluster that reaches `-h` before any option taking a value.
fn requests_help(switches: &[Switch], arg: &ParsedArg<'_>) -> bool {
    if let Some((name, _)) = arg.to_long() {
        return match name {
            Ok(name) => matches!(
                match_long(switches, name),
                LongMatch::Found(switch) if switch.opt == Opt::Help
            ),
            Err(_) => false,
        };
    }
    let Some(mut flags) = arg.to_short() else {
        return false;
    };
    while let Some(Ok(c)) = flags.next_flag() {
        match find_short(switches, c) {
            Some(switch) if switch.opt == Opt::Help => return true,
            Some(switch) if switch.takes_value => return false,
            _ => {}
        }
    }
    false
}

fn lossy(value: &OsStr) -> String {
    value.to_string_lossy().into_owned()
}

struct Scanner<'a> {
    raw: &'a RawArgs,
    cursor: ArgCursor,
    switches: &'a [Switch],
    state: InvocationState,
    positionals: Vec<&'a OsStr>,
}

impl<'a> Scanner<'a> {
    fn take_next(&mut self) -> Option<&'a OsStr> {
        self.raw.next_os(&mut self.cursor)
    }

    fn run(&mut self) {
        let raw = self.raw;
        while let Some(arg) = raw.next(&mut self.cursor) {
            if arg.is_escape() {
                self.positionals.extend(raw.remaining(&mut self.cursor));
            } else if let Some((name, inline)) = arg.to_long() {
                self.long_option(&arg, name, inline);
            } else if let Some(flags) = arg.to_short() {
                self.short_cluster(flags);
            } else {
                self.positionals.push(arg.to_value_os());
            }
        }
    }

    fn long_option(
        &mut self,
        arg: &ParsedArg<'a>,
        name: std::result::Result<&'a str, &'a OsStr>,
        inline: Option<&'a OsStr>,
    ) {
        let switches = self.switches;
        let found = match name {
            Ok(name) => match match_long(switches, name) {
                LongMatch::Found(switch) => Some(switch),
                LongMatch::Ambiguous => {
                    self.problem(UsageProblem::AmbiguousOption(format!("--{name}")));
                    return;
                }
                LongMatch::Unknown => None,
            },
            Err(_) => None,
        };
        let Some(switch) = found else {
            self.problem(UsageProblem::UnrecognizedOption(arg.display().to_string()));
            return;
        };

        if !switch.takes_value {
            match inline {
                Some(_) => self.problem(UsageProblem::UnexpectedValue(switch.long.clone())),
                None => self.apply(switch.opt, OsStr::new("")),
            }
            return;
        }
        match inline.or_else(|| self.take_next()) {
            Some(value) => self.apply(switch.opt, value),
            None => self.problem(UsageProblem::MissingLongValue(switch.long.clone())),
        }
    }

    fn short_cluster(&mut self, mut flags: ShortFlags<'a>) {
        let switches = self.switches;
        while let Some(flag) = flags.next_flag() {
            let Ok(c) = flag else {
                self.problem(UsageProblem::InvalidOption(char::REPLACEMENT_CHARACTER));
                continue;
            };
            let Some(switch) = find_short(switches, c) else {
                self.problem(UsageProblem::InvalidOption(c));
                continue;
            };
            if !switch.takes_value {
                self.apply(switch.opt, OsStr::new(""));
                continue;
            }
            match flags.next_value_os().or_else(|| self.take_next()) {
                Some(value) => self.apply(switch.opt, value),
                None => self.problem(UsageProblem::MissingShortValue(c)),
            }
            return;
        }
    }

    fn apply(&mut self, opt: Opt, value: &OsStr) {
        let state = &mut self.state;
        match opt {
            Opt::Device => state.device = Some(PathBuf::from(value)),
            Opt::File => state.file = Some(PathBuf::from(value)),
            Opt::Passphrase => state.passphrase = Some(Passphrase::from_bytes(value.as_bytes())),
            Opt::Mixin => state.mixin = Some(value.to_os_string()),
            Opt::KdfHardness => {
                let value = lossy(value);
                state.kdf_hardness = match KdfHardness::from_letter(&value) {
                    Some(tier) => HardnessSetting::Requested(tier),
                    None => HardnessSetting::Invalid(value),
                };
            }
            Opt::ObfuscateDevice => state.obfuscate_device_info = true,
            Opt::Help => state.subcommand = Subcommand::Help,
        }
    }

    fn problem(&mut self, problem: UsageProblem) {
        tracing::trace!(%problem, "argument problem");
        self.state.problems.push(problem);
    }
}

/// Read `args` (program name first) into an [`InvocationState`].
///
/// Options and positionals may be interleaved. Grammar problems are
/// collected on the state; only a missing or unknown leading subcommand
/// fails here. A help request in place of the subcommand defers detection
/// to the first positional.
pub fn parse(args: &[OsString]) -> Result<InvocationState> {
    let raw = RawArgs::new(args.iter().cloned());
    let switches = switches();
    let mut cursor = raw.cursor();
    let _program = raw.next_os(&mut cursor);

    let first = raw.peek(&cursor).ok_or(KeysmithError::MissingSubcommand)?;
    let subcommand = match Subcommand::from_keyword(first.to_value_os()) {
        Some(subcommand) => subcommand,
        None if requests_help(&switches, &first) => Subcommand::Unknown,
        None => return Err(KeysmithError::UnknownSubcommand(first.display().to_string())),
    };

    let mut scanner = Scanner {
        raw: &raw,
        cursor,
        switches: &switches,
        state: InvocationState {
            subcommand,
            ..InvocationState::default()
        },
        positionals: Vec::new(),
    };
    scanner.run();

    let Scanner {
        mut state,
        positionals,
        ..
    } = scanner;

    // Only a few keywords are recognised when help came first.
    if state.subcommand == Subcommand::Unknown {
        state.subcommand = match positionals.first().and_then(|word| word.to_str()) {
            Some("help") => Subcommand::Help,
            Some("enrol") => Subcommand::Enrol,
            Some("generate") => Subcommand::Generate,
            _ => Subcommand::Unknown,
        };
    }

    let leftover = if state.subcommand == Subcommand::Unknown {
        &positionals[..]
    } else {
        positionals.get(1..).unwrap_or_default()
    };
    if !leftover.is_empty() {
        let words = leftover.iter().map(|word| lossy(word)).collect();
        state.problems.push(UsageProblem::UnrecognizedArguments(words));
    }

    tracing::debug!(
        subcommand = %state.subcommand,
        problems = state.problems.len(),
        "scanned arguments"
    );
    Ok(state)
}
