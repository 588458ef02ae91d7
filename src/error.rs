use std::fmt;
use std::process::ExitCode;

use thiserror::Error;

/// Process exit statuses. Values follow `sysexits.h` where one fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    Failure = 1,
    BadInvocation = 64,
    UnableToGetPassphrase = 66,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

/// An option or field that a subcommand may require or forbid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Device,
    File,
    Passphrase,
    Mixin,
    ObfuscateDevice,
    KdfHardness,
}

impl Field {
    pub fn long(self) -> &'static str {
        match self {
            Field::Device => "device",
            Field::File => "file",
            Field::Passphrase => "passphrase",
            Field::Mixin => "mixin",
            Field::ObfuscateDevice => "obfuscate-device",
            Field::KdfHardness => "kdf-hardness",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{}", self.long())
    }
}

/// A single grammar or semantic problem found in the argument vector.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageProblem {
    #[error("unrecognized option '{0}'")]
    UnrecognizedOption(String),

    #[error("invalid option -- '{0}'")]
    InvalidOption(char),

    #[error("option '{0}' is ambiguous")]
    AmbiguousOption(String),

    #[error("option requires an argument -- '{0}'")]
    MissingShortValue(char),

    #[error("option '--{0}' requires an argument")]
    MissingLongValue(String),

    #[error("option '--{0}' doesn't allow an argument")]
    UnexpectedValue(String),

    #[error("unrecognized argument{} -- {}", plural(.0), quote_all(.0))]
    UnrecognizedArguments(Vec<String>),

    #[error("no subcommand given")]
    NoSubcommand,

    #[error("{subcommand} requires {field}")]
    MissingField { subcommand: &'static str, field: Field },

    #[error("{field} is not accepted by {subcommand}")]
    ForbiddenField { subcommand: &'static str, field: Field },

    #[error("invalid kdf hardness '{0}' (expected l, m or h)")]
    InvalidHardness(String),
}

fn plural(items: &[String]) -> &'static str {
    if items.len() > 1 {
        "s"
    } else {
        ""
    }
}

fn quote_all(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("'{item}'"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn count_problems(problems: &[UsageProblem]) -> String {
    match problems.len() {
        1 => "1 problem".to_string(),
        n => format!("{n} problems"),
    }
}

#[derive(Error, Debug)]
pub enum KeysmithError {
    #[error("no subcommand given")]
    MissingSubcommand,

    #[error("unknown subcommand '{0}'")]
    UnknownSubcommand(String),

    #[error("invalid invocation ({})", count_problems(.problems))]
    InvalidInvocation { problems: Vec<UsageProblem> },

    #[error("Unable to get passphrase: {0}")]
    PassphraseUnavailable(#[source] std::io::Error),

    #[error("Unable to reset terminal after getting passphrase: {0}")]
    TerminalReset(#[source] std::io::Error),

    #[error("Key derivation parameters rejected: {0}")]
    Kdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KeysmithError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            KeysmithError::MissingSubcommand
            | KeysmithError::UnknownSubcommand(_)
            | KeysmithError::InvalidInvocation { .. } => ExitStatus::BadInvocation,
            KeysmithError::PassphraseUnavailable(_) | KeysmithError::TerminalReset(_) => {
                ExitStatus::UnableToGetPassphrase
            }
            KeysmithError::Kdf(_) | KeysmithError::Io(_) => ExitStatus::Failure,
        }
    }

    /// Whether the usage text should follow the error message.
    pub fn wants_usage(&self) -> bool {
        self.exit_status() == ExitStatus::BadInvocation
    }
}

pub type Result<T> = std::result::Result<T, KeysmithError>;
