use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};

/// Declared command-line surface. Usage, help and version text are rendered
/// from it, and `invocation::scan` builds its option table from it; the
/// scanner lexes with `clap_lex` so that every bad option is collected.
#[derive(Parser, Debug)]
#[command(
    name = "keysmith",
    about = "Enrol devices and generate key files protected by a passphrase",
    version,
    disable_help_subcommand = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// Device to enrol
    #[arg(short, long, global = true, value_name = "PATH")]
    pub device: Option<PathBuf>,

    /// Key file to write
    #[arg(short, long, global = true, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Passphrase (read from stdin when omitted)
    #[arg(short, long, global = true, value_name = "PASSPHRASE")]
    pub passphrase: Option<String>,

    /// Extra input mixed into generated keys
    #[arg(short, long, global = true, value_name = "DATA")]
    pub mixin: Option<String>,

    /// Key derivation cost: l(ow), m(edium) or h(igh); enrol picks one from host memory when omitted
    #[arg(short, long, global = true, value_name = "l|m|h")]
    pub kdf_hardness: Option<String>,

    /// Do not store identifying device details
    #[arg(short, long, global = true)]
    pub obfuscate_device: bool,

    /// Show this help
    #[arg(short, long, global = true)]
    pub help: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Show this help
    Help,

    /// Print the program version
    Version,

    /// Enrol a device (requires --device and --file)
    Enrol,

    /// Generate a key file (requires --file)
    Generate,

    /// List devices that can be enrolled
    Enumerate,
}

/// Last path component of argv[0], or argv[0] itself when it has none.
pub fn program_name(argv0: Option<&OsString>) -> String {
    let Some(argv0) = argv0 else {
        return "keysmith".to_string();
    };
    Path::new(argv0)
        .file_name()
        .unwrap_or(argv0.as_os_str())
        .to_string_lossy()
        .into_owned()
}

pub fn usage(program: &str) -> String {
    Cli::command()
        .bin_name(program.to_string())
        .render_usage()
        .to_string()
}

pub fn long_help(program: &str) -> String {
    Cli::command()
        .bin_name(program.to_string())
        .render_long_help()
        .to_string()
}

pub fn version() -> String {
    Cli::command().render_version()
}
