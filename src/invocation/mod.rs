//! Turning the raw argument vector into a validated, enriched invocation.
//!
//! The pipeline runs in three steps, each of which can only fail with a
//! [`KeysmithError`] returned to the caller:
//!
//! 1. [`scan::parse`] reads options into a flat [`InvocationState`],
//!    collecting every grammar problem instead of stopping at the first.
//! 2. [`validate::validate`] applies the per-subcommand field rules and
//!    produces a [`Request`] whose variants carry only legal fields.
//! 3. [`prepare`] resolves the KDF tier and reads a passphrase through a
//!    [`Host`] when one is still needed.

pub mod acquire;
pub mod scan;
pub mod validate;

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;

use crate::crypto::{kdf, KdfHardness, Passphrase};
use crate::error::{Result, UsageProblem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Subcommand {
    Help,
    Version,
    Enrol,
    Generate,
    Enumerate,
    #[default]
    Unknown,
}

impl Subcommand {
    /// Exact match against the subcommand keywords.
    pub fn from_keyword(word: &OsStr) -> Option<Self> {
        match word.to_str()? {
            "help" => Some(Subcommand::Help),
            "version" => Some(Subcommand::Version),
            "enrol" => Some(Subcommand::Enrol),
            "generate" => Some(Subcommand::Generate),
            "enumerate" => Some(Subcommand::Enumerate),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Subcommand::Help => "help",
            Subcommand::Version => "version",
            Subcommand::Enrol => "enrol",
            Subcommand::Generate => "generate",
            Subcommand::Enumerate => "enumerate",
            Subcommand::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Subcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `-k` option as the user gave it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HardnessSetting {
    #[default]
    Unspecified,
    Requested(KdfHardness),
    Invalid(String),
}

/// Everything read off the command line, before any cross-field checks.
#[derive(Debug, Default)]
pub struct InvocationState {
    pub subcommand: Subcommand,
    pub device: Option<PathBuf>,
    pub file: Option<PathBuf>,
    pub passphrase: Option<Passphrase>,
    pub mixin: Option<OsString>,
    pub obfuscate_device_info: bool,
    pub kdf_hardness: HardnessSetting,
    pub problems: Vec<UsageProblem>,
}

impl InvocationState {
    /// Drop every field, zeroing the passphrase first. Safe to repeat.
    pub fn release(&mut self) {
        if let Some(passphrase) = self.passphrase.as_mut() {
            passphrase.wipe();
        }
        self.passphrase = None;
        self.device = None;
        self.file = None;
        self.mixin = None;
    }
}

#[derive(Debug)]
pub struct EnrolRequest {
    pub device: PathBuf,
    pub file: PathBuf,
    pub passphrase: Option<Passphrase>,
    pub obfuscate_device_info: bool,
    pub kdf_hardness: Option<KdfHardness>,
}

#[derive(Debug)]
pub struct GenerateRequest {
    pub file: PathBuf,
    pub passphrase: Option<Passphrase>,
    /// Reserved; carried through untouched.
    pub mixin: Option<OsString>,
}

/// A validated invocation that may still lack a tier or passphrase.
#[derive(Debug)]
pub enum Request {
    Help { ignored: Vec<UsageProblem> },
    Version,
    Enumerate,
    Enrol(EnrolRequest),
    Generate(GenerateRequest),
}

#[derive(Debug)]
pub struct EnrolConfig {
    pub device: PathBuf,
    pub file: PathBuf,
    pub passphrase: Passphrase,
    pub obfuscate_device_info: bool,
    pub kdf_hardness: KdfHardness,
}

#[derive(Debug)]
pub struct GenerateConfig {
    pub file: PathBuf,
    pub passphrase: Passphrase,
    pub mixin: Option<OsString>,
}

/// The configuration handed to the enrol, generate and enumerate backends.
#[derive(Debug)]
pub enum Invocation {
    Help { ignored: Vec<UsageProblem> },
    Version,
    Enumerate,
    Enrol(EnrolConfig),
    Generate(GenerateConfig),
}

impl Invocation {
    pub fn subcommand(&self) -> Subcommand {
        match self {
            Invocation::Help { .. } => Subcommand::Help,
            Invocation::Version => Subcommand::Version,
            Invocation::Enumerate => Subcommand::Enumerate,
            Invocation::Enrol(_) => Subcommand::Enrol,
            Invocation::Generate(_) => Subcommand::Generate,
        }
    }

    pub fn passphrase(&self) -> Option<&Passphrase> {
        match self {
            Invocation::Enrol(config) => Some(&config.passphrase),
            Invocation::Generate(config) => Some(&config.passphrase),
            _ => None,
        }
    }

    /// Zero the passphrase, if any. Safe to repeat.
    pub fn release(&mut self) {
        match self {
            Invocation::Enrol(config) => config.passphrase.wipe(),
            Invocation::Generate(config) => config.passphrase.wipe(),
            _ => {}
        }
    }
}

/// Facts and input the pipeline takes from the machine it runs on.
pub trait Host {
    /// Physical memory in bytes.
    fn physical_memory(&self) -> u64;

    /// Obtain a passphrase from the user. `tier` is set for enrolment.
    fn read_passphrase(&mut self, tier: Option<KdfHardness>) -> Result<Passphrase>;
}

/// The real machine: sysconf for memory, stdin for the passphrase.
pub struct SystemHost;

impl Host for SystemHost {
    fn physical_memory(&self) -> u64 {
        kdf::host_physical_memory()
    }

    fn read_passphrase(&mut self, tier: Option<KdfHardness>) -> Result<Passphrase> {
        acquire::acquire_passphrase(tier)
    }
}

/// Fill in what validation left open: the KDF tier, then the passphrase.
pub fn prepare<H: Host>(request: Request, host: &mut H) -> Result<Invocation> {
    match request {
        Request::Help { ignored } => Ok(Invocation::Help { ignored }),
        Request::Version => Ok(Invocation::Version),
        Request::Enumerate => Ok(Invocation::Enumerate),
        Request::Enrol(request) => {
            let kdf_hardness = match request.kdf_hardness {
                Some(tier) => tier,
                None => {
                    let memory = host.physical_memory();
                    let tier = kdf::resolve_hardness(memory);
                    tracing::debug!(memory, %tier, "resolved kdf hardness from host memory");
                    tier
                }
            };
            let passphrase = match request.passphrase {
                Some(passphrase) => passphrase,
                None => host.read_passphrase(Some(kdf_hardness))?,
            };
            Ok(Invocation::Enrol(EnrolConfig {
                device: request.device,
                file: request.file,
                passphrase,
                obfuscate_device_info: request.obfuscate_device_info,
                kdf_hardness,
            }))
        }
        Request::Generate(request) => {
            let passphrase = match request.passphrase {
                Some(passphrase) => passphrase,
                None => host.read_passphrase(None)?,
            };
            Ok(Invocation::Generate(GenerateConfig {
                file: request.file,
                passphrase,
                mixin: request.mixin,
            }))
        }
    }
}

/// Run the whole pipeline over `args` (program name first).
pub fn from_args<H: Host>(args: &[OsString], host: &mut H) -> Result<Invocation> {
    let state = scan::parse(args)?;
    let request = validate::validate(state)?;
    prepare(request, host)
}
