use crate::error::{Field, KeysmithError, Result, UsageProblem};

use super::{
    EnrolRequest, GenerateRequest, HardnessSetting, InvocationState, Request, Subcommand,
};

struct Checks {
    subcommand: &'static str,
    problems: Vec<UsageProblem>,
}

impl Checks {
    fn forbid(&mut self, present: bool, field: Field) {
        if present {
            self.problems.push(UsageProblem::ForbiddenField {
                subcommand: self.subcommand,
                field,
            });
        }
    }

    fn require(&mut self, present: bool, field: Field) {
        if !present {
            self.problems.push(UsageProblem::MissingField {
                subcommand: self.subcommand,
                field,
            });
        }
    }

    fn forbid_all(&mut self, state: &InvocationState) {
        self.forbid(state.device.is_some(), Field::Device);
        self.forbid(state.file.is_some(), Field::File);
        self.forbid(state.mixin.is_some(), Field::Mixin);
        self.forbid(state.passphrase.is_some(), Field::Passphrase);
        self.forbid(state.obfuscate_device_info, Field::ObfuscateDevice);
        self.forbid(
            state.kdf_hardness != HardnessSetting::Unspecified,
            Field::KdfHardness,
        );
    }
}

/// Apply the per-subcommand field rules.
///
/// | subcommand | device | file | mixin | passphrase | obfuscate | kdf |
/// |---|---|---|---|---|---|---|
/// | enrol | required | required | forbidden | allowed | allowed | l/m/h or unset |
/// | generate | forbidden | required | allowed | allowed | forbidden | unset |
/// | others | forbidden | forbidden | forbidden | forbidden | forbidden | unset |
///
/// Help never fails: its problems come back as `ignored`. For any other
/// subcommand a problem discards the state, zeroing a passphrase given
/// with `-p`.
pub fn validate(mut state: InvocationState) -> Result<Request> {
    let subcommand = state.subcommand;
    let mut checks = Checks {
        subcommand: subcommand.as_str(),
        problems: std::mem::take(&mut state.problems),
    };

    match subcommand {
        Subcommand::Enrol => {
            checks.require(state.device.is_some(), Field::Device);
            checks.require(state.file.is_some(), Field::File);
            checks.forbid(state.mixin.is_some(), Field::Mixin);
            if let HardnessSetting::Invalid(value) = &state.kdf_hardness {
                checks.problems.push(UsageProblem::InvalidHardness(value.clone()));
            }
        }
        Subcommand::Generate => {
            checks.forbid(state.device.is_some(), Field::Device);
            checks.require(state.file.is_some(), Field::File);
            checks.forbid(state.obfuscate_device_info, Field::ObfuscateDevice);
            checks.forbid(
                state.kdf_hardness != HardnessSetting::Unspecified,
                Field::KdfHardness,
            );
        }
        Subcommand::Unknown => {
            checks.problems.push(UsageProblem::NoSubcommand);
            checks.forbid_all(&state);
        }
        Subcommand::Help | Subcommand::Version | Subcommand::Enumerate => {
            checks.forbid_all(&state);
        }
    }

    let problems = checks.problems;
    if subcommand == Subcommand::Help {
        state.release();
        return Ok(Request::Help { ignored: problems });
    }
    if !problems.is_empty() {
        tracing::debug!(%subcommand, problems = problems.len(), "invocation rejected");
        state.release();
        return Err(KeysmithError::InvalidInvocation { problems });
    }

    let request = match subcommand {
        Subcommand::Version => Request::Version,
        Subcommand::Enumerate => Request::Enumerate,
        Subcommand::Enrol => match (state.device.take(), state.file.take()) {
            (Some(device), Some(file)) => Request::Enrol(EnrolRequest {
                device,
                file,
                passphrase: state.passphrase.take(),
                obfuscate_device_info: state.obfuscate_device_info,
                kdf_hardness: match &state.kdf_hardness {
                    HardnessSetting::Requested(tier) => Some(*tier),
                    _ => None,
                },
            }),
            _ => return Err(missing(subcommand, Field::Device)),
        },
        Subcommand::Generate => match state.file.take() {
            Some(file) => Request::Generate(GenerateRequest {
                file,
                passphrase: state.passphrase.take(),
                mixin: state.mixin.take(),
            }),
            None => return Err(missing(subcommand, Field::File)),
        },
        Subcommand::Help | Subcommand::Unknown => {
            return Err(KeysmithError::InvalidInvocation {
                problems: vec![UsageProblem::NoSubcommand],
            })
        }
    };
    Ok(request)
}

fn missing(subcommand: Subcommand, field: Field) -> KeysmithError {
    KeysmithError::InvalidInvocation {
        problems: vec![UsageProblem::MissingField {
            subcommand: subcommand.as_str(),
            field,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KdfHardness;
    use crate::invocation::scan;
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn check(items: &[&str]) -> Result<Request> {
        let args: Vec<OsString> = items.iter().map(OsString::from).collect();
        validate(scan::parse(&args)?)
    }

    fn problems(items: &[&str]) -> Vec<UsageProblem> {
        match check(items) {
            Err(KeysmithError::InvalidInvocation { problems }) => problems,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn valid_enrol_has_device_file_and_no_mixin() {
        let request = check(&["prog", "enrol", "-d", "/dev/sdX", "-f", "keyfile", "-k", "h"]).unwrap();
        let Request::Enrol(enrol) = request else {
            panic!("expected enrol");
        };
        assert_eq!(enrol.device, PathBuf::from("/dev/sdX"));
        assert_eq!(enrol.file, PathBuf::from("keyfile"));
        assert_eq!(enrol.kdf_hardness, Some(KdfHardness::High));
        assert!(enrol.passphrase.is_none());
        assert!(!enrol.obfuscate_device_info);
    }

    #[test]
    fn enrol_accepts_obfuscation_and_passphrase() {
        let request = check(&["prog", "enrol", "-d", "d", "-f", "f", "-o", "-p", "pw"]).unwrap();
        let Request::Enrol(enrol) = request else {
            panic!("expected enrol");
        };
        assert!(enrol.obfuscate_device_info);
        assert_eq!(enrol.passphrase.unwrap().as_bytes(), b"pw");
        assert_eq!(enrol.kdf_hardness, None);
    }

    #[test]
    fn enrol_requires_device() {
        assert_eq!(
            problems(&["prog", "enrol", "-f", "keyfile"]),
            vec![UsageProblem::MissingField {
                subcommand: "enrol",
                field: Field::Device
            }]
        );
    }

    #[test]
    fn enrol_rejects_mixin_and_bad_hardness() {
        assert_eq!(
            problems(&["prog", "enrol", "-d", "d", "-f", "f", "-m", "salt", "-k", "x"]),
            vec![
                UsageProblem::ForbiddenField {
                    subcommand: "enrol",
                    field: Field::Mixin
                },
                UsageProblem::InvalidHardness("x".into()),
            ]
        );
    }

    #[test]
    fn valid_generate_has_only_file() {
        let request = check(&["prog", "generate", "-f", "out.key"]).unwrap();
        let Request::Generate(generate) = request else {
            panic!("expected generate");
        };
        assert_eq!(generate.file, PathBuf::from("out.key"));
        assert!(generate.passphrase.is_none());
        assert!(generate.mixin.is_none());
    }

    #[test]
    fn generate_carries_mixin() {
        let request = check(&["prog", "generate", "-f", "out.key", "-m", "extra"]).unwrap();
        let Request::Generate(generate) = request else {
            panic!("expected generate");
        };
        assert_eq!(generate.mixin, Some(OsString::from("extra")));
    }

    #[test]
    fn generate_rejects_enrol_only_fields() {
        assert_eq!(
            problems(&["prog", "generate", "-f", "out.key", "-d", "/dev/sdX"]),
            vec![UsageProblem::ForbiddenField {
                subcommand: "generate",
                field: Field::Device
            }]
        );
        assert_eq!(
            problems(&["prog", "generate", "-f", "k", "-o", "-k", "l"]),
            vec![
                UsageProblem::ForbiddenField {
                    subcommand: "generate",
                    field: Field::ObfuscateDevice
                },
                UsageProblem::ForbiddenField {
                    subcommand: "generate",
                    field: Field::KdfHardness
                },
            ]
        );
    }

    #[test]
    fn no_argument_subcommands_accept_nothing() {
        assert!(matches!(check(&["prog", "enumerate"]).unwrap(), Request::Enumerate));
        assert!(matches!(check(&["prog", "version"]).unwrap(), Request::Version));

        let options: Vec<Vec<&str>> = vec![
            vec!["-d", "x"],
            vec!["-f", "x"],
            vec!["-m", "x"],
            vec!["-p", "x"],
            vec!["-o"],
            vec!["-k", "m"],
        ];
        for option in options {
            let mut line = vec!["prog", "enumerate"];
            line.extend_from_slice(&option);
            assert_eq!(problems(&line).len(), 1, "{option:?}");
        }
    }

    #[test]
    fn grammar_problems_reject_otherwise_valid_input() {
        assert_eq!(
            problems(&["prog", "generate", "-f", "k", "--frob"]),
            vec![UsageProblem::UnrecognizedOption("--frob".into())]
        );
    }

    #[test]
    fn help_ignores_every_problem() {
        let request = check(&["prog", "enrol", "-h", "-m", "x", "--frob", "stray"]).unwrap();
        let Request::Help { ignored } = request else {
            panic!("expected help");
        };
        assert!(ignored.contains(&UsageProblem::UnrecognizedOption("--frob".into())));
        assert!(ignored.contains(&UsageProblem::UnrecognizedArguments(vec!["stray".into()])));

        assert!(matches!(
            check(&["prog", "help"]).unwrap(),
            Request::Help { ignored } if ignored.is_empty()
        ));
    }

    #[test]
    fn unresolved_subcommand_is_rejected() {
        assert_eq!(
            problems(&["prog", "--help=x", "-o"]),
            vec![
                UsageProblem::UnexpectedValue("help".into()),
                UsageProblem::NoSubcommand,
                UsageProblem::ForbiddenField {
                    subcommand: "unknown",
                    field: Field::ObfuscateDevice
                },
            ]
        );
    }

    #[test]
    fn option_in_place_of_subcommand_is_rejected() {
        let err = check(&["prog", "-f", "out.key", "generate"]).unwrap_err();
        assert_eq!(err.exit_status(), crate::error::ExitStatus::BadInvocation);
    }
}
