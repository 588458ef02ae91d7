use crate::invocation::GenerateConfig;

use super::enrol::passphrase_state;
use super::Plan;

pub fn plan(config: &GenerateConfig) -> Plan {
    let mut rows = vec![
        ("key file", config.file.display().to_string()),
        ("passphrase", passphrase_state(config.passphrase.is_empty())),
    ];
    if let Some(mixin) = &config.mixin {
        rows.push(("mixin", format!("{} bytes", mixin.len())));
    }
    Plan {
        action: "Generate key file",
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Passphrase;
    use std::ffi::OsString;
    use std::path::PathBuf;

    #[test]
    fn plan_describes_generation() {
        let config = GenerateConfig {
            file: PathBuf::from("out.key"),
            passphrase: Passphrase::from_bytes(b""),
            mixin: Some(OsString::from("abcd")),
        };
        let plan = plan(&config);
        assert_eq!(plan.get("key file"), Some("out.key"));
        assert_eq!(plan.get("passphrase"), Some("empty"));
        assert_eq!(plan.get("mixin"), Some("4 bytes"));
    }
}
