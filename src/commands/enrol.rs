use crate::error::{KeysmithError, Result};
use crate::invocation::EnrolConfig;

use super::Plan;

pub fn plan(config: &EnrolConfig) -> Result<Plan> {
    let tier = config.kdf_hardness;
    let params = tier
        .params()
        .map_err(|e| KeysmithError::Kdf(format!("{tier}: {e}")))?;

    Ok(Plan {
        action: "Enrol device",
        rows: vec![
            ("device", config.device.display().to_string()),
            ("key file", config.file.display().to_string()),
            (
                "kdf hardness",
                format!(
                    "{tier} (argon2id, {} KiB, {} passes)",
                    params.m_cost(),
                    params.t_cost()
                ),
            ),
            (
                "device details",
                if config.obfuscate_device_info {
                    "obfuscated".to_string()
                } else {
                    "recorded".to_string()
                },
            ),
            ("passphrase", passphrase_state(config.passphrase.is_empty())),
        ],
    })
}

pub(super) fn passphrase_state(empty: bool) -> String {
    let state = if empty { "empty" } else { "provided" };
    state.to_string()
}
