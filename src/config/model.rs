use std::env;

/// Environment variable holding the log filter (`tracing` directive syntax).
pub const LOG_ENV: &str = "KEYSMITH_LOG";
/// Environment variable selecting coloured output: auto, always or never.
pub const COLOR_ENV: &str = "KEYSMITH_COLOR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// Runtime settings taken from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Log filter (default: warn)
    pub log_filter: String,

    /// When to colour diagnostics
    pub color: ColorMode,
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            color: ColorMode::Auto,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup. Unknown values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_filter = lookup(LOG_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(default_log_filter);

        let no_color = lookup("NO_COLOR").is_some_and(|value| !value.is_empty());
        let color = match lookup(COLOR_ENV).as_deref().map(str::trim) {
            Some("always") => ColorMode::Always,
            Some("never") => ColorMode::Never,
            _ if no_color => ColorMode::Never,
            _ => ColorMode::Auto,
        };

        Self { log_filter, color }
    }

    /// Apply the colour choice to `colored`; auto leaves detection to the crate.
    pub fn apply_color(&self) {
        match self.color {
            ColorMode::Always => colored::control::set_override(true),
            ColorMode::Never => colored::control::set_override(false),
            ColorMode::Auto => {}
        }
    }
}
