//! Platform detection and store configuration.

use std::env;

use serde::{Deserialize, Serialize};

/// Where the store is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// A browser-like client with durable local storage.
    Browser,
    #[default]
    Server,
}

/// Build mode of the running application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Production,
    Test,
    #[default]
    Development,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Platform {
    pub target: Target,
    pub mode: Mode,
}

impl Platform {
    pub const fn new(target: Target, mode: Mode) -> Self {
        Self { target, mode }
    }

    /// Read `APP_TARGET` and `APP_ENV` from the environment.
    pub fn from_env() -> Self {
        Self::from_vars(
            env::var("APP_TARGET").ok().as_deref(),
            env::var("APP_ENV").ok().as_deref(),
        )
    }

    /// Interpret raw target and mode values.
    ///
    /// Anything other than `browser` is a server target; anything other
    /// than `production` or `test` is development.
    pub fn from_vars(target: Option<&str>, mode: Option<&str>) -> Self {
        let target = match target.map(str::trim) {
            Some(t) if t.eq_ignore_ascii_case("browser") => Target::Browser,
            _ => Target::Server,
        };
        let mode = match mode.map(str::trim) {
            Some(m) if m.eq_ignore_ascii_case("production") => Mode::Production,
            Some(m) if m.eq_ignore_ascii_case("test") => Mode::Test,
            _ => Mode::Development,
        };
        Self { target, mode }
    }

    pub fn is_browser(&self) -> bool {
        self.target == Target::Browser
    }

    pub fn is_server(&self) -> bool {
        self.target == Target::Server
    }

    pub fn is_prod(&self) -> bool {
        self.mode == Mode::Production
    }

    pub fn is_test(&self) -> bool {
        self.mode == Mode::Test
    }

    pub fn is_dev(&self) -> bool {
        !(self.is_prod() || self.is_test())
    }
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub platform: Platform,
    /// Storage key the persisted snapshot lives under.
    pub storage_key: String,
    /// Log each sub-state restored by rehydration.
    pub log_rehydration: bool,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        let platform = Platform::from_env();
        Self {
            platform,
            log_rehydration: platform.is_dev(),
            ..Self::default()
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            platform: Platform::default(),
            storage_key: "state".to_string(),
            log_rehydration: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vars_default_to_server_development() {
        let platform = Platform::from_vars(None, None);
        assert!(platform.is_server());
        assert!(platform.is_dev());
    }

    #[test]
    fn vars_parse_case_insensitively() {
        let platform = Platform::from_vars(Some("Browser"), Some(" PRODUCTION "));
        assert!(platform.is_browser());
        assert!(platform.is_prod());
        assert!(!platform.is_dev());

        assert!(Platform::from_vars(None, Some("test")).is_test());
        assert!(Platform::from_vars(Some("electron"), Some("staging")).is_dev());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: StoreConfig =
            serde_json::from_str(r#"{ "platform": { "target": "browser" } }"#).unwrap();
        assert_eq!(config.storage_key, "state");
        assert!(config.platform.is_browser());
        assert_eq!(config.platform.mode, Mode::Development);
        assert!(!config.log_rehydration);
    }
}
