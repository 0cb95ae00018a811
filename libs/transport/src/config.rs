//! Typed per-platform settings.

use std::time::Duration;

use chatwire_core::Platform;
use serde::Deserialize;

pub const DEFAULT_API_BASE: &str = "https://graph.facebook.com/v2.6";

fn default_timeout_secs() -> u64 {
    5
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_true() -> bool {
    true
}

/// Settings for the structured webhook platform.
#[derive(Debug, Clone, Deserialize)]
pub struct MessengerConfig {
    pub access_token: String,
    #[serde(default)]
    pub verify_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl MessengerConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            verify_token: None,
            timeout_secs: default_timeout_secs(),
            api_base: default_api_base(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings for the generic HTTP callback platform.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    /// Server to POST payloads to, when given.
    #[serde(default)]
    pub server: Option<String>,
    /// Print payloads to the output sink.
    #[serde(default = "default_true")]
    pub print: bool,
    /// Only print when the payload carries non-empty text.
    #[serde(default = "default_true")]
    pub print_text_only: bool,
    /// Callback name to wrap printed payloads as a JSONP invocation.
    #[serde(default)]
    pub jsonp: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            server: None,
            print: true,
            print_text_only: true,
            jsonp: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RawConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Platform settings as a tagged union: exactly one variant per supported
/// platform, selected by the platform enum rather than a runtime string map.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum PlatformConfig {
    Messenger(MessengerConfig),
    Raw(RawConfig),
}

impl PlatformConfig {
    pub fn platform(&self) -> Platform {
        match self {
            PlatformConfig::Messenger(_) => Platform::Messenger,
            PlatformConfig::Raw(_) => Platform::Raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn messenger_defaults_are_applied() {
        let config: MessengerConfig =
            serde_json::from_value(json!({ "access_token": "tok" })).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.verify_token, None);
    }

    #[test]
    fn raw_defaults_print_text_only() {
        let config = RawConfig::default();
        assert!(config.print);
        assert!(config.print_text_only);
        assert_eq!(config.server, None);
    }

    #[test]
    fn platform_config_is_tag_selected() {
        let config: PlatformConfig = serde_json::from_value(json!({
            "platform": "messenger",
            "access_token": "tok"
        }))
        .unwrap();
        assert_eq!(config.platform(), Platform::Messenger);

        let config: PlatformConfig =
            serde_json::from_value(json!({ "platform": "raw" })).unwrap();
        assert_eq!(config.platform(), Platform::Raw);
    }
}
