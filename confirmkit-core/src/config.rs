//! Engine configuration and its defaults.

use serde::{Deserialize, Serialize};

use crate::error::{ConfirmError, ConfirmResult};

/// Path prefix used when none is configured.
pub const DEFAULT_PATH_PREFIX: &str = "confirmation";

/// Key allocation attempts before giving up.
pub const DEFAULT_KEY_ATTEMPTS: u32 = 1000;

/// Random bytes drawn per key candidate and per token.
pub const DEFAULT_ENTROPY_BYTES: usize = 256;

/// Lower bound for [`EngineConfig::entropy_bytes`].
pub const MIN_ENTROPY_BYTES: usize = 16;

/// Settings shared by process creation and validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Leading path segment(s) of confirmation links, without slashes at
    /// either end.
    pub path_prefix: String,
    /// Key allocation attempts before [`ConfirmError::KeySpaceExhausted`].
    pub key_attempts: u32,
    /// Random bytes drawn per key candidate and per token.
    pub entropy_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            key_attempts: DEFAULT_KEY_ATTEMPTS,
            entropy_bytes: DEFAULT_ENTROPY_BYTES,
        }
    }
}

impl EngineConfig {
    /// Replaces the path prefix.
    #[must_use]
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into();
        self
    }

    /// Replaces the key allocation budget.
    #[must_use]
    pub const fn with_key_attempts(mut self, attempts: u32) -> Self {
        self.key_attempts = attempts;
        self
    }

    /// Checks the configuration for values the engine cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfirmError::InputInvalid`] for an empty or malformed
    /// prefix, a zero attempt budget, or too little entropy.
    pub fn validate(&self) -> ConfirmResult<()> {
        let prefix = self.path_prefix.as_str();
        if prefix.is_empty()
            || prefix.starts_with('/')
            || prefix.ends_with('/')
            || prefix.contains("//")
            || prefix.chars().any(char::is_whitespace)
        {
            return Err(ConfirmError::InputInvalid(format!(
                "invalid path prefix `{prefix}`"
            )));
        }
        if self.key_attempts == 0 {
            return Err(ConfirmError::InputInvalid(
                "key_attempts must be positive".to_string(),
            ));
        }
        if self.entropy_bytes < MIN_ENTROPY_BYTES {
            return Err(ConfirmError::InputInvalid(format!(
                "entropy_bytes must be at least {MIN_ENTROPY_BYTES}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.path_prefix, "confirmation");
        assert_eq!(config.key_attempts, 1000);
        assert_eq!(config.entropy_bytes, 256);
        config.validate().expect("valid");
    }

    #[test]
    fn test_nested_prefix_is_valid() {
        EngineConfig::default()
            .with_path_prefix("api/v1/confirmation")
            .validate()
            .expect("valid");
    }

    #[test]
    fn test_invalid_configs() {
        for prefix in ["", "/confirmation", "confirmation/", "a//b", "has space"] {
            assert!(EngineConfig::default()
                .with_path_prefix(prefix)
                .validate()
                .is_err());
        }
        assert!(EngineConfig::default().with_key_attempts(0).validate().is_err());
        let config = EngineConfig {
            entropy_bytes: 8,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"path_prefix":"confirm"}"#).expect("json");
        assert_eq!(config.path_prefix, "confirm");
        assert_eq!(config.key_attempts, DEFAULT_KEY_ATTEMPTS);
    }
}
