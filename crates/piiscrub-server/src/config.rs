//! Server configuration: a YAML or TOML file with `PIISCRUB_*` environment overrides

use anyhow::Context;
use piiscrub_pii::{Action, Policy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub tokenization: TokenizationConfig,

    #[serde(default)]
    pub policy: Policy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log every audit event (previews only) at info level
    #[serde(default = "default_false")]
    pub log_audit: bool,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TokenizationConfig {
    /// HMAC key for tokens. Tokenize requests fail while this is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl fmt::Debug for TokenizationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenizationConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logging: LoggingConfig::default(),
            tokenization: TokenizationConfig::default(),
            policy: Policy::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_audit: false,
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents)
                .with_context(|| format!("invalid TOML in {}", path.display()))?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents)
                .with_context(|| format!("invalid YAML in {}", path.display()))?
        };

        Ok(config)
    }

    /// Merge environment variables into config (env vars take precedence)
    pub fn merge_env(&mut self) {
        self.merge_env_from(|key| std::env::var(key).ok());
    }

    /// Same as [`merge_env`](Self::merge_env) with a custom variable lookup
    pub fn merge_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Server settings
        if let Some(val) = lookup("PIISCRUB_HOST") {
            self.host = val;
        }

        if let Some(val) = lookup("PIISCRUB_PORT") {
            match val.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => eprintln!("Warning: Invalid PIISCRUB_PORT '{}', ignoring", val),
            }
        }

        // Logging settings
        if let Some(val) = lookup("PIISCRUB_LOG_LEVEL") {
            self.logging.level = val;
        }

        if let Some(val) = lookup("PIISCRUB_LOG_AUDIT")
            && let Ok(enabled) = val.parse::<bool>()
        {
            self.logging.log_audit = enabled;
        }

        // Tokenization
        if let Some(val) = lookup("PIISCRUB_HMAC_KEY") {
            self.tokenization.secret = Some(val).filter(|s| !s.is_empty());
        }

        // Policy
        if let Some(val) = lookup("PIISCRUB_DEFAULT_ACTION") {
            match val.parse::<Action>() {
                Ok(action) => self.policy.default_action = action,
                Err(e) => eprintln!("Warning: Invalid PIISCRUB_DEFAULT_ACTION: {}", e),
            }
        }

        if let Some(val) = lookup("PIISCRUB_DETECT_NAMES_IN_FREE_TEXT")
            && let Ok(enabled) = val.parse::<bool>()
        {
            self.policy.detect_names_in_free_text = enabled;
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_false() -> bool {
    false
}
