//! Configuration for the hyperrobot bot.
//!
//! Every field has a serde default, so an empty file (or no file at all)
//! yields a working configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Windows shorter than this are accepted with a warning.
const SHORT_WINDOW_SECONDS: u64 = 10;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HyperrobotConfig {
    /// Only messages from this channel are handled.
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Identity used when posting.
    #[serde(default)]
    pub bot: BotConfig,

    /// External puzzle generator.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Battle timers.
    #[serde(default)]
    pub battle: BattleConfig,

    /// Upper bound for the requested search depth.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

fn default_channel() -> String {
    "sandbox".to_string()
}

fn default_max_depth() -> u32 {
    1000
}

impl Default for HyperrobotConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            bot: BotConfig::default(),
            generator: GeneratorConfig::default(),
            battle: BattleConfig::default(),
            max_depth: default_max_depth(),
        }
    }
}

impl HyperrobotConfig {
    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        debug!(path = %path_ref.display(), "Loading configuration from file");
        let content = std::fs::read_to_string(path_ref)?;
        let config: Self = serde_yaml::from_str(&content)?;
        debug!(
            channel = %config.channel,
            generator = %config.generator.command,
            max_depth = config.max_depth,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Loads the file if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        if path_ref.exists() {
            Self::from_file(path_ref)
        } else {
            debug!(path = %path_ref.display(), "No configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Checks values the bot cannot run with, and flags suspicious ones.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        let mut warnings = Vec::new();

        if self.generator.command.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "generator.command".to_string(),
                message: "must name an executable".to_string(),
            });
        }
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_depth".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        for (field, seconds) in [
            ("battle.bidding_seconds", self.battle.bidding_seconds),
            ("battle.answer_seconds", self.battle.answer_seconds),
        ] {
            if seconds == 0 {
                return Err(ConfigError::Invalid {
                    field: field.to_string(),
                    message: "must be at least one second".to_string(),
                });
            }
            if seconds < SHORT_WINDOW_SECONDS {
                warnings.push(ConfigWarning::InvalidValue {
                    field: field.to_string(),
                    message: format!("{seconds}s leaves players little time"),
                });
            }
        }

        if self.channel.trim().is_empty() {
            warnings.push(ConfigWarning::InvalidValue {
                field: "channel".to_string(),
                message: "empty channel matches only messages without a channel".to_string(),
            });
        }

        Ok(warnings)
    }
}

/// Posting identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_icon_emoji")]
    pub icon_emoji: String,
}

fn default_username() -> String {
    "hyperrobot".to_string()
}

fn default_icon_emoji() -> String {
    ":robot_face:".to_string()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            icon_emoji: default_icon_emoji(),
        }
    }
}

/// Puzzle generator process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Executable to run.
    #[serde(default = "default_generator_command")]
    pub command: String,

    /// Arguments placed before `depth h w walls`.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_generator_command() -> String {
    "ricochet-robots-generator".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            command: default_generator_command(),
            args: Vec::new(),
        }
    }
}

/// Battle timer lengths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleConfig {
    #[serde(default = "default_window_seconds")]
    pub bidding_seconds: u64,

    #[serde(default = "default_window_seconds")]
    pub answer_seconds: u64,
}

fn default_window_seconds() -> u64 {
    60
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            bidding_seconds: default_window_seconds(),
            answer_seconds: default_window_seconds(),
        }
    }
}

impl BattleConfig {
    pub fn bidding_window(&self) -> Duration {
        Duration::from_secs(self.bidding_seconds)
    }

    pub fn answer_window(&self) -> Duration {
        Duration::from_secs(self.answer_seconds)
    }
}

/// Configuration warnings emitted during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Field has a value that works but is probably unintended.
    InvalidValue { field: String, message: String },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::InvalidValue { field, message } => {
                write!(f, "Warning [{field}]: {message}")
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for '{field}': {message}")]
    Invalid { field: String, message: String },
}
