//! Configuration types.
//!
//! Everything is loaded once at startup from environment variables and
//! passed into components at construction — no ambient globals, so tests
//! can substitute arbitrary channel sets.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default cron schedule for the daily digest: 08:00 on weekdays.
pub const DEFAULT_DIGEST_SCHEDULE: &str = "0 0 8 * * Mon-Fri *";

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Channel IDs to watch.
    pub monitored_channels: Vec<String>,
    /// Channel ID that receives summaries and digests.
    pub summary_channel: String,
    /// App-level token for Socket Mode (`xapp-...`).
    pub app_token: SecretString,
    /// Bot user token for the Web API and file downloads (`xoxb-...`).
    pub bot_token: SecretString,
    /// Classification oracle settings.
    pub oracle: OracleConfig,
    /// Cron expression for the daily digest.
    pub digest_schedule: String,
}

/// Gemini oracle settings.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub api_key: SecretString,
    pub model: String,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let monitored_channels: Vec<String> = require("MONITORED_CHANNEL_IDS")?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if monitored_channels.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "MONITORED_CHANNEL_IDS".into(),
                message: "expected a comma-separated list of channel IDs".into(),
            });
        }

        Ok(Self {
            monitored_channels,
            summary_channel: require("SUMMARY_CHANNEL_ID")?,
            app_token: SecretString::from(require("SLACK_APP_TOKEN")?),
            bot_token: SecretString::from(require("SLACK_BOT_USER_TOKEN")?),
            oracle: OracleConfig {
                api_key: SecretString::from(require("GEMINI_API_KEY")?),
                model: std::env::var("GEMINI_MODEL")
                    .unwrap_or_else(|_| "gemini-2.0-flash-exp".to_string()),
            },
            digest_schedule: std::env::var("DIGEST_SCHEDULE")
                .unwrap_or_else(|_| DEFAULT_DIGEST_SCHEDULE.to_string()),
        })
    }
}

fn require(key: &str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingEnvVar(key.to_string())),
    }
}
