use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::joke::DEFAULT_JOKE_URL;

const TOKEN_ENV: &str = "API_KEY";
const TOKEN_FALLBACK_ENV: &str = "TELOXIDE_TOKEN";
const CLASSIFIER_URL_ENV: &str = "CLASSIFIER_URL";
const CLASSIFIER_TIMEOUT_ENV: &str = "CLASSIFIER_TIMEOUT_SECS";
const JOKE_URL_ENV: &str = "JOKE_URL";

const DEFAULT_CLASSIFIER_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("bot token not found: set API_KEY (or TELOXIDE_TOKEN)")]
    MissingToken,
    #[error("CLASSIFIER_TIMEOUT_SECS must be a positive number of seconds, got {0:?}")]
    InvalidTimeout(String),
}

/// Токен бота. В логи не попадает.
#[derive(Clone, PartialEq)]
pub struct BotToken(String);

impl BotToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BotToken(***)")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: BotToken,
    pub classifier_url: String,
    pub classifier_timeout: Duration,
    pub joke_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let token = non_empty(TOKEN_ENV)
            .or_else(|| non_empty(TOKEN_FALLBACK_ENV))
            .map(BotToken::new)
            .ok_or(ConfigError::MissingToken)?;

        let classifier_timeout = match non_empty(CLASSIFIER_TIMEOUT_ENV) {
            None => Duration::from_secs(DEFAULT_CLASSIFIER_TIMEOUT_SECS),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
        };

        Ok(Self {
            token,
            classifier_url: non_empty(CLASSIFIER_URL_ENV)
                .unwrap_or_else(|| DEFAULT_CLASSIFIER_URL.to_string()),
            classifier_timeout,
            joke_url: non_empty(JOKE_URL_ENV).unwrap_or_else(|| DEFAULT_JOKE_URL.to_string()),
        })
    }
}
