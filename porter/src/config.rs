//! Configuration module for environment variable parsing.
//!
//! All settings are read once at startup into an immutable [`Config`] that is
//! shared with every request through `Arc`.

use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Stage-one source: the published list of mirror targets.
pub const DEFAULT_MIRRORS_URL: &str =
    "https://raw.githubusercontent.com/cqumirrors/bubbles/master/mirrors.json";

/// Stage-two sink that receives the relayed target list.
pub const DEFAULT_RELAY_URL: &str = "http://dev.mirrors.lanunion.org/api/mirrors";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set and non-empty")]
    Missing(&'static str),

    #[error("{name} is not a valid number: {value}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} is not a valid boolean: {value}")]
    InvalidBool { name: &'static str, value: String },

    #[error("{name} is not a valid URL: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },
}

/// HMAC signing secret shared with the webhook sender.
#[derive(Clone)]
pub struct Secret(Vec<u8>);

impl Secret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Token sent as `Access-Token` on forwarded requests.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secret used to verify `X-Hub-Signature`
    pub secret: Secret,

    /// Token attached to the forward stage
    pub access_token: AccessToken,

    /// Expose relay failure details to callers
    pub debug: bool,

    /// Host for the web server to bind to
    pub host: String,

    /// Port for the web server to listen on
    pub port: u16,

    /// URL fetched in the first relay stage
    pub mirrors_url: Url,

    /// URL the envelope is posted to in the second relay stage
    pub relay_url: Url,

    /// Optional timeout for each outbound request; unset means no timeout
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = required(&lookup, "SECRET_KEY")?;
        let access_token = required(&lookup, "ACCESS_TOKEN")?;

        let debug = match lookup("DEBUG") {
            Some(raw) => parse_bool("DEBUG", &raw)?,
            None => false,
        };

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                name: "PORT",
                value: raw,
            })?,
            None => 8080,
        };

        let request_timeout = match lookup("REQUEST_TIMEOUT_MS") {
            Some(raw) => {
                let ms: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber {
                        name: "REQUEST_TIMEOUT_MS",
                        value: raw,
                    })?;
                Some(Duration::from_millis(ms))
            }
            None => None,
        };

        Ok(Config {
            secret: Secret::new(secret),
            access_token: AccessToken::new(access_token),
            debug,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            mirrors_url: parse_url(&lookup, "MIRRORS_URL", DEFAULT_MIRRORS_URL)?,
            relay_url: parse_url(&lookup, "RELAY_URL", DEFAULT_RELAY_URL)?,
            request_timeout,
        })
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name,
            value: raw.to_string(),
        }),
    }
}

fn parse_url<F>(lookup: &F, name: &'static str, default: &str) -> Result<Url, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name).unwrap_or_else(|| default.to_string());
    Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { name, source })
}
