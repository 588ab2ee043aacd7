//! Client configuration parsed from environment variables.

use std::path::Path;

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_CELL_SIZE: f64 = 64.0;
pub const DEFAULT_ZOOM_STEP: f64 = 0.1;
pub const DEFAULT_VIEWPORT: (f64, f64) = (1280.0, 720.0);
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Errors from reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid { var: &'static str, value: String, reason: &'static str },

    #[error("failed to load env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub ws_url: String,
    pub api_url: String,
    pub token: String,
    pub username: String,
    pub game: String,
    pub cell_size: f64,
    pub zoom_step: f64,
    pub viewport: (f64, f64),
    pub http_timeout_secs: u64,
}

impl Config {
    /// Load `.env` (or `env_file`) into the process environment, then read
    /// the configuration from it.
    ///
    /// Required: `TABLETOP_WS_URL`, `TABLETOP_TOKEN`, `TABLETOP_USERNAME`,
    /// `TABLETOP_GAME`.
    ///
    /// Optional:
    /// - `TABLETOP_API_URL`: default `http://localhost:8000`
    /// - `TABLETOP_CELL_SIZE`: default 64
    /// - `TABLETOP_ZOOM_STEP`: default 0.1
    /// - `TABLETOP_VIEWPORT`: `WIDTHxHEIGHT`, default `1280x720`
    /// - `TABLETOP_HTTP_TIMEOUT_SECS`: default 30
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a value does not
    /// parse, or an explicitly named env file cannot be read.
    pub fn from_env(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        match env_file {
            Some(path) => {
                dotenvy::from_path(path)?;
            }
            None => {
                if let Err(e) = dotenvy::dotenv() {
                    if !e.not_found() {
                        return Err(e.into());
                    }
                }
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |var: &'static str| lookup(var).filter(|v| !v.trim().is_empty()).ok_or(ConfigError::Missing(var));

        let ws_url = required("TABLETOP_WS_URL")?;
        let token = required("TABLETOP_TOKEN")?;
        let username = required("TABLETOP_USERNAME")?;
        let game = required("TABLETOP_GAME")?;

        let api_url = lookup("TABLETOP_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let cell_size = parse_positive("TABLETOP_CELL_SIZE", lookup("TABLETOP_CELL_SIZE"), DEFAULT_CELL_SIZE)?;
        let zoom_step = parse_positive("TABLETOP_ZOOM_STEP", lookup("TABLETOP_ZOOM_STEP"), DEFAULT_ZOOM_STEP)?;
        let viewport = match lookup("TABLETOP_VIEWPORT") {
            Some(raw) => parse_viewport(&raw)?,
            None => DEFAULT_VIEWPORT,
        };
        let http_timeout_secs = match lookup("TABLETOP_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: "TABLETOP_HTTP_TIMEOUT_SECS",
                value: raw,
                reason: "expected whole seconds",
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self { ws_url, api_url, token, username, game, cell_size, zoom_step, viewport, http_timeout_secs })
    }
}

fn parse_positive(var: &'static str, raw: Option<String>, default: f64) -> Result<f64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(ConfigError::Invalid { var, value: raw, reason: "expected a positive number" }),
    }
}

/// Parse `WIDTHxHEIGHT`.
fn parse_viewport(raw: &str) -> Result<(f64, f64), ConfigError> {
    let invalid = || ConfigError::Invalid { var: "TABLETOP_VIEWPORT", value: raw.to_owned(), reason: "expected WIDTHxHEIGHT" };
    let (w, h) = raw.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let w = w.trim().parse::<f64>().map_err(|_| invalid())?;
    let h = h.trim().parse::<f64>().map_err(|_| invalid())?;
    if w > 0.0 && h > 0.0 { Ok((w, h)) } else { Err(invalid()) }
}
