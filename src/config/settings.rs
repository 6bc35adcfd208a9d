//! Service settings loaded from an optional TOML file plus environment overrides.
//!
//! Lookup order: built-in defaults, then the file named by `BASKET_BUDDY_CONFIG`
//! (or `./config.toml` when it exists), then `DATABASE_URL`, `LISTEN_ADDR` and
//! `JWT_SECRET` from the environment.

use crate::config::database::DEFAULT_DATABASE_URL;
use crate::errors::{Error, Result};
use chrono::Duration;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

const CONFIG_PATH_VAR: &str = "BASKET_BUDDY_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";
/// Upper bound for `access_token_minutes` (one week)
const MAX_ACCESS_TOKEN_MINUTES: i64 = 7 * 24 * 60;
/// Upper bound for `refresh_token_days`
const MAX_REFRESH_TOKEN_DAYS: i64 = 365;

fn lifetime(
    key: &str,
    value: i64,
    max: i64,
    to_duration: fn(i64) -> Option<Duration>,
) -> Result<Duration> {
    if !(1..=max).contains(&value) {
        return Err(Error::Config {
            message: format!("{key} must be between 1 and {max}, got {value}"),
        });
    }
    to_duration(value).ok_or_else(|| Error::Config {
        message: format!("{key} is out of range: {value}"),
    })
}

/// Settings for the HTTP service
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Address the API listens on
    pub listen_addr: SocketAddr,
    /// `SeaORM` connection string
    pub database_url: String,
    /// HMAC secret for access and refresh tokens
    pub jwt_secret: Option<String>,
    /// Lifetime of access tokens in minutes
    pub access_token_minutes: i64,
    /// Lifetime of refresh tokens in days
    pub refresh_token_days: i64,
    /// Whether `GET /baskets/all` (every basket in the system) is routed
    pub expose_basket_directory: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            jwt_secret: None,
            access_token_minutes: 15,
            refresh_token_days: 1,
            expose_basket_directory: true,
        }
    }
}

impl Settings {
    /// Lifetime of access tokens, failing unless it lies within one week.
    pub fn access_token_ttl(&self) -> Result<Duration> {
        lifetime(
            "access_token_minutes",
            self.access_token_minutes,
            MAX_ACCESS_TOKEN_MINUTES,
            Duration::try_minutes,
        )
    }

    /// Lifetime of refresh tokens, failing unless it lies within one year.
    pub fn refresh_token_ttl(&self) -> Result<Duration> {
        lifetime(
            "refresh_token_days",
            self.refresh_token_days,
            MAX_REFRESH_TOKEN_DAYS,
            Duration::try_days,
        )
    }

    /// Returns the token secret, failing if none was configured.
    pub fn jwt_secret(&self) -> Result<&str> {
        match self.jwt_secret.as_deref() {
            Some(secret) if !secret.trim().is_empty() => Ok(secret),
            _ => Err(Error::Config {
                message: "JWT_SECRET must be set".to_string(),
            }),
        }
    }
}

/// Parses settings from TOML text; missing keys take their defaults.
///
/// Token lifetimes are range-checked here; the secret is checked by [`load_settings`].
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse settings: {e}"),
    })?;
    settings.access_token_ttl()?;
    settings.refresh_token_ttl()?;
    Ok(settings)
}

/// Loads settings from a TOML file.
pub fn load_settings_file<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load settings from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_settings(&contents)
}

/// Loads settings from the configured file (if any) and the environment.
pub fn load_settings() -> Result<Settings> {
    let mut settings = match std::env::var(CONFIG_PATH_VAR) {
        Ok(path) => load_settings_file(path)?,
        Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            load_settings_file(DEFAULT_CONFIG_PATH)?
        }
        Err(_) => Settings::default(),
    };

    if let Ok(url) = std::env::var("DATABASE_URL") {
        settings.database_url = url;
    }
    if let Ok(addr) = std::env::var("LISTEN_ADDR") {
        settings.listen_addr = addr.parse().map_err(|e| Error::Config {
            message: format!("Invalid LISTEN_ADDR {addr:?}: {e}"),
        })?;
    }
    if let Ok(secret) = std::env::var("JWT_SECRET") {
        settings.jwt_secret = Some(secret);
    }

    // Fail at startup rather than on the first sign-in
    settings.jwt_secret()?;
    settings.access_token_ttl()?;
    settings.refresh_token_ttl()?;
    tracing::info!(
        listen_addr = %settings.listen_addr,
        expose_basket_directory = settings.expose_basket_directory,
        "Settings loaded"
    );
    Ok(settings)
}
