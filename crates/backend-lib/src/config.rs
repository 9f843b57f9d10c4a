// ============================
// backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use crate::auth::PasswordRequirements;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "linkshelf.toml";

/// Prefix of environment variable overrides, e.g. `LINKSHELF_JWT_SECRET`
pub const ENV_PREFIX: &str = "LINKSHELF_";

/// Shortest accepted signing secret, in bytes
pub const MIN_SECRET_LEN: usize = 16;

/// Longest accepted session lifetime: 30 days
pub const MAX_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Log level, used when `RUST_LOG` is unset
    pub log_level: String,
    /// Page size of `GET /api/posts`
    pub posts_per_page: u32,
    /// HS256 secret for session tokens
    pub jwt_secret: String,
    /// Secret a caller must present to register a user
    pub admin_secret: String,
    /// Comma separated list of allowed CORS origins
    pub cors_whitelist: String,
    /// Session token lifetime in seconds
    pub token_ttl_secs: u64,
    /// Password requirements applied at registration
    pub password_requirements: PasswordRequirements,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database_path: PathBuf::from("data/linkshelf.db"),
            log_level: "info".to_string(),
            posts_per_page: 10,
            jwt_secret: String::new(),
            admin_secret: String::new(),
            cors_whitelist: "http://localhost:5173".to_string(),
            token_ttl_secs: 60 * 60, // 1 hour
            password_requirements: PasswordRequirements::default(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("bind_addr", &self.bind_addr)
            .field("database_path", &self.database_path)
            .field("log_level", &self.log_level)
            .field("posts_per_page", &self.posts_per_page)
            .field("jwt_secret", &"<redacted>")
            .field("admin_secret", &"<redacted>")
            .field("cors_whitelist", &self.cors_whitelist)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("password_requirements", &self.password_requirements)
            .finish()
    }
}

impl Settings {
    /// Load settings from `linkshelf.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from the given TOML file, then environment overrides
    ///
    /// A missing file is not an error; defaults and the environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Settings = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            bail!("invalid log level '{}'", self.log_level);
        }
        if self.posts_per_page == 0 {
            bail!("posts_per_page must be at least 1");
        }
        if self.token_ttl_secs == 0 {
            bail!("token_ttl_secs must be at least 1");
        }
        if self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            bail!("token_ttl_secs must be at most {MAX_TOKEN_TTL_SECS}");
        }
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            bail!("jwt_secret must be at least {MIN_SECRET_LEN} bytes (set {ENV_PREFIX}JWT_SECRET)");
        }
        if self.admin_secret.is_empty() {
            bail!("admin_secret is not set (set {ENV_PREFIX}ADMIN_SECRET)");
        }
        if self.cors_origins().is_empty() {
            bail!("cors_whitelist must list at least one origin");
        }
        if self.password_requirements.min_length < 6 {
            bail!("password_requirements.min_length must be at least 6");
        }
        Ok(())
    }

    /// Allowed CORS origins, trimmed, empties dropped
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_whitelist
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }
}
