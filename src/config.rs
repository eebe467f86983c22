//! Application configuration.
//!
//! Values are layered as built-in defaults, then an optional `courtside.toml`
//! in the working directory, then `COURTSIDE_*` environment variables
//! (`COURTSIDE_ADDR`, `COURTSIDE_DATABASE_URL`, `COURTSIDE_SECRET`, ...).

use std::net::SocketAddr;
use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use rand::RngCore;
use serde::Deserialize;
use tower_sessions::cookie::Key;

/// Minimum length of a configured signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

const KEY_CONTEXT: &str = "courtside 2024-01-01 session cookie signing key";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub database_url: String,
    /// Session cookie signing secret. Empty means a random key per process.
    pub secret: String,
    pub templates_dir: PathBuf,
    pub static_dir: PathBuf,
    pub session_lifetime_hours: i64,
    pub secure_cookies: bool,
    pub cleanup_interval_secs: u64,
    pub log_filter: String,
}

/// Cookie settings shared by the session and CSRF layers.
#[derive(Clone)]
pub struct SessionSettings {
    pub key: Key,
    pub lifetime: time::Duration,
    pub secure: bool,
}

impl std::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("key", &"[redacted]")
            .field("lifetime", &self.lifetime)
            .field("secure", &self.secure)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from defaults, `courtside.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("courtside").required(false))
            .add_source(Environment::with_prefix("COURTSIDE").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("addr", "127.0.0.1:4000")?
            .set_default("database_url", "sqlite://courtside.db?mode=rwc")?
            .set_default("secret", "")?
            .set_default("templates_dir", "./ui/html")?
            .set_default("static_dir", "./ui/static")?
            .set_default("session_lifetime_hours", 12)?
            .set_default("secure_cookies", true)?
            .set_default("cleanup_interval_secs", 3600)?
            .set_default("log_filter", "courtside=info,tower_http=info")
    }

    /// Derives the cookie settings, validating the secret.
    pub fn session_settings(&self) -> Result<SessionSettings, ConfigError> {
        if self.session_lifetime_hours < 1 {
            return Err(ConfigError::Message(format!(
                "session_lifetime_hours must be at least 1, got {}",
                self.session_lifetime_hours
            )));
        }

        Ok(SessionSettings {
            key: signing_key(&self.secret)?,
            lifetime: time::Duration::hours(self.session_lifetime_hours),
            secure: self.secure_cookies,
        })
    }

    pub fn cleanup_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

fn signing_key(secret: &str) -> Result<Key, ConfigError> {
    let mut material = [0u8; 64];
    if secret.is_empty() {
        tracing::warn!("no secret configured, sessions will not survive a restart");
        rand::rng().fill_bytes(&mut material);
    } else if secret.len() < MIN_SECRET_LEN {
        return Err(ConfigError::Message(format!(
            "secret must be at least {MIN_SECRET_LEN} bytes, got {}",
            secret.len()
        )));
    } else {
        let mut hasher = blake3::Hasher::new_derive_key(KEY_CONTEXT);
        hasher.update(secret.as_bytes());
        hasher.finalize_xof().fill(&mut material);
    }
    Ok(Key::from(&material[..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let mut builder = AppConfig::builder().unwrap();
        for (key, value) in pairs {
            builder = builder.set_override(*key, *value).unwrap();
        }
        builder.build().unwrap().try_deserialize().unwrap()
    }

    #[test]
    fn defaults() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.addr, "127.0.0.1:4000".parse().unwrap());
        assert_eq!(cfg.database_url, "sqlite://courtside.db?mode=rwc");
        assert_eq!(cfg.templates_dir, PathBuf::from("./ui/html"));
        assert_eq!(cfg.session_lifetime_hours, 12);
        assert!(cfg.secure_cookies);
        assert_eq!(cfg.cleanup_interval(), std::time::Duration::from_secs(3600));
    }

    #[test]
    fn short_secret_is_rejected() {
        let cfg = config_from(&[("secret", "too-short")]);
        assert!(cfg.session_settings().is_err());
    }

    #[test]
    fn same_secret_derives_same_key() {
        let secret = "s6Ndh+pPbnzHbS*+9Pk8qGWhTzbpa@ge";
        let a = config_from(&[("secret", secret)]).session_settings().unwrap();
        let b = config_from(&[("secret", secret)]).session_settings().unwrap();
        assert_eq!(a.key.master(), b.key.master());
        assert_eq!(a.lifetime, time::Duration::hours(12));
    }

    #[test]
    fn empty_secret_generates_fresh_keys() {
        let cfg = config_from(&[]);
        let a = cfg.session_settings().unwrap();
        let b = cfg.session_settings().unwrap();
        assert_ne!(a.key.master(), b.key.master());
    }

    #[test]
    fn zero_lifetime_is_rejected() {
        let cfg = config_from(&[("session_lifetime_hours", "0")]);
        assert!(cfg.session_settings().is_err());
    }
}
