//! Application-level configuration loading, including auth secrets and seeded admin accounts.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_ARENA_CONFIG_PATH";
/// Environment variable that overrides the JWT signing secret from the file.
const JWT_SECRET_ENV: &str = "QUIZ_ARENA_JWT_SECRET";

/// Fallback signing secret used when neither the config file nor the
/// environment provides one. Fine for local development, never for production.
const DEV_JWT_SECRET: &str = "quiz-arena-dev-secret";
/// Token lifetime applied when the config file omits one.
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;
/// Directory where uploaded question images are written.
const DEFAULT_UPLOAD_DIR: &str = "uploads";
/// Base URL prefixed to uploaded file names when returning their public URL.
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";
/// Time limit in seconds applied to pushed questions without an explicit one.
pub const DEFAULT_TIME_LIMIT_SECS: u64 = 30;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    jwt_secret: String,
    token_ttl_secs: u64,
    upload_dir: PathBuf,
    public_base_url: String,
    seed_admins: Vec<SeedAdmin>,
}

/// Admin account created in the directory on startup when missing.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedAdmin {
    /// Display name for the seeded account.
    pub name: String,
    /// Login email, unique across the directory.
    pub email: String,
    /// Plaintext password, hashed before insertion.
    pub password: String,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if let Ok(secret) = env::var(JWT_SECRET_ENV) {
            config.jwt_secret = secret;
        }

        if config.jwt_secret == DEV_JWT_SECRET {
            warn!("using the built-in development JWT secret; set {JWT_SECRET_ENV} in production");
        }

        config
    }

    /// Secret used to sign and verify session tokens.
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    /// Lifetime of issued session tokens in seconds.
    pub fn token_ttl_secs(&self) -> u64 {
        self.token_ttl_secs
    }

    /// Directory where uploaded images are stored.
    pub fn upload_dir(&self) -> &PathBuf {
        &self.upload_dir
    }

    /// Base URL used to build public links for uploaded files.
    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    /// Admin accounts to seed into the directory on startup.
    pub fn seed_admins(&self) -> &[SeedAdmin] {
        &self.seed_admins
    }

    /// Default configuration with the given seed admins, for tests.
    #[cfg(test)]
    pub fn with_seed_admins(seed_admins: Vec<SeedAdmin>) -> Self {
        Self {
            seed_admins,
            ..Self::default()
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            seed_admins: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    jwt_secret: Option<String>,
    token_ttl_secs: Option<u64>,
    upload_dir: Option<PathBuf>,
    public_base_url: Option<String>,
    #[serde(default)]
    seed_admins: Vec<SeedAdmin>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            jwt_secret: value.jwt_secret.unwrap_or(defaults.jwt_secret),
            token_ttl_secs: value.token_ttl_secs.unwrap_or(defaults.token_ttl_secs),
            upload_dir: value.upload_dir.unwrap_or(defaults.upload_dir),
            public_base_url: value
                .public_base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_base_url),
            seed_admins: value.seed_admins,
        }
    }
}

fn resolve_config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}
