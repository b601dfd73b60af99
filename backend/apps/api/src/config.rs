//! Server Configuration
//!
//! Everything is read from the environment once at startup (after
//! `.env` is loaded). Per-crate settings end up in the typed configs of
//! the auth, content and platform crates.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::AuthConfig;
use base64::Engine;
use base64::engine::general_purpose;
use content::ContentConfig;
use platform::crypto::random_bytes;
use platform::storage::{HttpStorageConfig, StorageConfig};
use sqlx::postgres::PgConnectOptions;

const MIN_JWT_SECRET_BYTES: usize = 32;

/// Account created at startup when missing
#[derive(Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub database: PgConnectOptions,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub port: u16,
    /// `None` allows any origin
    pub frontend_origins: Option<Vec<String>>,
    /// Fail startup when migrations fail
    pub migrations_strict: bool,
    pub admin: Option<AdminBootstrap>,
    pub auth: AuthConfig,
    pub content: ContentConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let env = Env(lookup);

        let database = match env.get("DATABASE_URL") {
            Some(url) => PgConnectOptions::from_str(&url).context("Invalid DATABASE_URL")?,
            None => {
                let mut options = PgConnectOptions::new()
                    .host(&env.get("DB_HOST").unwrap_or_else(|| "localhost".into()))
                    .port(env.parse("DB_PORT", 5432)?)
                    .username(&env.get("DB_USER").unwrap_or_else(|| "postgres".into()))
                    .database(&env.get("DB_NAME").unwrap_or_else(|| "paideia".into()));
                if let Some(password) = env.get("DB_PASSWORD") {
                    options = options.password(&password);
                }
                options
            }
        };

        let defaults = AuthConfig::default();
        let auth = AuthConfig {
            jwt_secret: jwt_secret(env.get("JWT_SECRET"))?,
            jwt_issuer: env.get("JWT_ISSUER").unwrap_or(defaults.jwt_issuer),
            access_token_ttl: env.secs("ACCESS_TOKEN_TTL_SECS", defaults.access_token_ttl)?,
            refresh_token_ttl: env.secs("REFRESH_TOKEN_TTL_SECS", defaults.refresh_token_ttl)?,
            reset_token_ttl: env.secs("RESET_TOKEN_TTL_SECS", defaults.reset_token_ttl)?,
            password_pepper: env.get("PASSWORD_PEPPER").map(String::into_bytes),
            ..defaults
        };

        let public_base_url = env
            .get("PUBLIC_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8080".into());
        let storage = StorageConfig {
            http: match (env.get("STORAGE_ENDPOINT"), env.get("STORAGE_BUCKET")) {
                (Some(endpoint), Some(bucket)) => Some(HttpStorageConfig {
                    endpoint,
                    bucket,
                    access_token: env.get("STORAGE_ACCESS_TOKEN"),
                    public_url: env.get("STORAGE_PUBLIC_URL"),
                }),
                (None, None) => None,
                _ => bail!("STORAGE_ENDPOINT and STORAGE_BUCKET must be set together"),
            },
            local_root: PathBuf::from(env.get("UPLOAD_DIR").unwrap_or_else(|| "uploads".into())),
            local_public_url: format!("{}/uploads", public_base_url.trim_end_matches('/')),
            timeout: env.secs("STORAGE_TIMEOUT_SECS", StorageConfig::default().timeout)?,
        };

        let admin = match (env.get("ADMIN_EMAIL"), env.get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap { email, password }),
            (None, None) => None,
            _ => bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            database,
            db_max_connections: env.parse("DB_MAX_CONNECTIONS", 10)?,
            db_acquire_timeout: env.secs("DB_ACQUIRE_TIMEOUT_SECS", Duration::from_secs(5))?,
            port: env.parse("PORT", 8080)?,
            frontend_origins: env.get("FRONTEND_ORIGINS").map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            }),
            migrations_strict: env.parse("MIGRATIONS_STRICT", true)?,
            admin,
            auth,
            content: ContentConfig::default(),
            storage,
        })
    }
}

/// Release builds refuse to start without a secret; debug builds fall
/// back to a random one, so tokens do not survive a restart.
fn jwt_secret(raw: Option<String>) -> anyhow::Result<Vec<u8>> {
    let Some(raw) = raw else {
        if cfg!(debug_assertions) {
            tracing::warn!("JWT_SECRET not set, using a random signing key");
            return Ok(random_bytes(MIN_JWT_SECRET_BYTES));
        }
        bail!("JWT_SECRET must be set in production");
    };

    let secret = general_purpose::STANDARD
        .decode(raw.as_bytes())
        .context("JWT_SECRET must be base64 encoded")?;
    if secret.len() < MIN_JWT_SECRET_BYTES {
        bail!("JWT_SECRET must decode to at least {MIN_JWT_SECRET_BYTES} bytes");
    }
    Ok(secret)
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed value; blank counts as unset
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, name: &str, default: T) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get(name) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("Invalid value for {name}: {raw}")),
            None => Ok(default),
        }
    }

    fn secs(&self, name: &str, default: Duration) -> anyhow::Result<Duration> {
        self.parse(name, default.as_secs()).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    fn secret() -> String {
        general_purpose::STANDARD.encode([7u8; 32])
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("JWT_SECRET", secret().as_str())]).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.db_acquire_timeout, Duration::from_secs(5));
        assert!(config.migrations_strict);
        assert!(config.frontend_origins.is_none());
        assert!(config.admin.is_none());
        assert!(config.storage.http.is_none());
        assert_eq!(config.storage.local_root, PathBuf::from("uploads"));
        assert_eq!(config.storage.local_public_url, "http://localhost:8080/uploads");
        assert_eq!(config.auth.access_token_ttl, Duration::from_secs(900));
        assert_eq!(config.auth.jwt_secret, vec![7u8; 32]);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("JWT_SECRET", secret().as_str()),
            ("PORT", "9000"),
            ("ACCESS_TOKEN_TTL_SECS", "60"),
            ("FRONTEND_ORIGINS", "https://a.example, https://b.example,"),
            ("MIGRATIONS_STRICT", "false"),
            ("STORAGE_ENDPOINT", "https://s3.example"),
            ("STORAGE_BUCKET", "media"),
            ("PUBLIC_BASE_URL", "https://api.example/"),
            ("ADMIN_EMAIL", "root@example.com"),
            ("ADMIN_PASSWORD", "Teach3r-Lesson-Plan"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.auth.access_token_ttl, Duration::from_secs(60));
        assert_eq!(
            config.frontend_origins,
            Some(vec!["https://a.example".to_string(), "https://b.example".to_string()])
        );
        assert!(!config.migrations_strict);
        assert_eq!(config.storage.http.as_ref().unwrap().bucket, "media");
        assert_eq!(config.storage.local_public_url, "https://api.example/uploads");
        assert_eq!(config.admin.unwrap().email, "root@example.com");
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[("JWT_SECRET", secret().as_str()), ("PORT", "eighty")]).is_err());
        assert!(load(&[("JWT_SECRET", "not base64!")]).is_err());
        assert!(load(&[("JWT_SECRET", general_purpose::STANDARD.encode([1u8; 8]).as_str())]).is_err());
        assert!(load(&[("JWT_SECRET", secret().as_str()), ("STORAGE_BUCKET", "media")]).is_err());
        assert!(load(&[("JWT_SECRET", secret().as_str()), ("ADMIN_EMAIL", "root@example.com")]).is_err());
    }
}
