use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;

/// Upper bound for token lifetimes: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Dev,
    Prod,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "development" => Ok(Self::Local),
            "dev" => Ok(Self::Dev),
            "prod" | "production" => Ok(Self::Prod),
            other => bail!("unknown APP_ENV value: {other}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection string; takes precedence over the individual parts.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub sslmode: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.name, self.sslmode
        )
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub log: LogConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't have to
    /// touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let secret = lookup("JWT_SECRET").unwrap_or_default();
        if secret.trim().is_empty() {
            bail!("JWT_SECRET is required");
        }

        let server = ServerConfig {
            name: get("APP_NAME", "userhub"),
            environment: get("APP_ENV", "local").parse()?,
            host: get("APP_HOST", "0.0.0.0"),
            port: parse_var(&lookup, "APP_PORT", 8080)?,
            request_timeout_secs: parse_var(&lookup, "REQUEST_TIMEOUT_SECS", 30)?,
        };

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            host: get("DB_HOST", "localhost"),
            port: parse_var(&lookup, "DB_PORT", 5432)?,
            user: get("DB_USER", "postgres"),
            password: get("DB_PASSWORD", ""),
            name: get("DB_NAME", "userhub"),
            sslmode: get("DB_SSLMODE", "disable"),
            max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", 25)?,
            min_connections: parse_var(&lookup, "DB_MIN_CONNECTIONS", 0)?,
            max_lifetime_secs: parse_var(&lookup, "DB_CONN_MAX_LIFETIME_SECS", 300)?,
        };

        let jwt = JwtConfig {
            secret,
            access_ttl_minutes: ttl_var(&lookup, "JWT_ACCESS_TTL_MINUTES", 15)?,
            refresh_ttl_minutes: ttl_var(&lookup, "JWT_REFRESH_TTL_MINUTES", 60 * 24 * 7)?,
        };

        let log = LogConfig {
            level: get("LOG_LEVEL", "debug"),
            json: lookup("LOG_FORMAT").map(|v| v == "json").unwrap_or(false),
        };

        Ok(Self {
            server,
            database,
            jwt,
            log,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

fn ttl_var<F>(lookup: &F, key: &str, default: i64) -> anyhow::Result<i64>
where
    F: Fn(&str) -> Option<String>,
{
    let minutes = parse_var(lookup, key, default)?;
    if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
        bail!("invalid value for {key}: {minutes} (must be between 1 and {MAX_TTL_MINUTES})");
    }
    Ok(minutes)
}
