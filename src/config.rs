use std::{net::SocketAddr, str::FromStr};

use anyhow::Context;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";
/// Ten years.
pub const MAX_JWT_EXPIRATION_SECS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    /// Token validity window in seconds.
    pub expiration_secs: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    /// Full connection string; wins over the individual parts when set.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database = DatabaseConfig {
            host: env_or("DB_HOST", "localhost"),
            port: parse_env("DB_PORT", 5432)?,
            user: env_or("DB_USER", "postgres"),
            password: env_or("DB_PASSWORD", ""),
            name: env_or("DB_NAME", "user_management"),
            max_connections: parse_env("DB_MAX_CONNECTIONS", 10)?,
            url: non_empty_env("DATABASE_URL"),
        };

        let expiration_secs: i64 = parse_env("JWT_EXPIRATION", 24 * 60 * 60)?;
        anyhow::ensure!(expiration_secs > 0, "JWT_EXPIRATION must be positive");
        anyhow::ensure!(
            expiration_secs <= MAX_JWT_EXPIRATION_SECS,
            "JWT_EXPIRATION must be at most {MAX_JWT_EXPIRATION_SECS} seconds"
        );

        let secret = match non_empty_env("JWT_SECRET") {
            Some(s) => s,
            None => {
                tracing::warn!("JWT_SECRET is not set; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let jwt = JwtConfig {
            secret,
            issuer: env_or("JWT_ISSUER", "usercore"),
            expiration_secs,
        };

        Ok(Self {
            server_host: env_or("SERVER_HOST", "0.0.0.0"),
            server_port: parse_env("SERVER_PORT", 8080)?,
            database,
            jwt,
        })
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.server_host, self.server_port)
            .parse()
            .context("invalid SERVER_HOST/SERVER_PORT")
    }
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        if let Some(url) = &self.url {
            return PgConnectOptions::from_str(url).context("invalid DATABASE_URL");
        }
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    non_empty_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}
