//! Runtime configuration from the process environment.
//! The API listens on port 5000 unless `PORT` says otherwise.

use std::num::NonZeroU32;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_POOL_SIZE: u32 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string, with `sslmode=require` appended when TLS is on.
    pub database_url: String,
    pub bind_addr: String,
    pub port: u16,
    /// Upper bound on pooled database connections shared by all requests.
    pub pool_size: NonZeroU32,
    /// Allowed browser origin for CORS; any origin when unset.
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let raw_url = var("DATABASE_URL").ok_or_else(|| "DATABASE_URL is not set".to_string())?;
        let ssl = match var("DATABASE_SSL") {
            Some(v) => parse_bool(&v).ok_or_else(|| format!("DATABASE_SSL must be true or false, got {v:?}"))?,
            None => true,
        };

        let port = match var("PORT") {
            Some(v) => v
                .parse::<u16>()
                .map_err(|_| format!("PORT must be a valid port number, got {v:?}"))?,
            None => DEFAULT_PORT,
        };

        let pool_size = match var("DB_POOL_SIZE") {
            Some(v) => v
                .parse::<NonZeroU32>()
                .map_err(|_| format!("DB_POOL_SIZE must be a positive integer, got {v:?}"))?,
            None => NonZeroU32::new(DEFAULT_POOL_SIZE).unwrap_or(NonZeroU32::MIN),
        };

        Ok(Config {
            database_url: connection_url(&raw_url, ssl),
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            port,
            pool_size,
            cors_origin: var("CORS_ORIGIN"),
        })
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// libpq's `sslmode=require` encrypts without verifying the server certificate,
/// which is what managed Postgres hosts with self-signed chains need.
/// An explicit `sslmode` in the URL always wins.
fn connection_url(url: &str, ssl: bool) -> String {
    if !ssl || url.contains("sslmode=") {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}sslmode=require")
}
