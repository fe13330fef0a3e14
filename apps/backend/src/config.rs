//! Environment configuration

use anyhow::{bail, Context};

/// Server configuration read from the environment (after `.env` is loaded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Hour of day (0-23) when a new study day begins.
    pub daily_reset_hour: u32,
}

impl Config {
    /// Read configuration from process environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT") {
            Some(p) => p.parse().with_context(|| format!("invalid PORT: {p}"))?,
            None => 3000,
        };
        let daily_reset_hour = match lookup("DAILY_RESET_HOUR") {
            Some(h) => h
                .parse()
                .with_context(|| format!("invalid DAILY_RESET_HOUR: {h}"))?,
            None => 0,
        };
        if daily_reset_hour > 23 {
            bail!("DAILY_RESET_HOUR must be between 0 and 23, got {daily_reset_hour}");
        }

        Ok(Self {
            database_url,
            host,
            port,
            daily_reset_hour,
        })
    }

    /// Address to bind the HTTP listener to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
