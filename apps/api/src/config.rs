use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("STORE_BACKEND must be 'postgres' or 'memory', got '{other}'"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerBackend {
    Signature,
    Clamd,
}

impl FromStr for ScannerBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signature" => Ok(ScannerBackend::Signature),
            "clamd" | "clamav" => Ok(ScannerBackend::Clamd),
            other => bail!("SCANNER_BACKEND must be 'signature' or 'clamd', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Only required for the Postgres store.
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub store_backend: StoreBackend,
    pub scanner_backend: ScannerBackend,
    pub clamd_addr: String,
    pub clamd_timeout: Duration,
    pub catalog_path: Option<PathBuf>,
    pub expiry_sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let store_backend: StoreBackend = or_default("STORE_BACKEND", "postgres").parse()?;
        let database_url = get("DATABASE_URL").filter(|v| !v.trim().is_empty());
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            bail!("Required environment variable 'DATABASE_URL' is not set");
        }

        Ok(Config {
            database_url,
            port: or_default("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: or_default("RUST_LOG", "info"),
            store_backend,
            scanner_backend: or_default("SCANNER_BACKEND", "signature").parse()?,
            clamd_addr: or_default("CLAMD_ADDR", "127.0.0.1:3310"),
            clamd_timeout: Duration::from_secs(
                or_default("CLAMD_TIMEOUT_SECS", "30")
                    .parse()
                    .context("CLAMD_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            catalog_path: get("ATS_CATALOG_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            expiry_sweep_interval: Duration::from_secs(
                or_default("EXPIRY_SWEEP_SECS", "3600")
                    .parse::<u64>()
                    .context("EXPIRY_SWEEP_SECS must be a whole number of seconds")?
                    .max(1),
            ),
        })
    }
}
