use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Clone)]
pub struct Config {
    /// SQLite database file. Defaults to `roster.db` in the working
    /// directory.
    pub db_path: PathBuf,
    pub port: u16,
    /// Log filter, anything `tracing_subscriber::EnvFilter` accepts.
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let db_path = env::var("ROSTER_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("roster.db"));

        let port = env::var("ROSTER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("ROSTER_PORT must be a valid port number")?;

        let log_filter = env::var("ROSTER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            db_path,
            port,
            log_filter,
        })
    }
}
