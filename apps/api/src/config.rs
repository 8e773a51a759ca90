use std::num::NonZeroU32;

use anyhow::{Context, Result};

use crate::matching::scoring::ScorerKind;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub rust_log: String,
    pub match_scorer: ScorerKind,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: parse_max_connections(
                &std::env::var("DATABASE_MAX_CONNECTIONS").unwrap_or_else(|_| "10".to_string()),
            )?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            match_scorer: parse_scorer(
                &std::env::var("MATCH_SCORER").unwrap_or_else(|_| "overlap".to_string()),
            )?,
            run_migrations: parse_bool(
                &std::env::var("RUN_MIGRATIONS").unwrap_or_else(|_| "true".to_string()),
            )
            .context("RUN_MIGRATIONS must be true or false")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// A pool of zero connections would block every acquire until timeout.
fn parse_max_connections(raw: &str) -> Result<u32> {
    raw.trim()
        .parse::<NonZeroU32>()
        .map(NonZeroU32::get)
        .context("DATABASE_MAX_CONNECTIONS must be a positive integer")
}

fn parse_scorer(raw: &str) -> Result<ScorerKind> {
    raw.parse::<ScorerKind>()
        .context("MATCH_SCORER must be 'overlap' or 'weighted'")
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("invalid boolean '{other}'"),
    }
}
