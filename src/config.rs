use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::constants::{DEFAULT_CATALOG_PATH, DEFAULT_SESSION_TTL_MINS};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub catalog_path: String,
    pub cors_origin: String,
    pub scheduler: SchedulerEnvConfig,
}

#[derive(Debug, Clone)]
pub struct SchedulerEnvConfig {
    /// Seeds both random streams when set.
    pub seed: Option<u64>,
    pub session_ttl_mins: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/kanji-quarry.sled"),
            catalog_path: env_or("CATALOG_PATH", DEFAULT_CATALOG_PATH),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            scheduler: SchedulerEnvConfig {
                seed: env_opt_parse("SCHEDULER_SEED"),
                session_ttl_mins: env_or_parse("SESSION_TTL_MINS", DEFAULT_SESSION_TTL_MINS),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    env_opt_parse(key).unwrap_or(default)
}

/// `None` when unset, empty or unparsable (the last one logged).
pub fn env_opt_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    if raw.trim().is_empty() {
        return None;
    }
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(
                key,
                value = %raw,
                "Failed to parse env var, using default"
            );
            None
        }
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
