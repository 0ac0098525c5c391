//! Configuration module for the disk inventory backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::dashboard::filter::CapacityBuckets;

/// Default heading printed on PDF reports.
pub const DEFAULT_REPORT_TITLE: &str = "Disk Inventory Technical Report";

/// Sessions idle longer than this are closed (8 hours).
pub const DEFAULT_SESSION_IDLE_MINUTES: u64 = 480;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication and sign-in (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Named capacity ranges used by the capacity filter
    pub capacity_buckets: CapacityBuckets,
    /// Heading of generated PDF reports
    pub report_title: String,
    /// How long a session may go without a request before it is closed
    pub session_idle_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("DISKINV_API_PSK").ok().filter(|s| !s.is_empty());

        let db_path = env::var("DISKINV_DB_PATH")
            .unwrap_or_else(|_| "./data/inventory.sqlite".to_string())
            .into();

        let bind_addr = env::var("DISKINV_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| format!("Invalid DISKINV_BIND_ADDR format: {}", e))?;

        let log_level = env::var("DISKINV_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let capacity_buckets = match env::var("DISKINV_CAPACITY_BUCKETS") {
            Ok(raw) if !raw.trim().is_empty() => CapacityBuckets::parse(&raw)
                .map_err(|e| format!("Invalid DISKINV_CAPACITY_BUCKETS: {}", e))?,
            _ => CapacityBuckets::default(),
        };

        let report_title =
            env::var("DISKINV_REPORT_TITLE").unwrap_or_else(|_| DEFAULT_REPORT_TITLE.to_string());

        let idle_minutes = match env::var("DISKINV_SESSION_IDLE_MINUTES") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .ok_or_else(|| format!("Invalid DISKINV_SESSION_IDLE_MINUTES: {:?}", raw))?,
            Err(_) => DEFAULT_SESSION_IDLE_MINUTES,
        };

        Ok(Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            capacity_buckets,
            report_title,
            session_idle_timeout: Duration::from_secs(idle_minutes * 60),
        })
    }
}
