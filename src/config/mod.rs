//! Configuration module for the rollcall backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Fallback JWT secret used when none is configured. Fine for local
/// development, logged loudly at startup.
pub const DEV_JWT_SECRET: &str = "rollcall-dev-secret";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Secret for signing and verifying session tokens
    pub jwt_secret: String,
    /// Admin login email (admin login is disabled when unset)
    pub admin_email: Option<String>,
    /// Admin login password
    pub admin_password: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("ROLLCALL_DB_PATH")
            .unwrap_or_else(|_| "./data/rollcall.sqlite".to_string())
            .into();

        let bind_addr = env::var("ROLLCALL_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:2017".to_string())
            .parse()
            .expect("Invalid ROLLCALL_BIND_ADDR format");

        let log_level = env::var("ROLLCALL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let jwt_secret =
            env::var("ROLLCALL_JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string());

        let admin_email = env::var("ROLLCALL_ADMIN_EMAIL").ok();
        let admin_password = env::var("ROLLCALL_ADMIN_PASSWORD").ok();

        Self {
            db_path,
            bind_addr,
            log_level,
            jwt_secret,
            admin_email,
            admin_password,
        }
    }
}
