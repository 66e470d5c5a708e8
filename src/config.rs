//! Application configuration loaded from environment variables.
//!
//! Secrets are read once at startup and cached in memory. On Cloud Run the
//! secret bindings inject them as environment variables before the app starts.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Support contact surfaced in blocked-account responses
    pub support_email: String,

    // --- Secrets ---
    /// Signing key for access tokens (raw bytes)
    pub jwt_secret: Vec<u8>,
    /// Signing key for refresh tokens; falls back to `jwt_secret` when unset
    pub jwt_refresh_secret: Vec<u8>,

    // --- SMTP delivery (disabled when host is unset) ---
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    /// From-address on outgoing verification mail
    pub smtp_from: String,

    // --- Lifetimes ---
    /// Session row and access token lifetime
    pub session_ttl_days: i64,
    /// Refresh token lifetime
    pub refresh_ttl_days: i64,
    /// One-time code lifetime
    pub otp_ttl_minutes: i64,
    /// Pause between expired-session sweeps
    pub reaper_interval_secs: u64,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            support_email: "kinderkare@support.ac.in".to_string(),
            jwt_secret: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            jwt_refresh_secret: b"test_refresh_key_32_bytes_min!!".to_vec(),
            smtp_host: None,
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_from: "Kinderwacht <no-reply@kinderwacht.app>".to_string(),
            session_ttl_days: 7,
            refresh_ttl_days: 30,
            otp_ttl_minutes: 15,
            reaper_interval_secs: 3600,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| ConfigError::Missing("JWT_SECRET"))?
            .into_bytes();
        // A dedicated refresh secret is optional; reuse the access secret
        // when it is not provided.
        let jwt_refresh_secret = env::var("JWT_REFRESH_SECRET")
            .map(String::into_bytes)
            .unwrap_or_else(|_| jwt_secret.clone());

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            support_email: env::var("SUPPORT_EMAIL")
                .unwrap_or_else(|_| "kinderkare@support.ac.in".to_string()),
            jwt_secret,
            jwt_refresh_secret,
            smtp_host: env::var("SMTP_HOST").ok().filter(|h| !h.is_empty()),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .unwrap_or(587),
            smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            smtp_from: env::var("SMTP_FROM")
                .unwrap_or_else(|_| "Kinderwacht <no-reply@kinderwacht.app>".to_string()),
            session_ttl_days: parse_env("SESSION_TTL_DAYS", 7),
            refresh_ttl_days: parse_env("REFRESH_TTL_DAYS", 30),
            otp_ttl_minutes: parse_env("OTP_TTL_MINUTES", 15),
            reaper_interval_secs: parse_env("REAPER_INTERVAL_SECS", 3600),
        })
    }
}

fn parse_env<T: std::str::FromStr + Copy>(name: &'static str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::remove_var("JWT_REFRESH_SECRET");
        env::set_var("JWT_SECRET", "test_jwt_key_32_bytes_minimum!!");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.port, 8080);
        assert_eq!(config.session_ttl_days, 7);
        assert_eq!(config.otp_ttl_minutes, 15);
        // Refresh secret falls back to the access secret when unset
        assert_eq!(config.jwt_refresh_secret, config.jwt_secret);

        env::set_var("JWT_REFRESH_SECRET", "another_key_for_refresh_tokens!");
        let config = Config::from_env().expect("Config should load");
        assert_ne!(config.jwt_refresh_secret, config.jwt_secret);
        env::remove_var("JWT_REFRESH_SECRET");
    }
}
