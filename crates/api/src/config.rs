use std::net::SocketAddr;

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SOUK_BIND_ADDR is not a socket address: {0}")]
    BindAddr(String),

    #[error("SOUK_SEED_DEMO must be a boolean, got '{0}'")]
    SeedDemo(String),
}

/// Process configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Seed the in-memory catalog with a few demo products at startup.
    pub seed_demo: bool,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset or blank values fall back to dev defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = match var("SOUK_BIND_ADDR") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::BindAddr(raw))?,
            None => DEFAULT_BIND_ADDR
                .parse()
                .map_err(|_| ConfigError::BindAddr(DEFAULT_BIND_ADDR.to_string()))?,
        };

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let seed_demo = match var("SOUK_SEED_DEMO") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::SeedDemo(raw))?,
            None => false,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            seed_demo,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
