use std::env;
use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

pub const BIND_ADDR_VAR: &str = "PSO_BIND_ADDR";
pub const CORS_ORIGIN_VAR: &str = "PSO_CORS_ORIGIN";
pub const STATUS_CAPACITY_VAR: &str = "PSO_STATUS_CAPACITY";

#[derive(Error, Debug)]
pub enum ServerConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    BindAddr { var: &'static str, value: String },
    #[error("{var} is not a valid header value: {value}")]
    CorsOrigin { var: &'static str, value: String },
    #[error("{var} must be a positive integer, got {value}")]
    StatusCapacity { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
    /// Buffered statuses per `/status` subscriber before it starts lagging.
    pub status_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
            status_capacity: 1024,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ServerConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds the config from any key lookup, falling back to defaults for missing keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ServerConfig::default();

        if let Some(value) = lookup(BIND_ADDR_VAR) {
            config.bind_addr = value.parse().map_err(|_| ServerConfigError::BindAddr {
                var: BIND_ADDR_VAR,
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup(CORS_ORIGIN_VAR) {
            config.cors_origin = value.parse().map_err(|_| ServerConfigError::CorsOrigin {
                var: CORS_ORIGIN_VAR,
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup(STATUS_CAPACITY_VAR) {
            config.status_capacity = value
                .parse()
                .ok()
                .filter(|capacity: &usize| *capacity > 0)
                .ok_or_else(|| ServerConfigError::StatusCapacity {
                    var: STATUS_CAPACITY_VAR,
                    value: value.clone(),
                })?;
        }

        Ok(config)
    }
}
