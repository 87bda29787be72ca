//! Environment-driven configuration for the sample API host

use anyhow::{anyhow, Context};
use std::env;
use std::net::SocketAddr;

use crate::validation::ServiceLifetime;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub cors_origins: Vec<String>,
    pub validator_lifetime: ServiceLifetime,
    pub automatic_validation: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address such as 0.0.0.0:8080")?;

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let validator_lifetime = match lookup("MODEL_VALIDATION_LIFETIME") {
            Some(raw) => raw.parse::<ServiceLifetime>().map_err(|e: String| anyhow!(e))?,
            None => ServiceLifetime::default(),
        };

        let automatic_validation = lookup("AUTOMATIC_MODEL_VALIDATION")
            .map(|v| v.trim().to_lowercase() != "false")
            .unwrap_or(true);

        Ok(Self {
            bind_addr,
            cors_origins,
            validator_lifetime,
            automatic_validation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.validator_lifetime, ServiceLifetime::Singleton);
        assert!(config.automatic_validation);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("CORS_ORIGINS", "https://a.example, ,https://b.example"),
            ("MODEL_VALIDATION_LIFETIME", "Transient"),
            ("AUTOMATIC_MODEL_VALIDATION", "FALSE"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(config.validator_lifetime, ServiceLifetime::Transient);
        assert!(!config.automatic_validation);
    }

    #[test]
    fn test_rejects_unknown_lifetime() {
        let result = AppConfig::from_lookup(lookup_from(&[("MODEL_VALIDATION_LIFETIME", "scoped")]));
        assert!(result.is_err());
    }
}
