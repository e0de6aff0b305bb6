//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STABLEFRONT_DATABASE_URL` - `PostgreSQL` connection string
//! - `MERCHANT_WALLET` - wallet address receiving USDC payments
//!
//! ## Optional
//! - `STABLEFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STABLEFRONT_PORT` - Listen port (default: 3000)
//! - `USDC_CONTRACT` - Token contract address (default: Base Sepolia USDC)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Sentry tracing sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

use stablefront_core::{USDC_CONTRACT_ADDRESS, WalletAddress};

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Settlement API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Payment chain configuration
    pub chain: ChainConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry tracing sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Payment chain configuration.
///
/// The service never talks to the chain itself; these values pin down the
/// contract the client-side transfer must have used.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Merchant wallet receiving payments.
    pub merchant_wallet: WalletAddress,
    /// USDC token contract address.
    pub token_contract: String,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a required variable is missing or a
    /// value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through a variable lookup function.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a required variable is missing or a
    /// value fails to parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = require(&lookup, "STABLEFRONT_DATABASE_URL")?.into();

        let host = parse_or(&lookup, "STABLEFRONT_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = parse_or(&lookup, "STABLEFRONT_PORT", 3000)?;

        let merchant_raw = require(&lookup, "MERCHANT_WALLET")?;
        let merchant_wallet = WalletAddress::parse(&merchant_raw)
            .map_err(|e| ConfigError::InvalidEnvVar("MERCHANT_WALLET".into(), e.to_string()))?;

        let token_contract =
            lookup("USDC_CONTRACT").unwrap_or_else(|| USDC_CONTRACT_ADDRESS.to_owned());

        Ok(Self {
            database_url,
            host,
            port,
            chain: ChainConfig {
                merchant_wallet,
                token_contract,
            },
            sentry_dsn: lookup("SENTRY_DSN"),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_or(&lookup, "SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: parse_or(&lookup, "SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Socket address to bind the server to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn require(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, ConfigError> {
    lookup(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_owned()))
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar(name.to_owned(), raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const MERCHANT: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn load(vars: &HashMap<String, String>) -> Result<ApiConfig, ConfigError> {
        ApiConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn loads_minimal_config_with_defaults() {
        let vars = env(&[
            ("STABLEFRONT_DATABASE_URL", "postgres://localhost/stablefront"),
            ("MERCHANT_WALLET", MERCHANT),
        ]);

        let config = load(&vars).expect("valid config");
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, IpAddr::from([127, 0, 0, 1]));
        assert_eq!(config.chain.token_contract, USDC_CONTRACT_ADDRESS);
        assert_eq!(config.chain.merchant_wallet.as_str(), MERCHANT);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let vars = env(&[("MERCHANT_WALLET", MERCHANT)]);
        assert!(matches!(
            load(&vars),
            Err(ConfigError::MissingEnvVar(name)) if name == "STABLEFRONT_DATABASE_URL"
        ));
    }

    #[test]
    fn malformed_merchant_wallet_is_an_error() {
        let vars = env(&[
            ("STABLEFRONT_DATABASE_URL", "postgres://localhost/stablefront"),
            ("MERCHANT_WALLET", "not-a-wallet"),
        ]);
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidEnvVar(name, _)) if name == "MERCHANT_WALLET"
        ));
    }

    #[test]
    fn malformed_port_is_an_error() {
        let vars = env(&[
            ("STABLEFRONT_DATABASE_URL", "postgres://localhost/stablefront"),
            ("MERCHANT_WALLET", MERCHANT),
            ("STABLEFRONT_PORT", "not-a-port"),
        ]);
        assert!(matches!(load(&vars), Err(ConfigError::InvalidEnvVar(..))));
    }
}
