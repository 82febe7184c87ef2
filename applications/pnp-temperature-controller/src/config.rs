//! Sample configuration read from the environment.

use std::env;
use std::fmt;

const ENV_HUB_HOSTNAME: &str = "AZ_IOT_HUB_HOSTNAME";
const ENV_DEVICE_ID: &str = "AZ_IOT_DEVICE_ID";
const ENV_MQTT_ENDPOINT: &str = "AZ_IOT_MQTT_ENDPOINT";
const ENV_SAS_SIGNATURE: &str = "AZ_IOT_DEVICE_SAS_SIGNATURE";
const ENV_SAS_EXPIRY: &str = "AZ_IOT_DEVICE_SAS_EXPIRY";

const DEFAULT_MQTT_PORT: u16 = 8883;

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    Missing(&'static str),
    /// A variable is set but cannot be parsed.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{} is not set", name),
            ConfigError::Invalid(name) => write!(f, "{} is not valid", name),
        }
    }
}

impl std::error::Error for ConfigError {}

/// SAS credentials computed outside the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SasCredentials {
    pub signature: String,
    pub expiry: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleConfig {
    pub hostname: String,
    pub device_id: String,
    pub endpoint: String,
    pub sas: Option<SasCredentials>,
}

impl SampleConfig {
    /// Read the configuration from the process environment. Call
    /// `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let entry = |name: &'static str| lookup(name).filter(|value| !value.is_empty());

        let hostname = entry(ENV_HUB_HOSTNAME).ok_or(ConfigError::Missing(ENV_HUB_HOSTNAME))?;
        let device_id = entry(ENV_DEVICE_ID).ok_or(ConfigError::Missing(ENV_DEVICE_ID))?;
        let endpoint = entry(ENV_MQTT_ENDPOINT)
            .unwrap_or_else(|| format!("{}:{}", hostname, DEFAULT_MQTT_PORT));

        let sas = match entry(ENV_SAS_SIGNATURE) {
            Some(signature) => {
                let expiry = entry(ENV_SAS_EXPIRY)
                    .ok_or(ConfigError::Missing(ENV_SAS_EXPIRY))?
                    .parse()
                    .map_err(|_| ConfigError::Invalid(ENV_SAS_EXPIRY))?;
                Some(SasCredentials { signature, expiry })
            }
            None => None,
        };

        Ok(Self {
            hostname,
            device_id,
            endpoint,
            sas,
        })
    }

    /// Log every entry. Secrets are masked.
    pub fn log(&self) {
        tracing::info!("{} = {}", ENV_HUB_HOSTNAME, self.hostname);
        tracing::info!("{} = {}", ENV_DEVICE_ID, self.device_id);
        tracing::info!("{} = {}", ENV_MQTT_ENDPOINT, self.endpoint);
        match &self.sas {
            Some(sas) => {
                tracing::info!("{} = ***", ENV_SAS_SIGNATURE);
                tracing::info!("{} = {}", ENV_SAS_EXPIRY, sas.expiry);
            }
            None => tracing::info!("{} is not set, connecting without a password", ENV_SAS_SIGNATURE),
        }
    }
}
