//! Environment-driven application configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::broker::{AmqpConfig, BrokerConfig};
use crate::catalog::{CatalogCacheConfig, CatalogClientConfig};
use crate::geocode::GeocoderConfig;

/// Default listen address.
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

/// Errors from reading the environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub listen_addr: SocketAddr,

    pub catalog: CatalogClientConfig,

    pub catalog_cache: CatalogCacheConfig,

    /// Read the catalog from this XML file instead of over HTTP.
    pub catalog_file: Option<PathBuf>,

    pub geocoder: GeocoderConfig,

    pub amqp: AmqpConfig,

    pub broker: BrokerConfig,

    /// Answer buoy requests from files in this directory instead of the queue.
    pub mock_data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            catalog: CatalogClientConfig::default(),
            catalog_cache: CatalogCacheConfig::default(),
            catalog_file: None,
            geocoder: GeocoderConfig::default(),
            amqp: AmqpConfig::default(),
            broker: BrokerConfig::default(),
            mock_data_dir: None,
        }
    }
}

impl AppConfig {
    /// Read configuration from `BUOY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// Unset or blank variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        let listen = get("BUOY_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        config.listen_addr = listen.parse().map_err(|e| ConfigError::Invalid {
            var: "BUOY_LISTEN_ADDR",
            message: format!("{listen:?} is not a socket address ({e})"),
        })?;

        if let Some(user_agent) = get("BUOY_USER_AGENT") {
            config.catalog = config.catalog.with_user_agent(user_agent.clone());
            config.geocoder = config.geocoder.with_user_agent(user_agent);
        }
        if let Some(url) = get("BUOY_CATALOG_URL") {
            config.catalog.url = url;
        }
        if let Some(path) = get("BUOY_CATALOG_CACHE") {
            config.catalog_cache.path = PathBuf::from(path);
        }
        config.catalog_file = get("BUOY_CATALOG_FILE").map(PathBuf::from);

        if let Some(url) = get("BUOY_GEOCODER_URL") {
            config.geocoder.base_url = url;
        }

        if let Some(url) = get("BUOY_AMQP_URL") {
            config.amqp.url = url;
        }
        if let Some(queue) = get("BUOY_REQUEST_QUEUE") {
            config.amqp.request_queue = queue;
        }
        if let Some(queue) = get("BUOY_RESPONSE_QUEUE") {
            config.amqp.response_queue = queue;
        }
        if let Some(secs) = get("BUOY_RESPONSE_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    var: "BUOY_RESPONSE_TIMEOUT_SECS",
                    message: format!("{secs:?} is not a positive number of seconds"),
                })?;
            config.broker = config
                .broker
                .with_response_timeout(Duration::from_secs(secs));
        }
        config.mock_data_dir = get("BUOY_MOCK_DATA_DIR").map(PathBuf::from);

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.listen_addr, SocketAddr::from(([127, 0, 0, 1], 3000)));
        assert_eq!(config.catalog.url, "https://www.ndbc.noaa.gov/activestations.xml");
        assert_eq!(
            config.catalog_cache.path,
            PathBuf::from("activestations_cache.json")
        );
        assert_eq!(config.geocoder.base_url, "https://nominatim.openstreetmap.org");
        assert_eq!(config.amqp.url, "amqp://127.0.0.1:5672/%2f");
        assert_eq!(config.amqp.request_queue, "To_Microservice");
        assert_eq!(config.amqp.response_queue, "To_Main_Program");
        assert_eq!(config.broker.response_timeout, Duration::from_secs(60));
        assert!(config.catalog_file.is_none());
        assert!(config.mock_data_dir.is_none());
    }

    #[test]
    fn overrides_from_environment() {
        let config = AppConfig::from_lookup(lookup(&[
            ("BUOY_LISTEN_ADDR", "0.0.0.0:8080"),
            ("BUOY_USER_AGENT", "buoys-test/2.0"),
            ("BUOY_AMQP_URL", "amqp://rabbit:5672/%2f"),
            ("BUOY_REQUEST_QUEUE", "requests"),
            ("BUOY_RESPONSE_QUEUE", "  replies "),
            ("BUOY_RESPONSE_TIMEOUT_SECS", "5"),
            ("BUOY_MOCK_DATA_DIR", "/tmp/buoys"),
            ("BUOY_CATALOG_URL", ""),
        ]))
        .unwrap();

        assert_eq!(config.listen_addr, SocketAddr::from(([0, 0, 0, 0], 8080)));
        assert_eq!(config.catalog.user_agent, "buoys-test/2.0");
        assert_eq!(config.geocoder.user_agent, "buoys-test/2.0");
        assert_eq!(config.amqp.url, "amqp://rabbit:5672/%2f");
        assert_eq!(config.amqp.request_queue, "requests");
        assert_eq!(config.amqp.response_queue, "replies");
        assert_eq!(config.broker.response_timeout, Duration::from_secs(5));
        assert_eq!(config.mock_data_dir, Some(PathBuf::from("/tmp/buoys")));
        // Blank values keep the default.
        assert_eq!(config.catalog.url, "https://www.ndbc.noaa.gov/activestations.xml");
    }

    #[test]
    fn invalid_values_are_errors() {
        let err = AppConfig::from_lookup(lookup(&[("BUOY_LISTEN_ADDR", "localhost")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "BUOY_LISTEN_ADDR", .. }));

        for bad in ["0", "-3", "soon"] {
            let err = AppConfig::from_lookup(lookup(&[("BUOY_RESPONSE_TIMEOUT_SECS", bad)]))
                .unwrap_err();
            assert!(matches!(
                err,
                ConfigError::Invalid {
                    var: "BUOY_RESPONSE_TIMEOUT_SECS",
                    ..
                }
            ));
        }
    }
}
