//! Configuration data types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub global: GlobalConfig,

    /// Balancer settings
    #[serde(default)]
    pub balancer: BalancerConfig,

    /// Statically declared services and their instances
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

/// Global configuration settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Name this process reports in logs and on the status endpoint
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Status/metrics endpoint configuration
    #[serde(default)]
    pub status: StatusConfig,

    /// Config file watching
    #[serde(default)]
    pub watch: WatchConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            application_name: default_application_name(),
            log_level: default_log_level(),
            log_format: LogFormat::Json,
            status: StatusConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Status endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusConfig {
    /// Whether the status endpoint is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Address to bind the status server
    #[serde(default = "default_status_address")]
    pub address: SocketAddr,

    /// Path for Prometheus metrics
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: default_status_address(),
            path: default_metrics_path(),
        }
    }
}

/// Config file watch settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchConfig {
    /// Whether to reload services when the config file changes
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Poll interval for the file watcher backend
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval: default_poll_interval(),
        }
    }
}

/// Balancer settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BalancerConfig {
    /// Load balancing algorithm used for every service
    #[serde(default)]
    pub algorithm: Algorithm,
}

/// Load balancing algorithm.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    SmoothWeightedRoundRobin,
}

/// A logical service and its instances.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Unique service name
    pub name: String,

    /// Instances behind this service, in rotation order
    #[serde(default)]
    pub instances: Vec<InstanceConfig>,
}

/// Individual instance configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstanceConfig {
    /// `host:port` of the instance
    pub address: String,

    /// Discovery-side weight, fractional (scaled by 100 before selection)
    #[serde(default = "default_weight")]
    pub weight: f64,

    /// Unhealthy instances are hidden from selection
    #[serde(default = "default_true")]
    pub healthy: bool,

    /// Opaque attributes
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

// Default value functions
fn default_application_name() -> String {
    "swrrlb".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Json
}

fn default_true() -> bool {
    true
}

fn default_status_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9090))
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_weight() -> f64 {
    1.0
}

/// Custom serde module for humantime durations.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.global.log_level, "info");
        assert_eq!(config.global.application_name, "swrrlb");
        assert_eq!(config.balancer.algorithm, Algorithm::SmoothWeightedRoundRobin);
        assert!(config.services.is_empty());
    }

    #[test]
    fn test_algorithm_serde() {
        let algo: Algorithm = serde_yaml::from_str("smooth_weighted_round_robin").unwrap();
        assert_eq!(algo, Algorithm::SmoothWeightedRoundRobin);

        assert!(serde_yaml::from_str::<Algorithm>("least_connections").is_err());
    }

    #[test]
    fn test_instance_defaults() {
        let instance: InstanceConfig = serde_yaml::from_str(r#"address: "10.0.0.1:80""#).unwrap();
        assert_eq!(instance.weight, 1.0);
        assert!(instance.healthy);
        assert!(instance.metadata.is_empty());
    }

    #[test]
    fn test_watch_poll_interval() {
        let watch: WatchConfig = serde_yaml::from_str("poll_interval: 500ms").unwrap();
        assert!(watch.enabled);
        assert_eq!(watch.poll_interval, Duration::from_millis(500));
    }
}
