//! Configuration validation.

use crate::config::Config;
use crate::discovery::{MAX_WEIGHT, scale_weight};
use std::collections::HashSet;

/// Validate the configuration.
///
/// Checks for:
/// - A known log level
/// - Unique, non-empty service names
/// - Instance addresses in `host:port` form, unique within a service
/// - Finite, non-negative instance weights that fit the integer scale
///
/// # Returns
///
/// `Ok(())` if valid, or an error message describing every problem found.
pub fn validate_config(config: &Config) -> Result<(), String> {
    let mut errors = Vec::new();

    let mut service_names = HashSet::new();

    for service in &config.services {
        if service.name.is_empty() {
            errors.push("service name cannot be empty".to_string());
        }

        if !service_names.insert(service.name.as_str()) {
            errors.push(format!("duplicate service name: {}", service.name));
        }

        let mut addresses = HashSet::new();
        for instance in &service.instances {
            if !is_host_port(&instance.address) {
                errors.push(format!(
                    "instance '{}' in service '{}' is not a host:port address",
                    instance.address, service.name
                ));
            }

            if !addresses.insert(instance.address.as_str()) {
                errors.push(format!(
                    "duplicate instance address {} in service '{}'",
                    instance.address, service.name
                ));
            }

            // Same conversion the catalog applies, so both accept the same weights
            if scale_weight(&instance.address, instance.weight).is_err() {
                errors.push(format!(
                    "instance {} in service '{}' has invalid weight {} (must be finite, >= 0 and <= {})",
                    instance.address, service.name, instance.weight, MAX_WEIGHT
                ));
            }
        }
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.global.log_level.to_lowercase().as_str()) {
        errors.push(format!(
            "invalid log level '{}', must be one of: {}",
            config.global.log_level,
            valid_levels.join(", ")
        ));
    }

    if config.global.status.enabled && !config.global.status.path.starts_with('/') {
        errors.push(format!(
            "metrics path '{}' must start with '/'",
            config.global.status.path
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

/// Whether `address` looks like `host:port` with a numeric port.
pub(crate) fn is_host_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}
