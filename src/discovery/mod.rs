//! Service discovery boundary.
//!
//! The balancer never talks to a registry itself; callers fetch a fresh
//! instance list through a [`Discovery`] implementation for every selection.

mod static_catalog;

pub use static_catalog::StaticDiscovery;

use crate::balancer::InstanceInfo;
use thiserror::Error;

/// Errors produced while resolving a service to its instances.
#[derive(Debug, Error, PartialEq)]
pub enum DiscoveryError {
    #[error("service '{0}' is not known to discovery")]
    ServiceNotFound(String),

    #[error("instance {address} has invalid weight {weight} (must be finite, >= 0 and <= {max})", max = MAX_WEIGHT)]
    InvalidWeight { address: String, weight: f64 },

    #[error("instance address '{0}' is not host:port")]
    InvalidAddress(String),
}

/// Resolves service names to their current instances.
pub trait Discovery: Send + Sync {
    /// Current selectable instances of `service`, in a stable order.
    fn list_instances(&self, service: &str) -> Result<Vec<InstanceInfo>, DiscoveryError>;

    /// Names of every service discovery knows about.
    fn services(&self) -> Vec<String>;
}

/// Largest discovery-side weight whose scaled value fits in a `u32`.
pub const MAX_WEIGHT: f64 = (u32::MAX / 100) as f64;

/// Scale a discovery-side fractional weight to the balancer's integer weight.
///
/// Weights are expressed on a fractional scale (e.g. 1.0 to 10.0) and
/// multiplied by 100, so `1.5` becomes `150`.
pub fn scale_weight(address: &str, weight: f64) -> Result<u32, DiscoveryError> {
    let scaled = (weight * 100.0).round();
    if !weight.is_finite() || weight < 0.0 || weight > MAX_WEIGHT {
        return Err(DiscoveryError::InvalidWeight {
            address: address.to_string(),
            weight,
        });
    }
    Ok(scaled as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_weight() {
        assert_eq!(scale_weight("a:1", 1.0), Ok(100));
        assert_eq!(scale_weight("a:1", 1.5), Ok(150));
        assert_eq!(scale_weight("a:1", 0.29), Ok(29));
        assert_eq!(scale_weight("a:1", 0.0), Ok(0));
        assert_eq!(scale_weight("a:1", 10.0), Ok(1000));
    }

    #[test]
    fn test_scale_weight_rejects_invalid() {
        assert!(matches!(
            scale_weight("a:1", -1.0),
            Err(DiscoveryError::InvalidWeight { .. })
        ));
        assert!(scale_weight("a:1", f64::NAN).is_err());
        assert!(scale_weight("a:1", f64::INFINITY).is_err());
        assert!(scale_weight("a:1", 1e12).is_err());
        assert_eq!(scale_weight("a:1", MAX_WEIGHT), Ok(u32::MAX / 100 * 100));
        assert!(scale_weight("a:1", MAX_WEIGHT + 1.0).is_err());
    }
}
