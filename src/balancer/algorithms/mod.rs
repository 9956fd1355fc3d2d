//! Load balancing algorithms.

mod smooth_weighted;

pub use smooth_weighted::SmoothWeightedRoundRobin;

use super::InstanceInfo;
use crate::config::Algorithm;
use std::sync::Arc;

/// Trait for load balancing algorithms.
pub trait LoadBalancer: Send + Sync {
    /// Short name of the algorithm, used in logs.
    fn name(&self) -> &'static str;

    /// Select the next instance.
    ///
    /// # Arguments
    ///
    /// * `instances` - Current instances of the service, in discovery order
    ///
    /// # Returns
    ///
    /// The selected instance, or None if no instance is available.
    fn select<'a>(&self, instances: &'a [InstanceInfo]) -> Option<&'a InstanceInfo>;
}

/// Build a balancer of the given algorithm, scoped to `service`.
pub fn build(algorithm: &Algorithm, service: &str) -> Arc<dyn LoadBalancer> {
    match algorithm {
        Algorithm::SmoothWeightedRoundRobin => Arc::new(SmoothWeightedRoundRobin::new(service)),
    }
}
