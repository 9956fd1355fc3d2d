//! Registry of per-service balancers.

use super::algorithms::{self, LoadBalancer};
use crate::config::Algorithm;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

/// Shared handle to a service's balancer.
pub type BalancerHandle = Arc<dyn LoadBalancer>;

/// Maps service names to their balancer.
///
/// At most one balancer is ever built per service name; every caller gets a
/// handle to the same instance. Entries are never evicted.
pub struct BalancerRegistry {
    algorithm: Algorithm,
    balancers: DashMap<String, BalancerHandle>,
}

impl BalancerRegistry {
    /// Create an empty registry that builds balancers of `algorithm`.
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            balancers: DashMap::new(),
        }
    }

    /// Algorithm used for new balancers.
    pub fn algorithm(&self) -> &Algorithm {
        &self.algorithm
    }

    /// Return the balancer for `service`, building it on first use.
    pub fn get_or_create(&self, service: &str) -> BalancerHandle {
        if let Some(existing) = self.balancers.get(service) {
            return Arc::clone(existing.value());
        }

        // The entry lock makes check-and-insert atomic; a racing loser gets
        // the winner's balancer.
        let entry = self
            .balancers
            .entry(service.to_string())
            .or_insert_with(|| {
                info!(
                    service = service,
                    algorithm = ?self.algorithm,
                    "created balancer for service"
                );
                algorithms::build(&self.algorithm, service)
            });

        Arc::clone(entry.value())
    }

    /// Return the balancer for `service` if one exists.
    pub fn get(&self, service: &str) -> Option<BalancerHandle> {
        self.balancers.get(service).map(|b| Arc::clone(b.value()))
    }

    /// Names of all services that have a balancer.
    pub fn services(&self) -> Vec<String> {
        self.balancers.iter().map(|e| e.key().clone()).collect()
    }

    /// Number of balancers built so far.
    pub fn len(&self) -> usize {
        self.balancers.len()
    }

    /// Whether no balancer has been built yet.
    pub fn is_empty(&self) -> bool {
        self.balancers.is_empty()
    }
}

impl Default for BalancerRegistry {
    fn default() -> Self {
        Self::new(Algorithm::default())
    }
}
