//! Service selector: discovery lookup plus per-service balancing.

use crate::balancer::{BalancerHandle, BalancerRegistry, InstanceInfo};
use crate::discovery::{Discovery, DiscoveryError};
use crate::metrics::MetricsCollector;
use std::sync::Arc;
use tracing::{debug, warn};

/// Picks instances for services.
///
/// Fetches a fresh instance list from discovery on every call and hands it
/// to the service's shared balancer.
pub struct ServiceSelector {
    discovery: Arc<dyn Discovery>,
    registry: BalancerRegistry,
    metrics: MetricsCollector,
}

impl ServiceSelector {
    /// Create a selector over `discovery`, building balancers via `registry`.
    pub fn new(
        discovery: Arc<dyn Discovery>,
        registry: BalancerRegistry,
        metrics: MetricsCollector,
    ) -> Self {
        Self {
            discovery,
            registry,
            metrics,
        }
    }

    /// Get (or create) the balancer for `service`.
    pub fn balancer(&self, service: &str) -> BalancerHandle {
        let balancer = self.registry.get_or_create(service);
        self.metrics.set_balancers(self.registry.len());
        balancer
    }

    /// Choose one of `instances` for `service`.
    ///
    /// # Returns
    ///
    /// The selected instance, or None if no instance is usable.
    pub fn choose<'a>(&self, service: &str, instances: &'a [InstanceInfo]) -> Option<&'a InstanceInfo> {
        let balancer = self.balancer(service);
        let selected = balancer.select(instances);

        match selected {
            Some(instance) => {
                debug!(
                    service = service,
                    instance = %instance.address,
                    weight = instance.weight,
                    candidates = instances.len(),
                    algorithm = balancer.name(),
                    "selected instance"
                );
                self.metrics.record_selection(service, &instance.address);
            }
            None => {
                warn!(service = service, candidates = instances.len(), "no usable instance available");
                self.metrics.record_empty_selection(service);
            }
        }

        selected
    }

    /// Look up `service` in discovery and choose one of its instances.
    ///
    /// A discovery failure is logged and treated as an empty instance list.
    /// An unknown service returns None without creating a balancer.
    pub fn select_instance(&self, service: &str) -> Option<InstanceInfo> {
        let instances = match self.discovery.list_instances(service) {
            Ok(instances) => instances,
            Err(DiscoveryError::ServiceNotFound(_)) => {
                // No balancer or labelled series for names discovery does not know
                debug!(service = service, "service not known to discovery");
                self.metrics.record_unknown_service();
                return None;
            }
            Err(e) => {
                warn!(service = service, error = %e, "failed to list instances");
                self.metrics.record_discovery_error(service);
                Vec::new()
            }
        };

        self.choose(service, &instances).cloned()
    }

    /// Services known to discovery.
    pub fn services(&self) -> Vec<String> {
        self.discovery.services()
    }

    /// The metrics collector this selector records into.
    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// The balancer registry.
    pub fn registry(&self) -> &BalancerRegistry {
        &self.registry
    }
}
