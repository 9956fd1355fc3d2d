//! Shared application state.

use crate::balancer::BalancerRegistry;
use crate::config::Config;
use crate::discovery::{Discovery, DiscoveryError, StaticDiscovery};
use crate::metrics::MetricsCollector;
use crate::selector::ServiceSelector;
use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::{error, info};

/// Shared state accessible from all tasks.
#[derive(Clone)]
pub struct AppState {
    /// Current configuration (swapped atomically on reload).
    config: Arc<ArcSwap<Config>>,

    /// Service catalog backing the selector.
    discovery: Arc<StaticDiscovery>,

    /// Instance selector; its balancer registry outlives reloads.
    selector: Arc<ServiceSelector>,
}

impl AppState {
    /// Create application state from a validated configuration.
    pub fn new(config: Config) -> Result<Self, DiscoveryError> {
        let discovery = Arc::new(StaticDiscovery::new(&config.services)?);
        let lookup: Arc<dyn Discovery> = discovery.clone();
        let registry = BalancerRegistry::new(config.balancer.algorithm.clone());
        let selector = ServiceSelector::new(lookup, registry, MetricsCollector::new());

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            discovery,
            selector: Arc::new(selector),
        })
    }

    /// Get the current configuration.
    pub fn config(&self) -> arc_swap::Guard<Arc<Config>> {
        self.config.load()
    }

    /// Get the instance selector.
    pub fn selector(&self) -> &Arc<ServiceSelector> {
        &self.selector
    }

    /// Apply a reloaded configuration.
    ///
    /// Replaces the service catalog, then the stored config. Existing
    /// balancers keep their rotation state.
    pub fn apply_config(&self, new_config: Config) -> Result<(), DiscoveryError> {
        if let Err(e) = self.discovery.replace(&new_config.services) {
            error!(error = %e, "rejected reloaded services, keeping current catalog");
            return Err(e);
        }

        if new_config.balancer.algorithm != *self.selector.registry().algorithm() {
            info!(
                configured = ?new_config.balancer.algorithm,
                "algorithm change takes effect on restart"
            );
        }

        self.config.store(Arc::new(new_config));
        Ok(())
    }
}
