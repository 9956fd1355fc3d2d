//! Metrics collector using prometheus-client.
//!
//! Counts selections per instance, empty selections, and discovery failures.
//!
//! Labelled series are only created for services discovery knows about;
//! lookups of unknown names share one unlabelled counter.

use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::Arc;

/// Labels for per-instance selection metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct SelectionLabels {
    pub service: String,
    pub instance: String,
}

/// Labels for per-service metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ServiceLabels {
    pub service: String,
}

/// Collects and stores all metrics.
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsCollectorInner>,
}

struct MetricsCollectorInner {
    selections_total: Family<SelectionLabels, Counter>,
    empty_selections_total: Family<ServiceLabels, Counter>,
    discovery_errors_total: Family<ServiceLabels, Counter>,
    unknown_service_lookups_total: Counter,
    /// Number of balancers in the registry.
    balancers: Gauge,
    registry: Registry,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let selections_total = Family::<SelectionLabels, Counter>::default();
        let empty_selections_total = Family::<ServiceLabels, Counter>::default();
        let discovery_errors_total = Family::<ServiceLabels, Counter>::default();
        let unknown_service_lookups_total = Counter::default();
        let balancers = Gauge::default();

        registry.register(
            "swrrlb_selections",
            "Total number of instances selected",
            selections_total.clone(),
        );
        registry.register(
            "swrrlb_empty_selections",
            "Total number of selections that found no usable instance",
            empty_selections_total.clone(),
        );
        registry.register(
            "swrrlb_discovery_errors",
            "Total number of failed discovery lookups",
            discovery_errors_total.clone(),
        );
        registry.register(
            "swrrlb_unknown_service_lookups",
            "Total number of lookups for services discovery does not know",
            unknown_service_lookups_total.clone(),
        );
        registry.register(
            "swrrlb_balancers",
            "Number of per-service balancers created",
            balancers.clone(),
        );

        Self {
            inner: Arc::new(MetricsCollectorInner {
                selections_total,
                empty_selections_total,
                discovery_errors_total,
                unknown_service_lookups_total,
                balancers,
                registry,
            }),
        }
    }

    /// Get the prometheus registry for encoding.
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Record that `instance` was chosen for `service`.
    pub fn record_selection(&self, service: &str, instance: &str) {
        let labels = SelectionLabels {
            service: service.to_string(),
            instance: instance.to_string(),
        };
        self.inner.selections_total.get_or_create(&labels).inc();
    }

    /// Record a selection that returned no instance.
    pub fn record_empty_selection(&self, service: &str) {
        self.inner
            .empty_selections_total
            .get_or_create(&service_labels(service))
            .inc();
    }

    /// Record a failed discovery lookup.
    pub fn record_discovery_error(&self, service: &str) {
        self.inner
            .discovery_errors_total
            .get_or_create(&service_labels(service))
            .inc();
    }

    /// Record a lookup for a service discovery does not know.
    pub fn record_unknown_service(&self) {
        self.inner.unknown_service_lookups_total.inc();
    }

    /// Update the balancer count.
    pub fn set_balancers(&self, count: usize) {
        self.inner.balancers.set(count as i64);
    }

    /// Number of times `instance` was chosen for `service`.
    #[cfg(test)]
    pub(crate) fn selections(&self, service: &str, instance: &str) -> u64 {
        let labels = SelectionLabels {
            service: service.to_string(),
            instance: instance.to_string(),
        };
        self.inner.selections_total.get_or_create(&labels).get()
    }

    /// Number of empty selections for `service`.
    #[cfg(test)]
    pub(crate) fn empty_selections(&self, service: &str) -> u64 {
        self.inner
            .empty_selections_total
            .get_or_create(&service_labels(service))
            .get()
    }

    /// Number of failed discovery lookups for `service`.
    #[cfg(test)]
    pub(crate) fn discovery_errors(&self, service: &str) -> u64 {
        self.inner
            .discovery_errors_total
            .get_or_create(&service_labels(service))
            .get()
    }

    /// Number of lookups for unknown services.
    #[cfg(test)]
    pub(crate) fn unknown_service_lookups(&self) -> u64 {
        self.inner.unknown_service_lookups_total.get()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn service_labels(service: &str) -> ServiceLabels {
    ServiceLabels {
        service: service.to_string(),
    }
}
