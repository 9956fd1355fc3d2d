//! Discovery backed by the services declared in the config file.

use super::{Discovery, DiscoveryError, scale_weight};
use crate::balancer::InstanceInfo;
use crate::config::{ServiceConfig, is_host_port};
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Snapshot of declared services: name to instances in declaration order.
type Catalog = HashMap<String, Vec<InstanceInfo>>;

/// Static discovery.
///
/// Instances are converted to [`InstanceInfo`] once per catalog load and
/// cloned out on every lookup. Unhealthy instances are hidden. The catalog
/// can be replaced atomically on config reload.
pub struct StaticDiscovery {
    catalog: ArcSwap<Catalog>,
}

impl StaticDiscovery {
    /// Build discovery from declared services.
    pub fn new(services: &[ServiceConfig]) -> Result<Self, DiscoveryError> {
        Ok(Self {
            catalog: ArcSwap::from_pointee(build_catalog(services)?),
        })
    }

    /// Replace the catalog. The old one is kept if the new one is invalid.
    pub fn replace(&self, services: &[ServiceConfig]) -> Result<(), DiscoveryError> {
        let catalog = build_catalog(services)?;
        debug!(services = catalog.len(), "replacing service catalog");
        self.catalog.store(Arc::new(catalog));
        Ok(())
    }
}

impl Discovery for StaticDiscovery {
    fn list_instances(&self, service: &str) -> Result<Vec<InstanceInfo>, DiscoveryError> {
        self.catalog
            .load()
            .get(service)
            .cloned()
            .ok_or_else(|| DiscoveryError::ServiceNotFound(service.to_string()))
    }

    fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.catalog.load().keys().cloned().collect();
        names.sort();
        names
    }
}

fn build_catalog(services: &[ServiceConfig]) -> Result<Catalog, DiscoveryError> {
    let mut catalog = Catalog::with_capacity(services.len());

    for service in services {
        let mut instances = Vec::with_capacity(service.instances.len());
        for instance in service.instances.iter().filter(|i| i.healthy) {
            if !is_host_port(&instance.address) {
                return Err(DiscoveryError::InvalidAddress(instance.address.clone()));
            }
            instances.push(InstanceInfo {
                service_name: service.name.clone(),
                address: instance.address.clone(),
                weight: scale_weight(&instance.address, instance.weight)?,
                metadata: instance.metadata.clone(),
            });
        }
        catalog.insert(service.name.clone(), instances);
    }

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstanceConfig;

    fn instance(address: &str, weight: f64, healthy: bool) -> InstanceConfig {
        InstanceConfig {
            address: address.to_string(),
            weight,
            healthy,
            metadata: HashMap::from([("cluster".to_string(), "a".to_string())]),
        }
    }

    fn test_services() -> Vec<ServiceConfig> {
        vec![
            ServiceConfig {
                name: "orders".to_string(),
                instances: vec![
                    instance("10.0.0.1:8080", 1.0, true),
                    instance("10.0.0.2:8080", 2.5, false),
                    instance("10.0.0.3:8080", 0.5, true),
                ],
            },
            ServiceConfig {
                name: "users".to_string(),
                instances: vec![],
            },
        ]
    }

    #[test]
    fn test_lists_healthy_instances_in_order() {
        let discovery = StaticDiscovery::new(&test_services()).unwrap();
        let instances = discovery.list_instances("orders").unwrap();

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].address, "10.0.0.1:8080");
        assert_eq!(instances[0].weight, 100);
        assert_eq!(instances[0].service_name, "orders");
        assert_eq!(instances[0].metadata.get("cluster").map(String::as_str), Some("a"));
        assert_eq!(instances[1].address, "10.0.0.3:8080");
        assert_eq!(instances[1].weight, 50);
    }

    #[test]
    fn test_known_service_without_instances() {
        let discovery = StaticDiscovery::new(&test_services()).unwrap();
        assert_eq!(discovery.list_instances("users"), Ok(vec![]));
    }

    #[test]
    fn test_unknown_service() {
        let discovery = StaticDiscovery::new(&test_services()).unwrap();
        assert_eq!(
            discovery.list_instances("billing"),
            Err(DiscoveryError::ServiceNotFound("billing".to_string()))
        );
    }

    #[test]
    fn test_services_sorted() {
        let discovery = StaticDiscovery::new(&test_services()).unwrap();
        assert_eq!(discovery.services(), vec!["orders".to_string(), "users".to_string()]);
    }

    #[test]
    fn test_invalid_weight_rejected() {
        let services = vec![ServiceConfig {
            name: "orders".to_string(),
            instances: vec![instance("10.0.0.1:8080", -2.0, true)],
        }];
        assert!(matches!(
            StaticDiscovery::new(&services),
            Err(DiscoveryError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_invalid_address_rejected() {
        let services = vec![ServiceConfig {
            name: "orders".to_string(),
            instances: vec![instance("10.0.0.1", 1.0, true)],
        }];
        assert_eq!(
            StaticDiscovery::new(&services).err(),
            Some(DiscoveryError::InvalidAddress("10.0.0.1".to_string()))
        );
    }

    #[test]
    fn test_replace_swaps_catalog() {
        let discovery = StaticDiscovery::new(&test_services()).unwrap();

        let updated = vec![ServiceConfig {
            name: "billing".to_string(),
            instances: vec![instance("10.0.1.1:9000", 3.0, true)],
        }];
        discovery.replace(&updated).unwrap();

        assert!(discovery.list_instances("orders").is_err());
        assert_eq!(discovery.list_instances("billing").unwrap()[0].weight, 300);
    }

    #[test]
    fn test_replace_keeps_old_catalog_on_error() {
        let discovery = StaticDiscovery::new(&test_services()).unwrap();

        let broken = vec![ServiceConfig {
            name: "orders".to_string(),
            instances: vec![instance("10.0.0.1:8080", f64::NAN, true)],
        }];
        assert!(discovery.replace(&broken).is_err());
        assert_eq!(discovery.list_instances("orders").unwrap().len(), 2);
    }
}
