//! Instance descriptors.

use std::collections::HashMap;
use std::fmt;

/// One selectable endpoint behind a service name.
///
/// Built fresh from a discovery snapshot for every selection and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    /// Logical service this endpoint belongs to.
    pub service_name: String,
    /// Reachable endpoint, `host:port`.
    pub address: String,
    /// Relative selection frequency. 0 keeps a rotation slot but never wins.
    pub weight: u32,
    /// Opaque attributes such as a cluster tag.
    pub metadata: HashMap<String, String>,
}

impl InstanceInfo {
    /// Create an instance with no metadata.
    pub fn new(service_name: impl Into<String>, address: impl Into<String>, weight: u32) -> Self {
        Self {
            service_name: service_name.into(),
            address: address.into(),
            weight,
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for InstanceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} (weight {})", self.service_name, self.address, self.weight)
    }
}
