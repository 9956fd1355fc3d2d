//! Per-service instance selection.
//!
//! A [`BalancerRegistry`] hands out one shared balancer per service name.
//! Each balancer keeps its own rotation state, so selections for different
//! services never interfere.

pub mod algorithms;
mod gcd;
mod instance;
mod registry;

pub use algorithms::{LoadBalancer, SmoothWeightedRoundRobin};
pub use gcd::{gcd, gcd_of_weights, max_weight};
pub use instance::InstanceInfo;
pub use registry::{BalancerHandle, BalancerRegistry};
