//! swrrlb - per-service smoothed weighted round-robin instance selection
//!
//! This crate provides:
//! - A smoothed weighted round-robin balancer with GCD-reduced weight steps
//! - A registry holding exactly one balancer per service name
//! - A discovery boundary with a config-backed static catalog
//! - Hot reload of the catalog, Prometheus metrics, and a status endpoint

pub mod balancer;
pub mod config;
pub mod discovery;
pub mod metrics;
pub mod selector;
pub mod state;
pub mod util;

pub use config::Config;
pub use selector::ServiceSelector;
pub use state::AppState;
