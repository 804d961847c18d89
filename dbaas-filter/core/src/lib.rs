#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod address;
pub mod api;
mod cluster;
mod endpoint;
mod error;
pub mod reconcile;
mod service;
pub mod topology;
mod updater;


pub use self::{
    address::{Address, AddressSet, InvalidAddress},
    api::Api,
    cluster::ClusterRef,
    endpoint::EndpointResolver,
    error::Error,
    reconcile::{Config, Cycle, ReconcileState, Reconciler},
    service::{ServiceKind, ServiceRef},
    topology::{Gather, TopologyClient},
    updater::TargetUpdater,
};
pub use ipnet::IpNet;

/// Error returned when a `name:zone` style reference can't be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} reference {value:?}: expected {expected}")]
pub struct InvalidRef {
    kind: &'static str,
    value: String,
    expected: &'static str,
}
