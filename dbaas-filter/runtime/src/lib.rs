#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use exo_dbaas_filter_api as api;
pub use exo_dbaas_filter_core as core;

mod args;
mod config;

pub use self::{
    args::Args,
    config::{parse_duration, ClusterRefs, ConfigError, ServiceRefs, StaticAddresses},
};
