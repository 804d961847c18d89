use crate::core::{Address, AddressSet, ClusterRef, InvalidAddress, InvalidRef, ServiceRef};
use std::{str::FromStr, time::Duration};

/// A comma-separated list of `name:zone` cluster references.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClusterRefs(pub Vec<ClusterRef>);

/// A comma-separated list of `name:zone:kind` service references.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceRefs(pub Vec<ServiceRef>);

/// A comma-separated list of addresses or CIDR prefixes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticAddresses(pub AddressSet);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("an API key and secret must be set")]
    MissingCredentials,

    #[error("at least one DBaaS service must be configured")]
    NoServices,

    #[error("at least one cluster or static address must be configured")]
    NoSources,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Splits a comma-separated list, ignoring blank entries.
fn entries(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|e| !e.is_empty())
}

impl FromStr for ClusterRefs {
    type Err = InvalidRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        entries(s)
            .map(str::parse)
            .collect::<Result<Vec<ClusterRef>, _>>()
            .map(Self)
    }
}

impl FromStr for ServiceRefs {
    type Err = InvalidRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        entries(s)
            .map(str::parse)
            .collect::<Result<Vec<ServiceRef>, _>>()
            .map(Self)
    }
}

impl FromStr for StaticAddresses {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        entries(s)
            .map(str::parse::<Address>)
            .collect::<Result<AddressSet, _>>()
            .map(Self)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InvalidDuration {
    #[error("{0:?} does not contain a duration value")]
    Missing(String),

    #[error("invalid duration unit {0:?} (expected one of 'ms', 's', 'm', 'h', or 'd')")]
    Unit(String),

    #[error("duration {0:?} overflows")]
    Overflow(String),
}

/// Parses a duration like `500ms`, `10s` or `2m`. A bare integer is a number
/// of seconds.
pub fn parse_duration(s: &str) -> Result<Duration, InvalidDuration> {
    let s = s.trim();
    let (magnitude, unit) = match s.rfind(|c: char| c.is_ascii_digit()) {
        Some(offset) => s.split_at(offset + 1),
        None => return Err(InvalidDuration::Missing(s.to_string())),
    };
    let magnitude = magnitude
        .parse::<u64>()
        .map_err(|_| InvalidDuration::Missing(s.to_string()))?;

    let mul = match unit {
        "ms" => 1,
        "" | "s" => 1000,
        "m" => 1000 * 60,
        "h" => 1000 * 60 * 60,
        "d" => 1000 * 60 * 60 * 24,
        _ => return Err(InvalidDuration::Unit(unit.to_string())),
    };

    let ms = magnitude
        .checked_mul(mul)
        .ok_or_else(|| InvalidDuration::Overflow(s.to_string()))?;
    Ok(Duration::from_millis(ms))
}

pub(crate) fn validate(
    api_key: &str,
    api_secret: &str,
    clusters: &ClusterRefs,
    services: &ServiceRefs,
    static_addresses: &StaticAddresses,
    interval: Duration,
    request_timeout: Duration,
) -> Result<(), ConfigError> {
    if api_key.trim().is_empty() || api_secret.trim().is_empty() {
        return Err(ConfigError::MissingCredentials);
    }
    if services.0.is_empty() {
        return Err(ConfigError::NoServices);
    }
    if clusters.0.is_empty() && static_addresses.0.is_empty() {
        return Err(ConfigError::NoSources);
    }
    if interval.is_zero() {
        return Err(ConfigError::ZeroDuration("interval"));
    }
    if request_timeout.is_zero() {
        return Err(ConfigError::ZeroDuration("request timeout"));
    }
    Ok(())
}
