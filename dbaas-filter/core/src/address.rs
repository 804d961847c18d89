use ipnet::IpNet;
use std::{collections::BTreeSet, fmt, net::IpAddr, str::FromStr};

/// A network prefix that may appear in an address filter.
///
/// Node addresses are always single-host prefixes (`/32` for IPv4, `/128` for
/// IPv6); statically configured entries may carry any prefix length.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(IpNet);

/// A set of filter addresses.
///
/// Equality is set equality. Filters are always rendered in sorted lexical
/// order so that logs and submitted payloads are deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressSet(BTreeSet<Address>);

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid address {0:?}: expected an IP address or CIDR prefix")]
pub struct InvalidAddress(String);

// === impl Address ===

impl Address {
    /// Normalizes a node address into a single-host prefix.
    pub fn host(ip: IpAddr) -> Self {
        Self(IpNet::from(ip))
    }

    /// Parses a raw node address as reported by the compute API.
    ///
    /// Unlike [`FromStr`], prefixes are rejected: a node has exactly one
    /// address.
    pub fn parse_host(raw: &str) -> Result<Self, InvalidAddress> {
        raw.trim()
            .parse::<IpAddr>()
            .map(Self::host)
            .map_err(|_| InvalidAddress(raw.to_string()))
    }

    pub fn net(&self) -> IpNet {
        self.0
    }
}

impl From<IpAddr> for Address {
    fn from(ip: IpAddr) -> Self {
        Self::host(ip)
    }
}

impl From<IpNet> for Address {
    fn from(net: IpNet) -> Self {
        Self(net)
    }
}

impl FromStr for Address {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.contains('/') {
            return s
                .parse::<IpNet>()
                .map(Self)
                .map_err(|_| InvalidAddress(s.to_string()));
        }
        Self::parse_host(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// === impl AddressSet ===

impl AddressSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, addr: Address) -> bool {
        self.0.insert(addr)
    }

    pub fn contains(&self, addr: &Address) -> bool {
        self.0.contains(addr)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> + '_ {
        self.0.iter()
    }

    /// Renders the set as an address filter, sorted lexically.
    pub fn to_filter(&self) -> Vec<String> {
        let mut filter = self.0.iter().map(ToString::to_string).collect::<Vec<_>>();
        filter.sort_unstable();
        filter
    }
}

impl FromIterator<Address> for AddressSet {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Address> for AddressSet {
    fn extend<I: IntoIterator<Item = Address>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl<'a> Extend<&'a Address> for AddressSet {
    fn extend<I: IntoIterator<Item = &'a Address>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().copied())
    }
}

impl IntoIterator for AddressSet {
    type Item = Address;
    type IntoIter = std::collections::btree_set::IntoIter<Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for AddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_filter().join(", "))
    }
}
