use crate::InvalidRef;
use std::{fmt, str::FromStr};

/// Identifies a compute cluster whose node addresses are gathered.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClusterRef {
    pub name: String,
    pub zone: String,
}

impl ClusterRef {
    pub fn new(name: impl ToString, zone: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            zone: zone.to_string(),
        }
    }
}

/// Parses `name:zone`.
impl FromStr for ClusterRef {
    type Err = InvalidRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidRef {
            kind: "cluster",
            value: s.to_string(),
            expected: "name:zone",
        };

        let mut parts = s.trim().split(':').map(str::trim);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(zone), None) if !name.is_empty() && !zone.is_empty() => {
                Ok(Self::new(name, zone))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for ClusterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.zone)
    }
}
