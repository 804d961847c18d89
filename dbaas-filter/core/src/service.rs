use crate::InvalidRef;
use std::{fmt, str::FromStr};

/// Identifies a managed service whose address filter is kept in sync.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceRef {
    pub name: String,
    pub zone: String,
    pub kind: ServiceKind,
}

/// The category of a managed service.
///
/// Kinds that aren't known are preserved verbatim and used as the category
/// name on the wire, so new service types can be targeted without a release.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Pg,
    Mysql,
    Kafka,
    Opensearch,
    Valkey,
    Grafana,
    Other(String),
}

// === impl ServiceRef ===

impl ServiceRef {
    pub fn new(name: impl ToString, zone: impl ToString, kind: ServiceKind) -> Self {
        Self {
            name: name.to_string(),
            zone: zone.to_string(),
            kind,
        }
    }
}

/// Parses `name:zone:kind`.
impl FromStr for ServiceRef {
    type Err = InvalidRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidRef {
            kind: "service",
            value: s.to_string(),
            expected: "name:zone:kind",
        };

        let parts = s.trim().split(':').map(str::trim).collect::<Vec<_>>();
        match parts[..] {
            [name, zone, kind] if !name.is_empty() && !zone.is_empty() && !kind.is_empty() => {
                Ok(Self::new(name, zone, ServiceKind::from(kind)))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.name, self.zone, self.kind)
    }
}

// === impl ServiceKind ===

impl ServiceKind {
    /// The category name used in API paths for this kind of service.
    pub fn category(&self) -> &str {
        match self {
            Self::Pg => "pg",
            Self::Mysql => "mysql",
            Self::Kafka => "kafka",
            Self::Opensearch => "opensearch",
            Self::Valkey => "redis",
            Self::Grafana => "grafana",
            Self::Other(kind) => kind,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<&str> for ServiceKind {
    fn from(kind: &str) -> Self {
        match kind {
            "pg" => Self::Pg,
            "mysql" => Self::Mysql,
            "kafka" => Self::Kafka,
            "opensearch" => Self::Opensearch,
            "valkey" => Self::Valkey,
            "grafana" => Self::Grafana,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Pg => "pg",
            Self::Mysql => "mysql",
            Self::Kafka => "kafka",
            Self::Opensearch => "opensearch",
            Self::Valkey => "valkey",
            Self::Grafana => "grafana",
            Self::Other(kind) => kind,
        };
        f.write_str(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        for (kind, category) in [
            ("pg", "pg"),
            ("mysql", "mysql"),
            ("kafka", "kafka"),
            ("opensearch", "opensearch"),
            ("valkey", "redis"),
            ("grafana", "grafana"),
            ("thanos", "thanos"),
        ] {
            assert_eq!(ServiceKind::from(kind).category(), category);
            assert_eq!(ServiceKind::from(kind).to_string(), kind);
        }

        assert!(ServiceKind::Valkey.is_known());
        assert!(!ServiceKind::from("thanos").is_known());
    }

    #[test]
    fn parse() {
        assert_eq!(
            "my-postgres-db:ch-gva-2:pg".parse::<ServiceRef>().unwrap(),
            ServiceRef::new("my-postgres-db", "ch-gva-2", ServiceKind::Pg),
        );
        assert_eq!(
            "cache:de-fra-1:valkey".parse::<ServiceRef>().unwrap().kind,
            ServiceKind::Valkey,
        );

        for invalid in ["", "db", "db:zone", "db:zone:", "db::pg", "db:zone:pg:extra"] {
            assert!(
                invalid.parse::<ServiceRef>().is_err(),
                "{invalid:?} must not parse"
            );
        }
    }
}
