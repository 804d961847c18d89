//! The compute and managed-service API consumed by the reconciler.
//!
//! Implementations own transport and authentication. Every call is expected
//! to fail fast; callers additionally bound each call with their own timeout.

use crate::Error;

/// A zone and the regional API endpoint serving it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Zone {
    pub name: String,
    pub endpoint: String,
}

/// An entry of a zone's cluster listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterSummary {
    pub id: String,
    pub name: String,
}

/// Full cluster detail.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cluster {
    pub id: String,
    pub name: String,
    pub nodepools: Vec<Nodepool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Nodepool {
    pub name: Option<String>,

    /// The instance pool backing this nodepool, if it has been provisioned.
    pub instance_pool: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstancePool {
    pub id: String,

    /// Member instance ids. Entries without an id are kept as `None` so that
    /// callers can account for them.
    pub instances: Vec<Option<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Instance {
    pub id: String,
    pub name: Option<String>,

    /// The raw public address, as reported by the API.
    pub public_ip: Option<String>,
}

/// The filter-relevant configuration of a managed service.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetConfig {
    pub ip_filter: Vec<String>,
}

#[async_trait::async_trait]
pub trait Api: Send + Sync {
    /// Lists every zone known to the API along with its endpoint.
    async fn list_zones(&self) -> Result<Vec<Zone>, Error>;

    async fn list_clusters(&self, zone: &Zone) -> Result<Vec<ClusterSummary>, Error>;

    async fn get_cluster(&self, id: &str, zone: &Zone) -> Result<Cluster, Error>;

    async fn get_instance_pool(&self, id: &str, zone: &Zone) -> Result<InstancePool, Error>;

    async fn get_instance(&self, id: &str, zone: &Zone) -> Result<Instance, Error>;

    /// Reads a managed service of the given category.
    async fn get_target_config(
        &self,
        category: &str,
        name: &str,
        zone: &Zone,
    ) -> Result<TargetConfig, Error>;

    /// Replaces a managed service's address filter with exactly `filter`.
    async fn put_target_config(
        &self,
        category: &str,
        name: &str,
        zone: &Zone,
        filter: &[String],
    ) -> Result<(), Error>;
}
