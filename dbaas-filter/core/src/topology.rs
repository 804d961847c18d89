//! Walks cluster → nodepool → instance pool → instance to collect the public
//! addresses of a cluster's nodes.

use crate::{
    api::{Api, ClusterSummary, Zone},
    error::bounded,
    Address, AddressSet, ClusterRef, EndpointResolver, Error,
};
use futures::future;
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};

/// The outcome of gathering a single cluster's addresses.
#[derive(Debug)]
pub enum Gather {
    /// Every nodepool and instance was visited.
    Complete(AddressSet),

    /// Some instance pools or instances couldn't be read. The addresses they
    /// would have contributed are missing from `addresses`.
    Partial { addresses: AddressSet, failures: usize },

    /// The cluster itself couldn't be resolved or read.
    Failed(Error),
}

#[derive(Debug)]
pub struct TopologyClient<A: ?Sized> {
    api: Arc<A>,
    endpoints: Arc<EndpointResolver>,
    timeout: Duration,
}

/// Addresses contributed by one instance pool.
#[derive(Debug, Default)]
struct Contribution {
    addresses: AddressSet,
    failures: usize,
}

// === impl Gather ===

impl Gather {
    fn from_contribution(Contribution { addresses, failures }: Contribution) -> Self {
        if failures == 0 {
            Self::Complete(addresses)
        } else {
            Self::Partial {
                addresses,
                failures,
            }
        }
    }

    /// Addresses discovered, regardless of how complete the walk was.
    pub fn addresses(&self) -> Option<&AddressSet> {
        match self {
            Self::Complete(addresses) | Self::Partial { addresses, .. } => Some(addresses),
            Self::Failed(_) => None,
        }
    }

    pub fn into_addresses(self) -> AddressSet {
        match self {
            Self::Complete(addresses) | Self::Partial { addresses, .. } => addresses,
            Self::Failed(_) => AddressSet::default(),
        }
    }
}

// === impl TopologyClient ===

impl<A: Api + ?Sized> TopologyClient<A> {
    pub fn new(api: Arc<A>, endpoints: Arc<EndpointResolver>, timeout: Duration) -> Self {
        Self {
            api,
            endpoints,
            timeout,
        }
    }

    /// Gathers the current public addresses of a cluster's nodes.
    ///
    /// Failures below the cluster level only drop the failing pool or
    /// instance; they never fail the whole cluster.
    pub async fn gather(&self, cluster: &ClusterRef) -> Gather {
        let zone = self.endpoints.resolve(&*self.api, &cluster.zone).await;

        let summary = match self.find(cluster, &zone).await {
            Ok(Some(summary)) => summary,
            Ok(None) => {
                warn!(zone = %cluster.zone, "Cluster not found");
                return Gather::Failed(Error::NotFound(format!("cluster {}", cluster.name)));
            }
            Err(error) => {
                error!(%error, "Failed to list clusters");
                return Gather::Failed(error);
            }
        };

        let detail = match bounded(self.timeout, self.api.get_cluster(&summary.id, &zone)).await {
            Ok(detail) => detail,
            Err(error) => {
                if error.is_not_found() {
                    warn!(id = %summary.id, %error, "Cluster disappeared");
                } else {
                    error!(id = %summary.id, %error, "Failed to read cluster");
                }
                return Gather::Failed(error);
            }
        };

        let mut total = Contribution::default();
        for nodepool in detail.nodepools {
            let nodepool_name = nodepool.name.as_deref().unwrap_or("unknown");
            let Some(pool_id) = nodepool.instance_pool else {
                debug!(nodepool = %nodepool_name, "Nodepool has no instance pool");
                continue;
            };
            debug!(nodepool = %nodepool_name, pool = %pool_id, "Reading nodepool");

            match self.gather_pool(&pool_id, &zone).await {
                Ok(Contribution {
                    addresses,
                    failures,
                }) => {
                    total.addresses.extend(addresses);
                    total.failures += failures;
                }
                Err(error) => {
                    if error.is_not_found() {
                        warn!(pool = %pool_id, %error, "Instance pool not found");
                    } else {
                        error!(pool = %pool_id, %error, "Failed to read instance pool");
                    }
                    total.failures += 1;
                }
            }
        }

        Gather::from_contribution(total)
    }

    async fn find(
        &self,
        cluster: &ClusterRef,
        zone: &Zone,
    ) -> Result<Option<ClusterSummary>, Error> {
        let clusters = bounded(self.timeout, self.api.list_clusters(zone)).await?;
        Ok(clusters.into_iter().find(|c| c.name == cluster.name))
    }

    async fn gather_pool(&self, pool_id: &str, zone: &Zone) -> Result<Contribution, Error> {
        let pool = bounded(self.timeout, self.api.get_instance_pool(pool_id, zone)).await?;
        debug!(pool = %pool_id, instances = pool.instances.len(), "Found instances in pool");

        let lookups = pool
            .instances
            .iter()
            .flatten()
            .map(|id| async move { (id, self.instance_address(id, zone).await) });
        let mut contribution = Contribution::default();
        for (id, result) in future::join_all(lookups).await {
            match result {
                Ok(Some(addr)) => {
                    contribution.addresses.insert(addr);
                }
                Ok(None) => {}
                Err(error) => {
                    if error.is_not_found() {
                        warn!(instance = %id, %error, "Instance not found");
                    } else {
                        error!(instance = %id, %error, "Failed to read instance");
                    }
                    contribution.failures += 1;
                }
            }
        }
        Ok(contribution)
    }

    async fn instance_address(&self, id: &str, zone: &Zone) -> Result<Option<Address>, Error> {
        let instance = bounded(self.timeout, self.api.get_instance(id, zone)).await?;

        let name = instance.name.as_deref().unwrap_or(id);
        let Some(raw) = instance.public_ip.as_deref() else {
            debug!(instance = %name, "Instance has no public address");
            return Ok(None);
        };

        match Address::parse_host(raw) {
            Ok(addr) => {
                info!(%addr, instance = %name, "Found address");
                Ok(Some(addr))
            }
            Err(error) => {
                warn!(instance = %name, %error, "Ignoring instance");
                Ok(None)
            }
        }
    }
}
