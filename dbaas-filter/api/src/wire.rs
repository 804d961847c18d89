//! JSON bodies exchanged with the v2 API.

use exo_dbaas_filter_core::api;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct ZoneList {
    #[serde(default)]
    pub zones: Vec<Zone>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Zone {
    pub name: String,
    pub api_endpoint: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct ClusterList {
    #[serde(default)]
    pub sks_clusters: Vec<ClusterSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClusterSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Cluster {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nodepools: Vec<Nodepool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Nodepool {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_reference")]
    pub instance_pool: Option<Reference>,
}

/// A reference to another resource, by id.
#[derive(Debug, Deserialize)]
pub(crate) struct Reference {
    #[serde(default)]
    pub id: Option<String>,
}

/// Treats a value that isn't a reference object as absent, so one malformed
/// nodepool doesn't fail the whole cluster.
fn lenient_reference<'de, D>(de: D) -> Result<Option<Reference>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(de)?;
    Ok(value.and_then(|v| Reference::deserialize(v).ok()))
}

#[derive(Debug, Deserialize)]
pub(crate) struct InstancePool {
    pub id: String,
    #[serde(default)]
    pub instances: Vec<Reference>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Instance {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub public_ip: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Service {
    #[serde(default)]
    pub ip_filter: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct IpFilterUpdate<'a> {
    pub ip_filter: &'a [String],
}

// === conversions ===

impl From<Zone> for api::Zone {
    fn from(Zone { name, api_endpoint }: Zone) -> Self {
        Self {
            name,
            endpoint: api_endpoint,
        }
    }
}

impl From<ClusterSummary> for api::ClusterSummary {
    fn from(ClusterSummary { id, name }: ClusterSummary) -> Self {
        Self { id, name }
    }
}

impl From<Cluster> for api::Cluster {
    fn from(cluster: Cluster) -> Self {
        Self {
            id: cluster.id,
            name: cluster.name,
            nodepools: cluster
                .nodepools
                .into_iter()
                .map(|np| api::Nodepool {
                    name: np.name,
                    instance_pool: np.instance_pool.and_then(|r| r.id),
                })
                .collect(),
        }
    }
}

impl From<InstancePool> for api::InstancePool {
    fn from(pool: InstancePool) -> Self {
        Self {
            id: pool.id,
            instances: pool.instances.into_iter().map(|r| r.id).collect(),
        }
    }
}

impl From<Instance> for api::Instance {
    fn from(Instance { id, name, public_ip }: Instance) -> Self {
        Self {
            id,
            name,
            public_ip,
        }
    }
}

impl From<Service> for api::TargetConfig {
    fn from(Service { ip_filter }: Service) -> Self {
        Self { ip_filter }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_zones() {
        let zones: ZoneList = serde_json::from_str(
            r#"{"zones": [
                {"name": "ch-gva-2", "api-endpoint": "https://api-ch-gva-2.exoscale.com/v2", "sos-endpoint": "x"},
                {"name": "de-fra-1", "api-endpoint": "https://api-de-fra-1.exoscale.com/v2"}
            ]}"#,
        )
        .unwrap();
        let zones = zones
            .zones
            .into_iter()
            .map(api::Zone::from)
            .collect::<Vec<_>>();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[1].name, "de-fra-1");
        assert_eq!(zones[1].endpoint, "https://api-de-fra-1.exoscale.com/v2");
    }

    #[test]
    fn decodes_cluster_nodepools() {
        let cluster: Cluster = serde_json::from_str(
            r#"{
                "id": "c-1",
                "name": "prod",
                "state": "running",
                "nodepools": [
                    {"id": "np-1", "name": "workers", "instance-pool": {"id": "ip-1"}},
                    {"id": "np-2", "name": "pending"},
                    {"id": "np-3", "instance-pool": {}}
                ]
            }"#,
        )
        .unwrap();
        let cluster = api::Cluster::from(cluster);
        assert_eq!(
            cluster.nodepools,
            vec![
                api::Nodepool {
                    name: Some("workers".to_string()),
                    instance_pool: Some("ip-1".to_string()),
                },
                api::Nodepool {
                    name: Some("pending".to_string()),
                    instance_pool: None,
                },
                api::Nodepool {
                    name: None,
                    instance_pool: None,
                },
            ]
        );
    }

    #[test]
    fn skips_malformed_instance_pool_references() {
        let cluster: Cluster = serde_json::from_str(
            r#"{
                "id": "c-1",
                "name": "prod",
                "nodepools": [
                    {"name": "odd", "instance-pool": "ip-0"},
                    {"name": "null", "instance-pool": null},
                    {"name": "workers", "instance-pool": {"id": "ip-1"}}
                ]
            }"#,
        )
        .unwrap();
        let pools = api::Cluster::from(cluster)
            .nodepools
            .into_iter()
            .map(|np| np.instance_pool)
            .collect::<Vec<_>>();
        assert_eq!(pools, vec![None, None, Some("ip-1".to_string())]);
    }

    #[test]
    fn decodes_instances() {
        let pool: InstancePool = serde_json::from_str(
            r#"{"id": "ip-1", "size": 2, "instances": [{"id": "i-1"}, {"id": "i-2"}, {}]}"#,
        )
        .unwrap();
        assert_eq!(
            api::InstancePool::from(pool).instances,
            vec![Some("i-1".to_string()), Some("i-2".to_string()), None]
        );

        let instance: Instance = serde_json::from_str(
            r#"{"id": "i-1", "name": "pool-abc-1", "public-ip": "203.0.113.5", "state": "running"}"#,
        )
        .unwrap();
        let instance = api::Instance::from(instance);
        assert_eq!(instance.public_ip.as_deref(), Some("203.0.113.5"));

        let private: Instance = serde_json::from_str(r#"{"id": "i-2"}"#).unwrap();
        assert_eq!(api::Instance::from(private).public_ip, None);
    }

    #[test]
    fn encodes_filter_updates() {
        let filter = vec!["198.51.100.0/24".to_string(), "203.0.113.5/32".to_string()];
        let body = serde_json::to_string(&IpFilterUpdate {
            ip_filter: &filter,
        })
        .unwrap();
        assert_eq!(body, r#"{"ip-filter":["198.51.100.0/24","203.0.113.5/32"]}"#);
    }
}
