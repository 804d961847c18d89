#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! An [`Api`] implementation backed by the Exoscale v2 REST API.

mod sign;
mod wire;

pub use self::sign::{Credentials, InvalidKey};
use exo_dbaas_filter_core::{
    api::{Cluster, ClusterSummary, Instance, InstancePool, TargetConfig, Zone},
    Api, Error,
};
use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Method, StatusCode, Url,
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace};

/// The endpoint used to discover zones.
pub const DEFAULT_DISCOVERY_URL: &str = "https://api-ch-gva-2.exoscale.com/v2";

#[derive(Clone, Debug)]
pub struct HttpApi {
    http: reqwest::Client,
    credentials: Credentials,
    discovery: String,
    timeout: Duration,
}

impl HttpApi {
    pub fn new(
        credentials: Credentials,
        discovery: impl ToString,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("exo-dbaas-filter/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            credentials,
            discovery: discovery.to_string(),
            timeout,
        })
    }

    /// Appends escaped path segments to an endpoint.
    fn url(endpoint: &str, segments: &[&str]) -> Result<Url, Error> {
        let mut url = Url::parse(endpoint)
            .map_err(|error| anyhow::anyhow!("invalid endpoint {endpoint:?}: {error}"))?;
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("invalid endpoint {endpoint:?}: cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let rsp = self.send(Method::GET, url, Vec::new()).await?;
        rsp.json().await.map_err(|e| self.transport(e))
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Vec<u8>,
    ) -> Result<reqwest::Response, Error> {
        let query = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let expires = chrono::Utc::now().timestamp() + sign::VALIDITY.as_secs() as i64;
        let authorization = self
            .credentials
            .authorization(
                &sign::Request {
                    method: method.as_str(),
                    path: url.path(),
                    body: &body,
                    query,
                },
                expires,
            )
            .map_err(anyhow::Error::from)?;

        trace!(%method, %url, "Sending request");
        let mut req = self
            .http
            .request(method, url.clone())
            .header(AUTHORIZATION, authorization);
        if !body.is_empty() {
            req = req.header(CONTENT_TYPE, "application/json").body(body);
        }
        let rsp = req.send().await.map_err(|e| self.transport(e))?;

        let status = rsp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url.path().to_string()));
        }
        if !status.is_success() {
            let message = rsp.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(rsp)
    }

    fn transport(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Timeout(self.timeout)
        } else {
            Error::Transport(error.into())
        }
    }
}

#[async_trait::async_trait]
impl Api for HttpApi {
    async fn list_zones(&self) -> Result<Vec<Zone>, Error> {
        let url = Self::url(&self.discovery, &["zone"])?;
        let list = self.get::<wire::ZoneList>(url).await?;
        Ok(list.zones.into_iter().map(Into::into).collect())
    }

    async fn list_clusters(&self, zone: &Zone) -> Result<Vec<ClusterSummary>, Error> {
        let url = Self::url(&zone.endpoint, &["sks-cluster"])?;
        let list = self.get::<wire::ClusterList>(url).await?;
        Ok(list.sks_clusters.into_iter().map(Into::into).collect())
    }

    async fn get_cluster(&self, id: &str, zone: &Zone) -> Result<Cluster, Error> {
        let url = Self::url(&zone.endpoint, &["sks-cluster", id])?;
        self.get::<wire::Cluster>(url).await.map(Into::into)
    }

    async fn get_instance_pool(&self, id: &str, zone: &Zone) -> Result<InstancePool, Error> {
        let url = Self::url(&zone.endpoint, &["instance-pool", id])?;
        self.get::<wire::InstancePool>(url).await.map(Into::into)
    }

    async fn get_instance(&self, id: &str, zone: &Zone) -> Result<Instance, Error> {
        let url = Self::url(&zone.endpoint, &["instance", id])?;
        self.get::<wire::Instance>(url).await.map(Into::into)
    }

    async fn get_target_config(
        &self,
        category: &str,
        name: &str,
        zone: &Zone,
    ) -> Result<TargetConfig, Error> {
        let url = Self::url(&zone.endpoint, &[format!("dbaas-{category}").as_str(), name])?;
        self.get::<wire::Service>(url).await.map(Into::into)
    }

    async fn put_target_config(
        &self,
        category: &str,
        name: &str,
        zone: &Zone,
        filter: &[String],
    ) -> Result<(), Error> {
        let url = Self::url(&zone.endpoint, &[format!("dbaas-{category}").as_str(), name])?;
        let body = serde_json::to_vec(&wire::IpFilterUpdate { ip_filter: filter })
            .map_err(anyhow::Error::from)?;
        let rsp = self.send(Method::PUT, url, body).await?;
        debug!(status = %rsp.status(), "Submitted address filter");
        Ok(())
    }
}

#[cfg(test)]
mod tests;
