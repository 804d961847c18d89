use crate::{error::bounded, Api, AddressSet, EndpointResolver, Error, ServiceRef};
use std::{sync::Arc, time::Duration};
use tracing::debug;

/// Replaces the address filter of managed services.
#[derive(Debug)]
pub struct TargetUpdater<A: ?Sized> {
    api: Arc<A>,
    endpoints: Arc<EndpointResolver>,
    timeout: Duration,
}

impl<A: Api + ?Sized> TargetUpdater<A> {
    pub fn new(api: Arc<A>, endpoints: Arc<EndpointResolver>, timeout: Duration) -> Self {
        Self {
            api,
            endpoints,
            timeout,
        }
    }

    /// Sets `service`'s address filter to exactly `addresses`.
    ///
    /// The service is read first; if it can't be read, no update is sent.
    pub async fn apply(&self, service: &ServiceRef, addresses: &AddressSet) -> Result<(), Error> {
        let category = service.kind.category();
        let zone = self.endpoints.resolve(&*self.api, &service.zone).await;

        let current = bounded(
            self.timeout,
            self.api.get_target_config(category, &service.name, &zone),
        )
        .await?;
        debug!(%category, previous = ?current.ip_filter, "Replacing address filter");

        let filter = addresses.to_filter();
        bounded(
            self.timeout,
            self.api
                .put_target_config(category, &service.name, &zone, &filter),
        )
        .await
    }
}
