//! The gather → diff → apply loop.

use crate::{
    AddressSet, Api, ClusterRef, EndpointResolver, Gather, ServiceRef, TargetUpdater,
    TopologyClient,
};
use futures::{future, prelude::*};
use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};
use tokio::time;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// What the reconciler manages.
#[derive(Clone, Debug)]
pub struct Config {
    pub clusters: Vec<ClusterRef>,
    pub services: Vec<ServiceRef>,
    pub static_addresses: AddressSet,

    /// Bounds every individual API call.
    pub request_timeout: Duration,
}

/// The last address set pushed to the managed services.
///
/// Only held in memory; a restarted process applies its first non-empty set
/// unconditionally.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileState {
    last_applied: AddressSet,
}

/// The outcome of a single reconcile cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cycle {
    /// No addresses were found, so nothing was applied.
    Empty,

    /// The gathered set matches the last applied set.
    Unchanged,

    /// The gathered set was pushed to every service; `failed` of them
    /// rejected it or couldn't be reached.
    Applied { targets: usize, failed: usize },
}

#[derive(Debug)]
pub struct Reconciler<A: ?Sized> {
    topology: TopologyClient<A>,
    updater: TargetUpdater<A>,
    clusters: Vec<ClusterRef>,
    services: Vec<ServiceRef>,
    static_addresses: AddressSet,
    state: ReconcileState,
}

// === impl ReconcileState ===

impl ReconcileState {
    pub fn last_applied(&self) -> &AddressSet {
        &self.last_applied
    }
}

// === impl Reconciler ===

impl<A: Api + ?Sized> Reconciler<A> {
    pub fn new(api: Arc<A>, config: Config) -> Self {
        Self::with_state(api, config, ReconcileState::default())
    }

    pub fn with_state(api: Arc<A>, config: Config, state: ReconcileState) -> Self {
        let Config {
            clusters,
            services,
            static_addresses,
            request_timeout,
        } = config;

        let endpoints = Arc::new(EndpointResolver::new(request_timeout));
        Self {
            topology: TopologyClient::new(api.clone(), endpoints.clone(), request_timeout),
            updater: TargetUpdater::new(api, endpoints, request_timeout),
            clusters,
            services,
            static_addresses,
            state,
        }
    }

    pub fn state(&self) -> &ReconcileState {
        &self.state
    }

    /// Runs a cycle on every tick of `interval` until `shutdown` completes.
    ///
    /// Shutdown is only observed between cycles; a running cycle always
    /// completes.
    pub async fn run(mut self, interval: Duration, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);

        let mut ticks = time::interval(interval);
        ticks.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutting down");
                    return;
                }
                _ = ticks.tick() => {}
            }

            match AssertUnwindSafe(self.reconcile()).catch_unwind().await {
                Ok(cycle) => debug!(?cycle, "Reconciled"),
                Err(_) => error!("Reconcile cycle panicked"),
            }
        }
    }

    /// Runs one gather → diff → apply cycle.
    pub async fn reconcile(&mut self) -> Cycle {
        info!("Checking for address changes");
        let current = self.gather().await;

        if current.is_empty() {
            error!("No addresses found; skipping update");
            return Cycle::Empty;
        }

        if current == self.state.last_applied {
            info!("No address changes detected");
            return Cycle::Unchanged;
        }

        info!(addresses = %current, "Address change detected");
        let failed = self.apply(&current).await;

        // The set is recorded even if some services failed. They are only
        // retried once the gathered set changes again.
        self.state.last_applied = current;
        info!(targets = self.services.len(), failed, "Update complete");
        Cycle::Applied {
            targets: self.services.len(),
            failed,
        }
    }

    /// Unions the addresses of every cluster with the static addresses.
    async fn gather(&self) -> AddressSet {
        let gathers = self.clusters.iter().map(|cluster| {
            self.topology
                .gather(cluster)
                .instrument(info_span!("cluster", name = %cluster.name, zone = %cluster.zone))
        });

        let mut addresses = AddressSet::new();
        for (cluster, gather) in self.clusters.iter().zip(future::join_all(gathers).await) {
            match &gather {
                Gather::Complete(found) => {
                    info!(cluster = %cluster.name, addresses = found.len(), "Gathered cluster");
                }
                Gather::Partial {
                    addresses: found,
                    failures,
                } => {
                    warn!(
                        cluster = %cluster.name,
                        addresses = found.len(),
                        failures,
                        "Gathered cluster partially"
                    );
                }
                Gather::Failed(error) => {
                    warn!(cluster = %cluster.name, %error, "Cluster contributed no addresses");
                }
            }
            addresses.extend(gather.into_addresses());
        }

        if !self.static_addresses.is_empty() {
            info!(
                addresses = self.static_addresses.len(),
                "Adding static addresses"
            );
            addresses.extend(self.static_addresses.iter());
        }

        addresses
    }

    /// Pushes `addresses` to every service, returning the number of failures.
    async fn apply(&self, addresses: &AddressSet) -> usize {
        let applies = self.services.iter().map(|service| {
            let span = info_span!(
                "service",
                name = %service.name,
                zone = %service.zone,
                kind = %service.kind,
            );
            async move {
                info!("Updating address filter");
                match self.updater.apply(service, addresses).await {
                    Ok(()) => {
                        info!("Updated address filter");
                        true
                    }
                    Err(error) => {
                        error!(%error, "Failed to update address filter");
                        false
                    }
                }
            }
            .instrument(span)
        });

        future::join_all(applies)
            .await
            .into_iter()
            .filter(|ok| !ok)
            .count()
    }
}
