use crate::{
    api::{Api, Zone},
    error::bounded,
};
use ahash::AHashMap as HashMap;
use parking_lot::RwLock;
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Resolves zone names to regional API endpoints.
///
/// The first miss lists every zone and caches all of them. Entries are never
/// evicted for the lifetime of the resolver.
#[derive(Debug)]
pub struct EndpointResolver {
    cache: RwLock<HashMap<String, String>>,

    // Serializes discovery so that concurrent misses issue a single listing.
    refresh: Mutex<()>,

    // Bumped after every listing attempt, successful or not.
    generation: AtomicU64,

    timeout: Duration,
}

impl EndpointResolver {
    pub fn new(timeout: Duration) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            refresh: Mutex::new(()),
            generation: AtomicU64::new(0),
            timeout,
        }
    }

    /// The endpoint used for a zone that discovery doesn't know about.
    pub fn fallback(zone: &str) -> Zone {
        Zone {
            name: zone.to_string(),
            endpoint: format!("https://api-{zone}.exoscale.com/v2"),
        }
    }

    pub async fn resolve<A>(&self, api: &A, zone: &str) -> Zone
    where
        A: Api + ?Sized,
    {
        let seen = self.generation.load(Ordering::Acquire);
        if let Some(zone) = self.cached(zone) {
            return zone;
        }

        let _refresh = self.refresh.lock().await;
        // If another caller listed zones while we waited, its outcome stands,
        // whether or not it found this zone.
        if self.generation.load(Ordering::Acquire) == seen {
            match bounded(self.timeout, api.list_zones()).await {
                Ok(zones) => {
                    debug!(zones = zones.len(), "Discovered zones");
                    let mut cache = self.cache.write();
                    for Zone { name, endpoint } in zones {
                        cache.insert(name, endpoint);
                    }
                }
                Err(error) => warn!(%zone, %error, "Failed to list zones"),
            }
            self.generation.fetch_add(1, Ordering::AcqRel);
        }

        self.cached(zone).unwrap_or_else(|| {
            let fallback = Self::fallback(zone);
            debug!(%zone, endpoint = %fallback.endpoint, "Using fallback endpoint");
            fallback
        })
    }

    fn cached(&self, zone: &str) -> Option<Zone> {
        self.cache.read().get(zone).map(|endpoint| Zone {
            name: zone.to_string(),
            endpoint: endpoint.clone(),
        })
    }
}
