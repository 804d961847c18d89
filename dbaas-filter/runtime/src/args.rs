use crate::{
    api::{Credentials, HttpApi, DEFAULT_DISCOVERY_URL},
    config::{self, parse_duration, ClusterRefs, ServiceRefs, StaticAddresses},
    core::{Config, Reconciler},
};
use anyhow::Result;
use clap::Parser;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

#[derive(Parser)]
#[clap(
    name = "dbaas-filter",
    about = "Keeps Exoscale DBaaS IP filters in sync with SKS cluster nodes"
)]
pub struct Args {
    #[clap(long, default_value = "exo_dbaas_filter=info,warn", env = "LOG_LEVEL")]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain", env = "LOG_FORMAT")]
    log_format: kubert::LogFormat,

    #[clap(long, env = "EXOSCALE_API_KEY", hide_env_values = true)]
    api_key: String,

    #[clap(long, env = "EXOSCALE_API_SECRET", hide_env_values = true)]
    api_secret: String,

    /// SKS clusters whose node addresses are allowed, as `name:zone,...`.
    #[clap(long, default_value = "", env = "SKS_CLUSTERS")]
    clusters: ClusterRefs,

    /// DBaaS services to update, as `name:zone:kind,...`.
    #[clap(long, default_value = "", env = "DBAAS_SERVICES")]
    services: ServiceRefs,

    /// Addresses or CIDRs that are always allowed.
    #[clap(long, default_value = "", env = "STATIC_IPS")]
    static_addresses: StaticAddresses,

    /// How often cluster membership is checked. A bare number is seconds.
    #[clap(long, default_value = "10s", env = "CHECK_INTERVAL", value_parser = parse_duration)]
    interval: Duration,

    #[clap(long, default_value = "30s", env = "REQUEST_TIMEOUT", value_parser = parse_duration)]
    request_timeout: Duration,

    /// The API endpoint used to discover zone endpoints.
    #[clap(long, default_value = DEFAULT_DISCOVERY_URL, env = "EXOSCALE_API_URL")]
    discovery_url: String,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            api_key,
            api_secret,
            clusters,
            services,
            static_addresses,
            interval,
            request_timeout,
            discovery_url,
        } = self;

        log_format.try_init(log_level)?;

        config::validate(
            &api_key,
            &api_secret,
            &clusters,
            &services,
            &static_addresses,
            interval,
            request_timeout,
        )?;

        let ClusterRefs(clusters) = clusters;
        let ServiceRefs(services) = services;
        let StaticAddresses(static_addresses) = static_addresses;

        for service in services.iter().filter(|s| !s.kind.is_known()) {
            warn!(service = %service, "Unrecognized service kind; using it as the API category");
        }

        info!(
            clusters = clusters.len(),
            services = services.len(),
            static_addresses = static_addresses.len(),
            ?interval,
            "Starting"
        );

        let api = HttpApi::new(
            Credentials::new(api_key, api_secret),
            discovery_url,
            request_timeout,
        )?;
        let reconciler = Reconciler::new(
            Arc::new(api),
            Config {
                clusters,
                services,
                static_addresses,
                request_timeout,
            },
        );

        let (shutdown, watch) = kubert::shutdown::sigint_or_sigterm()?;
        // The loop only polls the watch between cycles, so shutdown waits for
        // a running cycle to finish.
        let task = tokio::spawn(reconciler.run(interval, async move {
            drop(watch.signaled().await);
        }));

        if shutdown.signaled().await.is_err() {
            warn!("Aborted");
            return Ok(());
        }
        task.await?;
        Ok(())
    }
}
