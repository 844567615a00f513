use crate::{
    core::Engine,
    k8s::{KubeCluster, KubeStore},
    serve, Api,
};
use anyhow::{bail, Result};
use clap::Parser;
use std::net::SocketAddr;
use tracing::{info, info_span, Instrument};

#[derive(Debug, Parser)]
#[clap(
    name = "traffic-block",
    about = "Blocks traffic between workloads with NetworkPolicies"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "traffic_block=info,warn",
        env = "TRAFFIC_BLOCK_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// The address on which the traffic block HTTP API is served.
    #[clap(long, default_value = "0.0.0.0:8000", env = "TRAFFIC_BLOCK_HTTP_ADDR")]
    http_addr: SocketAddr,
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
            client,
            admin,
            http_addr,
        } = self;

        let runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_admin(admin.into_builder())
            .with_client(client)
            .build()
            .await?;

        let client = runtime.client();
        let engine = Engine::new(KubeStore::new(client.clone()));
        let api = Api::new(engine, KubeCluster::new(client));

        let drain = runtime.shutdown_handle();
        tokio::spawn(
            async move {
                if let Err(error) = serve::serve(http_addr, api, drain).await {
                    tracing::error!(%error, "HTTP API server failed");
                }
            }
            .instrument(info_span!("http")),
        );

        // Block the main thread on the shutdown signal. Once it fires, wait for
        // open connections to complete before exiting.
        info!("Running");
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}
