use crate::{
    core::{cluster::ClusterDiagnostics, PolicyStore},
    Api,
};
use anyhow::Result;
use hyper_util::{rt::TokioIo, service::TowerToHyperService};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, debug_span, info, instrument, warn, Instrument};

/// Accepts HTTP/1 connections on `addr` until shutdown is signaled.
///
/// Connections that are in flight when shutdown begins are closed gracefully
/// before the drain handle is released.
#[instrument(skip_all, fields(port = %addr.port()))]
pub(crate) async fn serve<S, C>(addr: SocketAddr, api: Api<S, C>, drain: drain::Watch) -> Result<()>
where
    S: PolicyStore + 'static,
    C: ClusterDiagnostics + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "traffic block API server listening");

    let signaled = drain.clone().signaled();
    tokio::pin!(signaled);

    loop {
        let (io, client_addr) = tokio::select! {
            res = listener.accept() => match res {
                Ok(conn) => conn,
                Err(error) => {
                    warn!(%error, "Failed to accept connection");
                    continue;
                }
            },
            release = &mut signaled => {
                debug!("Shutdown signaled; no longer accepting connections");
                drop(release);
                return Ok(());
            }
        };

        let svc = TowerToHyperService::new(api.clone());
        let drain = drain.clone();
        tokio::spawn(
            async move {
                let conn = hyper::server::conn::http1::Builder::new()
                    .serve_connection(TokioIo::new(io), svc);
                tokio::pin!(conn);
                let res = tokio::select! {
                    res = &mut conn => res,
                    release = drain.signaled() => {
                        conn.as_mut().graceful_shutdown();
                        release.release_after(conn).await
                    }
                };
                if let Err(error) = res {
                    debug!(%error, "Connection closed with error");
                }
            }
            .instrument(debug_span!("conn", client.addr = %client_addr)),
        );
    }
}
