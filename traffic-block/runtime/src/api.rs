use crate::core::{
    cluster::{self, ClusterDiagnostics},
    BlockEdge, BlockRequest, Engine, Error as EngineError, Labels, PolicyStore, WorkloadSelector,
};
use bytes::{Buf, Bytes};
use futures::future;
use http_body_util::BodyExt;
use hyper::{http, Request, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fmt::Write, sync::Arc};
use thiserror::Error;
use tracing::{debug, info, trace, warn};


/// Serves the traffic block HTTP API.
pub struct Api<S, C> {
    engine: Arc<Engine<S>>,
    cluster: Arc<C>,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read request body: {0}")]
    Request(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to encode json response: {0}")]
    Json(#[from] serde_json::Error),
}

/// The request body accepted by `/block-traffic` and `/unblock-traffic`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BlockBody {
    pub from_ns: String,
    pub from_labels: Labels,
    pub to_ns: String,
    pub to_labels: Labels,
}

type Body = http_body_util::Full<Bytes>;

const CONNECTED: &str = "connected to K8s API Server";

// === impl Api ===

impl<S, C> Api<S, C> {
    pub fn new(engine: Engine<S>, cluster: C) -> Self {
        Self {
            engine: Arc::new(engine),
            cluster: Arc::new(cluster),
        }
    }
}

impl<S, C> Clone for Api<S, C> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            cluster: self.cluster.clone(),
        }
    }
}

impl<S, C, B> tower::Service<Request<B>> for Api<S, C>
where
    S: PolicyStore + 'static,
    C: ClusterDiagnostics + 'static,
    B: hyper::body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Response = Response<Body>;
    type Error = Error;
    type Future = future::BoxFuture<'static, Result<Response<Body>, Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        trace!(method = %req.method(), uri = %req.uri());
        let api = self.clone();
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        Box::pin(async move {
            match (method, path.as_str()) {
                (http::Method::POST, "/block-traffic") => {
                    let req = match read_json::<BlockBody, _>(req).await? {
                        Ok(body) => BlockRequest::from(body),
                        Err(error) => return bad_request(error),
                    };
                    api.block(req).await
                }
                (http::Method::POST, "/unblock-traffic") => {
                    let req = match read_json::<BlockBody, _>(req).await? {
                        Ok(body) => BlockRequest::from(body),
                        Err(error) => return bad_request(error),
                    };
                    api.unblock(req).await
                }
                (http::Method::GET, "/list-blocks") => api.list_blocks().await,
                (http::Method::GET, "/visualize-blocks") => api.visualize_blocks().await,
                (http::Method::GET, "/status") => api.status().await,
                (http::Method::GET, "/deployment-health") => api.deployment_health().await,
                _ => Ok(not_found()),
            }
        })
    }
}

impl<S, C> Api<S, C>
where
    S: PolicyStore,
    C: ClusterDiagnostics,
{
    async fn block(&self, req: BlockRequest) -> Result<Response<Body>, Error> {
        debug!(?req, "Blocking traffic");
        match self.engine.block(&req).await {
            Ok(ack) => {
                for (direction, applied) in ack.iter() {
                    debug!(%direction, ns = %applied.rule.namespace, name = %applied.rule.name, outcome = ?applied.outcome);
                }
                json_response(
                    http::StatusCode::OK,
                    &serde_json::json!({ "status": "policy_created" }),
                )
            }
            Err(error) => engine_error(error),
        }
    }

    async fn unblock(&self, req: BlockRequest) -> Result<Response<Body>, Error> {
        debug!(?req, "Unblocking traffic");
        match self.engine.unblock(&req).await {
            Ok(outcomes) => json_response(http::StatusCode::OK, &outcomes),
            Err(error) => engine_error(error),
        }
    }

    async fn list_blocks(&self) -> Result<Response<Body>, Error> {
        match self.engine.list_blocks().await {
            Ok(blocks) => json_response(
                http::StatusCode::OK,
                &serde_json::json!({ "blocks": blocks }),
            ),
            Err(error) => engine_error(error),
        }
    }

    async fn visualize_blocks(&self) -> Result<Response<Body>, Error> {
        match self.engine.list_block_edges().await {
            Ok(edges) => Ok(Response::builder()
                .status(http::StatusCode::OK)
                .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(Body::from(mermaid(&edges)))
                .expect("graph response must be valid")),
            Err(error) => engine_error(error),
        }
    }

    async fn status(&self) -> Result<Response<Body>, Error> {
        match self.cluster.server_version().await {
            Ok(version) => json_response(
                http::StatusCode::OK,
                &serde_json::json!({ CONNECTED: true, "kubernetes_version": version }),
            ),
            Err(error) => {
                warn!(%error, "Failed to reach the API server");
                json_response(
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    &serde_json::json!({ CONNECTED: false, "error": error.to_string() }),
                )
            }
        }
    }

    async fn deployment_health(&self) -> Result<Response<Body>, Error> {
        match self.cluster.deployments().await {
            Ok(deployments) => {
                let unhealthy = cluster::unhealthy_deployments(deployments);
                if !unhealthy.is_empty() {
                    info!(count = unhealthy.len(), "Found unhealthy deployments");
                }
                json_response(
                    http::StatusCode::OK,
                    &serde_json::json!({ "unhealthy_deployments": unhealthy }),
                )
            }
            Err(error) => {
                warn!(%error, "Failed to list deployments");
                json_response(
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    &serde_json::json!({ "error": error.to_string() }),
                )
            }
        }
    }
}

// === impl BlockBody ===

impl From<BlockBody> for BlockRequest {
    fn from(body: BlockBody) -> Self {
        let BlockBody {
            from_ns,
            from_labels,
            to_ns,
            to_labels,
        } = body;
        BlockRequest::new(
            WorkloadSelector {
                namespace: from_ns,
                labels: from_labels,
            },
            WorkloadSelector {
                namespace: to_ns,
                labels: to_labels,
            },
        )
    }
}

/// Renders block edges as a Mermaid flowchart, one line per edge.
fn mermaid(edges: &[BlockEdge]) -> String {
    let mut graph = String::from("graph LR\n");
    for edge in edges {
        let _ = writeln!(graph, "    {edge}");
    }
    graph
}

async fn read_json<T, B>(req: Request<B>) -> Result<Result<T, serde_json::Error>, Error>
where
    T: DeserializeOwned,
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let bytes = req
        .into_body()
        .collect()
        .await
        .map_err(|e| Error::Request(e.into()))?
        .to_bytes();
    Ok(serde_json::from_reader(bytes.reader()))
}

fn engine_error(error: EngineError) -> Result<Response<Body>, Error> {
    match &error {
        EngineError::InvalidRequest(_) => bad_request(&error),
        EngineError::Create {
            direction, rule, ..
        } => {
            warn!(%error, "Failed to block traffic");
            json_response(
                http::StatusCode::INTERNAL_SERVER_ERROR,
                &serde_json::json!({
                    "error": error.to_string(),
                    "direction": direction,
                    "rule": rule,
                }),
            )
        }
        EngineError::List(_) => {
            warn!(%error, "Failed to list blocks");
            json_response(
                http::StatusCode::INTERNAL_SERVER_ERROR,
                &serde_json::json!({ "error": error.to_string() }),
            )
        }
    }
}

fn bad_request(error: impl std::fmt::Display) -> Result<Response<Body>, Error> {
    info!(%error, "Rejected request");
    json_response(
        http::StatusCode::BAD_REQUEST,
        &serde_json::json!({ "error": error.to_string() }),
    )
}

fn not_found() -> Response<Body> {
    Response::builder()
        .status(http::StatusCode::NOT_FOUND)
        .body(Body::default())
        .expect("not found response must be valid")
}

fn json_response(status: http::StatusCode, body: &impl Serialize) -> Result<Response<Body>, Error> {
    let bytes = serde_json::to_vec(body)?;
    Ok(Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(bytes))
        .expect("json response must be valid"))
}
