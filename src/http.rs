//! HTTP front end.
//!
//! Routes:
//! - GET /_self - record of the container making the request
//! - GET /info/:container_id - record of a container by full or short id
//!
//! Every response carries `Cache-Control: no-cache`; the snapshot cache
//! is internal and intermediaries must not add a second one.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{debug, error, info};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::error::LookupError;
use crate::lookup::LookupService;

const NO_CACHE: [(header::HeaderName, &str); 1] = [(header::CACHE_CONTROL, "no-cache")];

pub fn router(lookup: Arc<LookupService>) -> Router {
    Router::new()
        .route("/_self", get(info_self))
        .route("/info/:container_id", get(info_container))
        .layer(cors())
        .with_state(lookup)
}

/// Serves until `shutdown` resolves.
pub async fn serve<F>(addr: SocketAddr, lookup: Arc<LookupService>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(
        listener,
        router(lookup).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;
    Ok(())
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}

async fn info_container(
    State(lookup): State<Arc<LookupService>>,
    Path(container_id): Path<String>,
) -> Result<Response, LookupError> {
    debug!("Getting info for containerId={}", container_id);
    let record = lookup.by_key(&container_id).await?;
    Ok((NO_CACHE, Json(record)).into_response())
}

async fn info_self(
    State(lookup): State<Arc<LookupService>>,
    remote: Option<ConnectInfo<SocketAddr>>,
) -> Result<Response, LookupError> {
    let ConnectInfo(remote) = remote.ok_or_else(|| {
        LookupError::AddressUnresolvable("connection has no remote address".into())
    })?;
    debug!("Request source IP={}", remote.ip());

    let record = lookup.by_address(remote.ip()).await?;
    Ok((NO_CACHE, Json(record)).into_response())
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            LookupError::ProviderUnavailable(e) => {
                error!("Containers info could not be loaded: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Containers info could not be loaded".to_string(),
                )
            }
            LookupError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Couldn't get info for container {}", id),
            ),
            LookupError::AddressNotFound(ip) => (
                StatusCode::NOT_FOUND,
                format!("Couldn't find info for container with IP {}", ip),
            ),
            LookupError::AddressUnresolvable(reason) => {
                debug!("Error getting remote IP: {}", reason);
                (
                    StatusCode::BAD_REQUEST,
                    "Couldn't determine caller IP from request".to_string(),
                )
            }
        };
        (status, NO_CACHE, Json(json!({ "message": message }))).into_response()
    }
}
