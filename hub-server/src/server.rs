//! HTTP server exposing a [`Hub`] over warp.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr, TcpListener};

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use warp::http::{HeaderMap, StatusCode};
use warp::path::FullPath;
use warp::{Filter, Rejection, Reply};
use websub_hub::{Hub, HubAdaptor, HubRequest, HubResponse};

use crate::config::ServerConfig;
use crate::error::ServerError;

/// HTTP front end for a WebSub hub.
///
/// The `HubServer` binds to the first free port in the configured range and
/// answers `POST /<path>` by handing the request to [`Hub::handle`]. All
/// protocol decisions are made by the hub; this type only moves bytes.
///
/// # Example
///
/// ```no_run
/// use hub_server::{HubServer, ServerConfig};
/// use websub_hub::{Hub, HubAdaptor, HubConfig};
///
/// # async fn run<A: HubAdaptor>(adaptor: A) -> Result<(), Box<dyn std::error::Error>> {
/// let hub = Hub::new(HubConfig::new("http://127.0.0.1:9090/hub"), adaptor)?;
/// let server = HubServer::new(ServerConfig::default(), hub).await?;
///
/// println!("Hub listening at: {}", server.endpoint_url());
///
/// server.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct HubServer {
    /// The port the server is bound to
    port: u16,
    /// `http://<ip>:<port>`
    base_url: String,
    /// Full URL of the hub endpoint
    endpoint_url: String,
    /// Shutdown signal sender
    shutdown_tx: Option<mpsc::Sender<()>>,
    /// Server task handle
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl HubServer {
    /// Start serving `hub`.
    ///
    /// Validates `config`, picks a port, starts the warp server and waits
    /// until it is accepting connections.
    pub async fn new<A: HubAdaptor>(config: ServerConfig, hub: Hub<A>) -> Result<Self, ServerError> {
        config.validate()?;

        let (start, end) = config.port_range;
        let port = find_available_port(config.bind_ip, start, end)
            .ok_or(ServerError::NoAvailablePort { start, end })?;

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let (ready_tx, ready_rx) = oneshot::channel();

        let route_path = config.route_path();
        let server_handle = start_server(
            SocketAddr::new(config.bind_ip, port),
            route_path.clone(),
            hub,
            shutdown_rx,
            ready_tx,
        );

        let addr = ready_rx
            .await
            .map_err(|_| ServerError::Startup("server task exited before binding".to_string()))?
            .map_err(ServerError::Startup)?;

        let base_url = format!("http://{addr}");
        let endpoint_url = format!("{base_url}{route_path}");
        info!(%endpoint_url, "Hub server listening");

        Ok(Self {
            port: addr.port(),
            base_url,
            endpoint_url,
            shutdown_tx: Some(shutdown_tx),
            server_handle: Some(server_handle),
        })
    }

    /// Base URL of the server, e.g. `http://127.0.0.1:9090`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL publishers and subscribers should POST to.
    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stop accepting requests and wait for in-flight ones to finish.
    ///
    /// Verification tasks already spawned by the hub are not awaited.
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }

        if let Some(handle) = self.server_handle.take() {
            handle.await?;
        }

        info!(port = self.port, "Hub server stopped");
        Ok(())
    }
}

/// Find an available port in the given range.
fn find_available_port(ip: IpAddr, start: u16, end: u16) -> Option<u16> {
    (start..=end).find(|&port| is_port_available(ip, port))
}

/// Check if a port is available for binding.
fn is_port_available(ip: IpAddr, port: u16) -> bool {
    TcpListener::bind(SocketAddr::new(ip, port)).is_ok()
}

/// Convert a hub response into a warp reply, keeping status, headers and body.
fn into_reply(response: HubResponse) -> warp::reply::Response {
    let (status, headers, body) = response.into_parts();
    let mut reply = warp::reply::Response::new(body.into());
    *reply.status_mut() = status;
    *reply.headers_mut() = headers;
    reply
}

/// The hub endpoint: `POST <route_path>`.
fn hub_route<A: HubAdaptor>(
    route_path: String,
    hub: Hub<A>,
) -> impl Filter<Extract = (warp::reply::Response,), Error = Rejection> + Clone {
    let path = warp::path::full()
        .and_then(move |full: FullPath| {
            let matches = full.as_str().trim_end_matches('/') == route_path;
            async move {
                if matches {
                    Ok(())
                } else {
                    Err(warp::reject::not_found())
                }
            }
        })
        .untuple_one();

    let query = warp::query::raw()
        .map(Some)
        .or(warp::any().map(|| None))
        .unify();

    path.and(warp::post())
        .and(query)
        .and(warp::header::headers_cloned())
        .and(warp::body::bytes())
        .and_then(
            move |query: Option<String>, headers: HeaderMap, body: Bytes| {
                let hub = hub.clone();
                async move {
                    debug!(
                        content_type = ?headers.get(warp::http::header::CONTENT_TYPE),
                        body_len = body.len(),
                        "Incoming hub request"
                    );
                    let response = hub.handle(HubRequest::new(headers, query, body)).await;
                    Ok::<_, Rejection>(into_reply(response))
                }
            },
        )
}

/// Start the HTTP server on `addr`.
///
/// `ready_tx` receives the bound address, or the bind error.
fn start_server<A: HubAdaptor>(
    addr: SocketAddr,
    route_path: String,
    hub: Hub<A>,
    mut shutdown_rx: mpsc::Receiver<()>,
    ready_tx: oneshot::Sender<Result<SocketAddr, String>>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let routes = hub_route(route_path, hub).recover(handle_rejection);

        let bound = warp::serve(routes).try_bind_with_graceful_shutdown(addr, async move {
            shutdown_rx.recv().await;
        });

        match bound {
            Ok((addr, server)) => {
                let _ = ready_tx.send(Ok(addr));
                server.await;
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e.to_string()));
            }
        }
    })
}

/// Handle rejections and convert them to HTTP responses.
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else {
        debug!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };

    Ok(warp::reply::with_status(message, code))
}
