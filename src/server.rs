//! HTTP and WebSocket front end
//!
//! One listener serves everything: WebSocket upgrades become relay
//! connections, `/` serves the broadcaster page, `/ip` and `/view` support
//! the browser apps, and every other path is a static file.

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        Request, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use serde::Serialize;
use tokio::{net::TcpListener, sync::mpsc, sync::watch, task::JoinHandle};
use tower::ServiceExt;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ServerError;
use crate::model::{
    client::{Client, ClientId},
    event::RelayEvent,
};
use crate::relay::{Relay, RelayHandle};
use crate::util::{select_host_address, viewer_urls};

const VIEW_PAGE: &str = include_str!("view.html");
const INDEX_PAGE: &str = include_str!("index.html");

/// How long a closing connection may take to finish the close handshake.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared state handed to every request handler.
#[derive(Clone)]
struct AppState {
    relay: RelayHandle,
    port: u16,
    assets: ServeDir,
}

/// Body of the `/ip` endpoint.
#[derive(Debug, Serialize)]
struct HostInfo {
    ip: String,
    port: u16,
}

/// A bound, not yet running, relay server.
pub struct Server {
    listener: TcpListener,
    addr: SocketAddr,
    router: Router,
    relay: RelayHandle,
    _relay_task: JoinHandle<()>,
}

impl Server {
    /// Bind the listen port and start the relay loop.
    pub async fn bind(config: Config) -> Result<Server, ServerError> {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

        let (relay, relay_task) = Relay::spawn();

        let state = AppState {
            relay: relay.clone(),
            port: addr.port(),
            assets: ServeDir::new(&config.static_dir),
        };

        Ok(Server {
            listener,
            addr,
            router: build_router(state),
            relay,
            _relay_task: relay_task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Live count of registered relay connections.
    pub fn connections(&self) -> watch::Receiver<usize> {
        self.relay.connections()
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("📡 Camera relay listening on {}", self.addr);
        for url in viewer_urls(self.addr.port()) {
            info!("➡ Viewer URL: {}", url);
        }

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ServerError::Serve)?;

        info!("Server stopped");
        Ok(())
    }
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ws", get(ws_handler))
        .route("/ip", get(host_info))
        .route("/view", get(view_page))
        .fallback(static_asset)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// The browser apps connect to `ws://host:port`, so `/` carries both the
/// WebSocket upgrade and the broadcaster page. A built app in the static
/// directory wins over the embedded page.
async fn root(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<AppState>,
    request: Request,
) -> Response {
    if let Ok(ws) = ws {
        return upgrade(ws, state.relay);
    }

    let response = serve_asset(&state.assets, request).await;
    if response.status() == StatusCode::NOT_FOUND {
        return Html(INDEX_PAGE).into_response();
    }
    response
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    upgrade(ws, state.relay)
}

async fn static_asset(State(state): State<AppState>, request: Request) -> Response {
    serve_asset(&state.assets, request).await
}

async fn serve_asset(assets: &ServeDir, request: Request) -> Response {
    match assets.clone().oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

async fn host_info(State(state): State<AppState>) -> Json<HostInfo> {
    let ip = select_host_address()
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    Json(HostInfo {
        ip,
        port: state.port,
    })
}

async fn view_page() -> Html<&'static str> {
    Html(VIEW_PAGE)
}

fn upgrade(ws: WebSocketUpgrade, relay: RelayHandle) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}

/// Drive one relay connection from handshake to close.
///
/// The socket is split: the writer drains the client's outbound queue and the
/// reader turns inbound messages into relay events. When either half ends the
/// other is stopped and the client is unregistered.
async fn handle_socket(socket: WebSocket, relay: RelayHandle) {
    let (client, outbound) = Client::new();
    let id = client.id;

    if relay.send(RelayEvent::Connected(client)).is_err() {
        warn!(client_id = %id, "Relay is gone, refusing connection");
        return;
    }
    info!(client_id = %id, "WebSocket client connected");

    let (ws_tx, ws_rx) = socket.split();
    let mut writer = tokio::spawn(write_frames(ws_tx, outbound, id));
    let mut reader = tokio::spawn(read_frames(ws_rx, id, relay.clone()));

    tokio::select! {
        _ = &mut writer => {
            // Let a reader that just saw a Close frame flush the reply.
            let _ = tokio::time::timeout(CLOSE_TIMEOUT, &mut reader).await;
            reader.abort();
        }
        _ = &mut reader => writer.abort(),
    }

    let _ = relay.send(RelayEvent::Closed(id));
    info!(client_id = %id, "WebSocket client disconnected");
}

async fn write_frames(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Bytes>,
    id: ClientId,
) {
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = ws_tx.send(Message::Binary(frame)).await {
            debug!(client_id = %id, "Send failed: {}", e);
            return;
        }
    }

    let _ = ws_tx.close().await;
}

async fn read_frames(mut ws_rx: SplitStream<WebSocket>, id: ClientId, relay: RelayHandle) {
    while let Some(msg) = ws_rx.next().await {
        let frame = match msg {
            Ok(Message::Binary(data)) => data,
            Ok(Message::Text(text)) => Bytes::copy_from_slice(text.as_str().as_bytes()),
            Ok(Message::Close(_)) => {
                finish_close(&mut ws_rx).await;
                return;
            }
            // Pings are answered by the transport.
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Err(e) => {
                debug!(client_id = %id, "Read failed: {}", e);
                return;
            }
        };

        if relay.send(RelayEvent::Frame(id, frame)).is_err() {
            return;
        }
    }
}

/// Keep polling after a Close frame. The transport writes its Close reply
/// on the next read and then ends the stream.
async fn finish_close(ws_rx: &mut SplitStream<WebSocket>) {
    let drain = async { while let Some(Ok(_)) = ws_rx.next().await {} };
    let _ = tokio::time::timeout(CLOSE_TIMEOUT, drain).await;
}
