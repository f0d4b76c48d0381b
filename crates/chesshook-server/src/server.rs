use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chesshook_core::SharedSecret;
use chesshook_engine::EngineHandle;
use futures::StreamExt;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthGate, AuthPolicy};
use crate::broadcaster::Broadcaster;
use crate::error::ServerError;
use crate::lock::LockArbiter;
use crate::outbound::WsOutbound;
use crate::registry::SessionRegistry;
use crate::session::{Session, SharedState};

/// Largest inbound frame accepted from a client.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: String,
    pub auth: AuthPolicy,
    /// Origins allowed to open a WebSocket. Empty accepts any origin.
    pub allowed_origins: Vec<String>,
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "localhost:8080".into(),
            auth: AuthPolicy::default(),
            allowed_origins: vec!["https://www.chess.com".into()],
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,
    pub allowed_origins: Arc<[String]>,
    pub max_message_size: usize,
    pub public_addr: Arc<str>,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/", get(home_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind the listener, start the broadcaster, and serve.
///
/// `output` is the engine's broadcastable output; `engine` receives forwarded
/// client commands.
pub async fn start(
    config: ServerConfig,
    secret: SharedSecret,
    engine: EngineHandle,
    output: mpsc::UnboundedReceiver<String>,
) -> Result<ServerHandle, ServerError> {
    let registry = Arc::new(SessionRegistry::new());
    let shared = Arc::new(SharedState {
        auth: AuthGate::new(secret, config.auth),
        locks: LockArbiter::new(),
        registry: Arc::clone(&registry),
        engine,
    });

    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.addr.clone(),
            source,
        })?;
    let local_addr = listener.local_addr()?;

    let broadcaster = Broadcaster::new(registry).start(output);

    let app_state = AppState {
        shared,
        allowed_origins: config.allowed_origins.into(),
        max_message_size: config.max_message_size,
        public_addr: local_addr.to_string().into(),
    };
    let router = build_router(app_state);

    let server = tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    });

    tracing::info!(addr = %local_addr, "Server listening");

    Ok(ServerHandle {
        local_addr,
        server,
        broadcaster,
    })
}

/// Handle returned by `start()`. Keeps background tasks alive.
pub struct ServerHandle {
    local_addr: SocketAddr,
    server: tokio::task::JoinHandle<std::io::Result<()>>,
    broadcaster: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Resolve when the HTTP server stops.
    pub async fn wait(&mut self) -> Result<(), ServerError> {
        match (&mut self.server).await {
            Ok(result) => result.map_err(ServerError::from),
            Err(e) => Err(ServerError::Task(e.to_string())),
        }
    }

    /// Stop accepting connections and stop broadcasting engine output.
    pub fn abort(&self) {
        self.server.abort();
        self.broadcaster.abort();
    }
}

fn origin_allowed(allowed: &[String], origin: Option<&str>) -> bool {
    allowed.is_empty() || origin.is_some_and(|o| allowed.iter().any(|a| a == o))
}

/// WebSocket upgrade handler.
async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    if !origin_allowed(&state.allowed_origins, origin) {
        tracing::warn!(peer = %peer, origin = ?origin, "Rejected WebSocket origin");
        return (StatusCode::FORBIDDEN, "origin not allowed").into_response();
    }

    ws.max_message_size(state.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, peer, state))
}

/// Run one client connection to completion.
async fn handle_socket(socket: WebSocket, peer: SocketAddr, state: AppState) {
    let (sink, stream) = socket.split();
    let entry = state
        .shared
        .registry
        .register(peer, Arc::new(WsOutbound::new(sink)));
    let session_id = entry.id.clone();
    tracing::info!(session_id = %session_id, peer = %peer, "ws opened");

    Session::new(entry, Arc::clone(&state.shared)).run(stream).await;

    tracing::info!(session_id = %session_id, peer = %peer, "ws closed");
}

const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Chesshook intermediary</title>
</head>
<body>
<p>This server bridges a UCI chess engine to the Chesshook userscript over WebSocket.</p>
<p>Point the userscript's external engine URL at <code>ws://{addr}/ws</code>.</p>
</body>
</html>
"#;

async fn home_handler(State(state): State<AppState>) -> impl IntoResponse {
    Html(LANDING_PAGE.replace("{addr}", &state.public_addr))
}
