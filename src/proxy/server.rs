// src/proxy/server.rs

//! axum server: client script, live-reload socket, and a catch-all handler
//! that forwards to the upstream site.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use axum::body::{to_bytes, Body, Bytes};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Request, State};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{Settings, Upstream};
use crate::errors::{Result, ThemewatchError};
use crate::proxy::inject::{
    inject_client, is_html, is_rewritable, OriginRewriter, CLIENT_JS, CLIENT_SCRIPT_PATH,
    LIVERELOAD_PATH,
};
use crate::proxy::reload::{ReloadHub, ReloadMessage};

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub bind: SocketAddr,
    pub upstream: Upstream,
}

impl ProxyConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let ip: IpAddr = settings.proxy.bind.parse().map_err(|_| {
            ThemewatchError::ConfigError(format!("invalid proxy bind address {:?}", settings.proxy.bind))
        })?;
        Ok(Self {
            bind: SocketAddr::new(ip, settings.proxy.listen_port),
            upstream: settings.upstream.clone(),
        })
    }
}

#[derive(Clone)]
struct ProxyState {
    client: reqwest::Client,
    upstream: Upstream,
    rewriter: Arc<OriginRewriter>,
    hub: ReloadHub,
    local_addr: SocketAddr,
}

/// A running proxy. Dropping the handle does not stop the server.
#[derive(Debug)]
pub struct ProxyHandle {
    pub local_addr: SocketAddr,
    pub hub: ReloadHub,
    task: JoinHandle<()>,
}

impl ProxyHandle {
    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    pub fn reload(&self) -> usize {
        self.hub.reload()
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Bind and start serving in a background task.
pub async fn start_proxy(config: ProxyConfig) -> Result<ProxyHandle> {
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding dev proxy to {}", config.bind))?;
    let local_addr = listener.local_addr()?;

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("building upstream HTTP client")?;
    let rewriter = OriginRewriter::new(&config.upstream).context("compiling origin rewriter")?;

    let hub = ReloadHub::new();
    let state = ProxyState {
        client,
        upstream: config.upstream.clone(),
        rewriter: Arc::new(rewriter),
        hub: hub.clone(),
        local_addr,
    };

    let router = build_router(state);
    let task = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            error!(error = %err, "dev proxy server stopped");
        }
    });

    info!(
        listen = %local_addr,
        upstream = %config.upstream.origin(),
        "dev proxy listening"
    );

    Ok(ProxyHandle {
        local_addr,
        hub,
        task,
    })
}

fn build_router(state: ProxyState) -> Router {
    Router::new()
        .route(CLIENT_SCRIPT_PATH, get(client_script))
        .route(LIVERELOAD_PATH, get(livereload))
        .fallback(forward)
        .with_state(state)
}

async fn client_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        CLIENT_JS,
    )
}

async fn livereload(ws: WebSocketUpgrade, State(state): State<ProxyState>) -> impl IntoResponse {
    // Subscribe before the upgrade so a reload sent right after the handshake
    // is not lost.
    let rx = state.hub.subscribe();
    ws.on_upgrade(move |socket| serve_livereload(socket, rx))
}

async fn serve_livereload(mut socket: WebSocket, mut rx: broadcast::Receiver<ReloadMessage>) {
    debug!("live-reload client connected");
    loop {
        tokio::select! {
            msg = rx.recv() => {
                let msg = match msg {
                    Ok(msg) => msg,
                    Err(RecvError::Lagged(_)) => ReloadMessage::FullReload,
                    Err(RecvError::Closed) => break,
                };
                if socket.send(Message::Text(msg.as_str().into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
    debug!("live-reload client disconnected");
}

async fn forward(State(state): State<ProxyState>, req: Request) -> Response {
    let uri = req.uri().clone();
    match forward_inner(&state, req).await {
        Ok(response) => response,
        Err(err) => {
            warn!(uri = %uri, error = %format!("{err:#}"), "upstream request failed");
            (
                StatusCode::BAD_GATEWAY,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                format!(
                    "themewatch: could not reach upstream {}: {err:#}",
                    state.upstream.origin()
                ),
            )
                .into_response()
        }
    }
}

async fn forward_inner(state: &ProxyState, req: Request) -> anyhow::Result<Response> {
    let (parts, body) = req.into_parts();
    let proxy_authority = parts
        .headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| state.local_addr.to_string());

    let url = upstream_url(&state.upstream, &parts.uri);
    let body = to_bytes(body, usize::MAX)
        .await
        .context("reading request body")?;

    debug!(method = %parts.method, %url, "forwarding request");

    let upstream_resp = state
        .client
        .request(parts.method.clone(), &url)
        .headers(request_headers(&parts.headers))
        .body(body)
        .send()
        .await
        .with_context(|| format!("{} {url}", parts.method))?;

    let status = upstream_resp.status();
    let mut headers = response_headers(upstream_resp.headers());
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if let Some(location) = headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(|loc| state.rewriter.rewrite(loc, &proxy_authority))
    {
        if let Ok(value) = HeaderValue::from_str(&location) {
            headers.insert(header::LOCATION, value);
        }
    }

    let bytes = upstream_resp
        .bytes()
        .await
        .context("reading upstream response body")?;
    let bytes = rewrite_body(state, &content_type, &proxy_authority, bytes);

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

fn upstream_url(upstream: &Upstream, uri: &Uri) -> String {
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("{}{}", upstream.origin(), path)
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

fn request_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(incoming.len());
    for (name, value) in incoming {
        if is_hop_by_hop(name) || name == header::HOST || name == header::ACCEPT_ENCODING {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

fn response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        // The body may be rewritten; hyper sets the length.
        if is_hop_by_hop(name) || name == header::CONTENT_LENGTH {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

fn rewrite_body(state: &ProxyState, content_type: &str, proxy_authority: &str, bytes: Bytes) -> Bytes {
    if !is_rewritable(content_type) {
        return bytes;
    }
    let Ok(text) = std::str::from_utf8(&bytes) else {
        return bytes;
    };

    let mut text = state.rewriter.rewrite(text, proxy_authority);
    if is_html(content_type) {
        text = inject_client(&text);
    }
    Bytes::from(text)
}
