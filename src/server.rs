//! HTTP server implementation using hyper.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::header::{HeaderMap, HeaderValue};
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto;
use tokio::net::TcpListener;
use tokio::sync::{Semaphore, oneshot};
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, warn};

use crate::ai::Assistant;
use crate::auth;
use crate::config::{Config, SharedConfig};
use crate::db;
use crate::rate_limit::RateLimiter;
use crate::response::{self, HttpResponse};
use crate::router::{Context, Handler, RouteMatch, RouterHandle};

/// Maximum request body size in bytes (1 MB).
const MAX_BODY_SIZE: usize = 1_048_576;

/// Maximum number of concurrent connections.
const MAX_CONNECTIONS: usize = 128;

/// Timeout for reading request headers (slowloris protection).
const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// How often idle rate-limit buckets are swept.
const RATE_LIMIT_SWEEP: Duration = Duration::from_secs(60);

const REQUEST_ID: &str = "X-Request-Id";
const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Authorization, Content-Type, X-Request-Id";

/// Shared server state.
pub struct State {
    pub config: SharedConfig,
    pub db: Option<db::Handle>,
    pub router: Arc<RouterHandle>,
    assistant: Assistant,
    limiter: Option<RateLimiter>,
}

/// Handle to a running server instance.
pub struct Server {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<crate::Result<()>>,
}

impl Server {
    /// The address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shut down the accept loop and wait for it to finish.
    pub async fn shutdown(self) -> crate::Result<()> {
        let _ = self.shutdown_tx.send(());
        self.task.await.unwrap_or(Ok(()))
    }
}

/// The origin to echo back, if the allowlist admits it.
fn allowed_origin<'a>(config: &Config, origin: Option<&'a str>) -> Option<&'a str> {
    let origin = origin?;
    config
        .server
        .cors_origins
        .iter()
        .any(|allowed| allowed == "*" || allowed == origin)
        .then_some(origin)
}

/// Reuse the caller's request id when it is a UUID, otherwise mint one.
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| uuid::Uuid::parse_str(v).ok())
        .unwrap_or_else(uuid::Uuid::new_v4)
        .to_string()
}

/// Add security, CORS and tracing headers to a response.
fn add_standard_headers(
    response: &mut HttpResponse,
    config: &Config,
    origin: Option<&str>,
    request_id: &str,
) {
    let headers = response.headers_mut();
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    if config.server.hsts {
        headers.insert(
            "Strict-Transport-Security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }
    if let Some(origin) = allowed_origin(config, origin)
        && let Ok(value) = HeaderValue::from_str(origin)
    {
        headers.insert("Access-Control-Allow-Origin", value);
        headers.insert("Vary", HeaderValue::from_static("Origin"));
    }
    if let Ok(value) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID, value);
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(hyper::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

fn preflight() -> HttpResponse {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Methods", ALLOW_METHODS)
        .header("Access-Control-Allow-Headers", ALLOW_HEADERS)
        .header("Access-Control-Max-Age", "600")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Handle an incoming HTTP request.
async fn handle_request(
    req: Request<Incoming>,
    remote_addr: SocketAddr,
    state: Arc<State>,
) -> Result<HttpResponse, std::convert::Infallible> {
    let (parts, body) = req.into_parts();

    let origin = parts
        .headers
        .get("origin")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let request_id = request_id(&parts.headers);
    let span = tracing::info_span!(
        "request",
        id = %request_id,
        method = %parts.method,
        path = %parts.uri.path(),
    );

    async move {
        let started = Instant::now();
        let mut response = dispatch(parts, body, remote_addr, &state).await;
        add_standard_headers(
            &mut response,
            &state.config,
            origin.as_deref(),
            &request_id,
        );
        info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Handled request"
        );
        Ok(response)
    }
    .instrument(span)
    .await
}

async fn dispatch(
    parts: hyper::http::request::Parts,
    body: Incoming,
    remote_addr: SocketAddr,
    state: &State,
) -> HttpResponse {
    if parts.method == Method::OPTIONS {
        return preflight();
    }

    if let Some(limiter) = &state.limiter
        && let Err(e) = limiter.check(remote_addr.ip())
    {
        warn!(client = %remote_addr.ip(), "Rate limit exceeded");
        return e.into_response();
    }

    // Reject oversized bodies early via Content-Length header
    if let Some(len) = parts
        .headers
        .get(hyper::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        && len > MAX_BODY_SIZE
    {
        return response::error(StatusCode::PAYLOAD_TOO_LARGE, "Payload too large");
    }

    // Read body with size limit (fallback for chunked encoding)
    let body = match BodyExt::collect(Limited::new(body, MAX_BODY_SIZE)).await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => return response::error(StatusCode::PAYLOAD_TOO_LARGE, "Payload too large"),
    };

    let writes = matches!(parts.method, Method::POST | Method::PUT | Method::PATCH);
    if writes && !body.is_empty() && !is_json(&parts.headers) {
        return crate::Error::UnsupportedMediaType {
            expected: "application/json".into(),
        }
        .into_response();
    }

    let path = parts.uri.path().to_string();
    match state.router.match_route(&parts.method, &path) {
        RouteMatch::Matched { handler, params } => {
            let identity = auth::resolve_identity(&parts.headers, &state.config.auth);
            let ctx = Context {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
                params,
                body,
                identity,
                db: state.db.clone(),
                assistant: state.assistant.clone(),
                config: Arc::clone(&state.config),
            };

            run_handler(handler, ctx).await
        }
        RouteMatch::MethodNotAllowed => {
            response::error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
        }
        RouteMatch::NotFound => response::error(StatusCode::NOT_FOUND, "Not found"),
    }
}

/// Run a handler on its own task so a panic becomes a 500. The task keeps
/// the request span.
async fn run_handler(handler: &Handler, ctx: Context) -> HttpResponse {
    match tokio::spawn(handler(ctx).in_current_span()).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => e.into_response(),
        Err(e) => {
            error!("Handler panicked: {e}");
            response::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// Bind, start accepting connections, and return a handle.
///
/// The returned [`Server`] exposes the bound address and a
/// [`shutdown`](Server::shutdown) method for graceful termination.
pub async fn start(
    config: Config,
    db: Option<db::Handle>,
    router: Arc<RouterHandle>,
) -> crate::Result<Server> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;

    let limiter = config.server.rate_limit.map(RateLimiter::new);
    let assistant = Assistant::from_config(&config.ai)?;
    let state = Arc::new(State {
        config: Arc::new(config),
        db,
        router,
        assistant,
        limiter,
    });

    info!("Server listening on http://{}", addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let semaphore = Arc::new(Semaphore::new(MAX_CONNECTIONS));

    let task = tokio::spawn(async move {
        tokio::pin!(shutdown_rx);
        let mut sweep = tokio::time::interval(RATE_LIMIT_SWEEP);

        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, remote_addr) = result?;
                    let io = TokioIo::new(stream);

                    match semaphore.clone().try_acquire_owned() {
                        Ok(permit) => {
                            let state = Arc::clone(&state);
                            tokio::spawn(async move {
                                let service = service_fn(move |req| {
                                    let state = Arc::clone(&state);
                                    handle_request(req, remote_addr, state)
                                });

                                let mut builder = auto::Builder::new(TokioExecutor::new());
                                builder.http1()
                                    .timer(TokioTimer::new())
                                    .header_read_timeout(HEADER_READ_TIMEOUT);

                                if let Err(e) = builder.serve_connection(io, service).await {
                                    error!("Error serving connection from {}: {}", remote_addr, e);
                                }

                                drop(permit);
                            });
                        }
                        Err(_) => {
                            warn!("Connection limit reached, rejecting {}", remote_addr);
                            tokio::spawn(async move {
                                let service = service_fn(|_req: Request<Incoming>| async {
                                    Ok::<_, std::convert::Infallible>(response::error(
                                        StatusCode::SERVICE_UNAVAILABLE,
                                        "Service unavailable",
                                    ))
                                });

                                let mut builder = auto::Builder::new(TokioExecutor::new());
                                builder.http1()
                                    .timer(TokioTimer::new())
                                    .header_read_timeout(HEADER_READ_TIMEOUT);

                                let _ = builder.serve_connection(io, service).await;
                            });
                        }
                    }
                }
                _ = sweep.tick() => {
                    if let Some(limiter) = &state.limiter {
                        limiter.cleanup();
                    }
                }
                _ = &mut shutdown_rx => {
                    break;
                }
            }
        }

        Ok(())
    });

    Ok(Server {
        addr,
        shutdown_tx,
        task,
    })
}

/// Run the HTTP server until `shutdown` resolves.
pub async fn run(
    config: Config,
    db: Option<db::Handle>,
    router: Arc<RouterHandle>,
    shutdown: impl std::future::Future<Output = ()>,
) -> crate::Result<()> {
    let server = start(config, db, router).await?;
    shutdown.await;
    info!("Shutting down");
    server.shutdown().await
}
