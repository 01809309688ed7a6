//! HTTP server implementation
//!
//! hyper http1 with a match-based router; one task per connection.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::AUTHORIZATION;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{HeaderMap, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::analysis::AnalysisOrchestrator;
use crate::auth::{extract_bearer_token, AuthUser, JwtVerifier};
use crate::config::Args;
use crate::feed::FeedService;
use crate::routes;
use crate::routes::rate_limit::RateLimiter;
use crate::routes::{error_response, error_to_response, preflight_response};
use crate::search::SearchService;
use crate::types::{AtriumError, Result};

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub verifier: JwtVerifier,
    pub feed: Arc<FeedService>,
    pub search: Arc<SearchService>,
    /// Absent when no AI credential is configured (dev mode only)
    pub orchestrator: Option<Arc<AnalysisOrchestrator>>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn orchestrator(&self) -> Result<&Arc<AnalysisOrchestrator>> {
        self.orchestrator
            .as_ref()
            .ok_or_else(|| AtriumError::Config("AI analysis is not configured".into()))
    }
}

pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Atrium listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - authentication disabled");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!(%method, %path, %addr, "request");

    let response = match (method, path.as_str()) {
        (Method::OPTIONS, _) => preflight_response(),

        (Method::GET, "/health") => routes::health::health(),
        (Method::GET, "/version") => routes::health::version(),

        (Method::POST, p) if p.starts_with("/api/") => {
            let user = match authenticate(&state.verifier, state.args.dev_mode, req.headers()) {
                Ok(user) => user,
                Err(e) => return Ok(error_to_response(&e)),
            };

            let body = req.into_body().collect().await?.to_bytes();

            let result = match p {
                "/api/discover/feed" => {
                    routes::feed::discover_feed(&state, user.as_ref(), body).await
                }
                "/api/search/posts" => routes::search::search_posts(&state, body).await,
                "/api/search/users" => routes::search::search_users(&state, body).await,
                "/api/test/analyze" => routes::analysis::submit_job(&state, body).await,
                "/api/ai/analyze" => match &user {
                    Some(user) => routes::analysis::analyze_text(&state, user, body).await,
                    None => Err(AtriumError::Auth("Authentication required".into())),
                },
                _ => Ok(error_response(StatusCode::NOT_FOUND, "Not found")),
            };

            match result {
                Ok(response) => response,
                Err(e) => {
                    warn!(%path, error = %e, "request failed");
                    error_to_response(&e)
                }
            }
        }

        _ => error_response(StatusCode::NOT_FOUND, "Not found"),
    };

    Ok(response)
}

/// Resolve the requester from the Authorization header. Dev mode allows
/// anonymous requests; a present-but-invalid token is rejected in every
/// mode.
fn authenticate(
    verifier: &JwtVerifier,
    dev_mode: bool,
    headers: &HeaderMap,
) -> Result<Option<AuthUser>> {
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) => {
            let token = extract_bearer_token(value)
                .ok_or_else(|| AtriumError::Auth("Malformed authorization header".into()))?;
            Ok(Some(verifier.verify(token)?))
        }
        None if dev_mode => Ok(None),
        None => Err(AtriumError::Auth("Missing bearer token".into())),
    }
}
