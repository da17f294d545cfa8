//! Relay server: axum HTTP router over TCP.
//!
//! The relay holds the shared upstream keys so browsers and CLIs without a
//! key of their own can still chat. It exposes the chat route, a CORS
//! preflight on the same path, and a health check.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Json;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{Extensions, HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use toolshelf_config::AppConfig;

use super::models::RelayModel;
use super::rate_limit::{InMemoryRateLimitStore, RateLimitConfig, RateLimitStore};
use super::types::*;
use crate::chat::relay_system_prompt;
use crate::llm::{ChatRequest, LlmProvider, Message, OpenRouterProvider, UpstreamError};
use crate::secrets::SecretValue;

/// Provider name of the shared, rate-limited gateway.
pub const GATEWAY_PROVIDER: &str = "gateway";

/// Provider name of the shared OpenRouter key.
pub const OPENROUTER_PROVIDER: &str = "openrouter";

const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// Errors from running the relay.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("failed to bind relay on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("relay server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Why a chat request failed. Rendered as `{error}` with CORS headers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("{0}")]
    InvalidBody(String),

    #[error("{0}")]
    MissingKey(&'static str),

    #[error("Trial limit reached ({max} per {window}). Add your own API key in settings to continue.")]
    TrialLimit { max: usize, window: String },

    #[error("Rate limit exceeded. Please try again later.")]
    UpstreamRateLimited,

    #[error("Payment required. Please add credits to your workspace.")]
    UpstreamPaymentRequired,

    #[error("Chat provider error: {0}")]
    UpstreamStatus(u16),

    #[error("{0}")]
    Transport(String),
}

impl RouteError {
    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::TrialLimit { .. } | RouteError::UpstreamRateLimited => {
                StatusCode::TOO_MANY_REQUESTS
            }
            RouteError::UpstreamPaymentRequired => StatusCode::PAYMENT_REQUIRED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<UpstreamError> for RouteError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status { status: 429, .. } => RouteError::UpstreamRateLimited,
            UpstreamError::Status { status: 402, .. } => RouteError::UpstreamPaymentRequired,
            UpstreamError::Status { status, .. } => RouteError::UpstreamStatus(status),
            UpstreamError::Network(reason) | UpstreamError::Parse(reason) => {
                RouteError::Transport(reason)
            }
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let body = RelayErrorBody {
            error: self.to_string(),
        };
        with_cors(self.status(), Json(body))
    }
}

/// Shared state accessible to all relay route handlers.
pub struct RelayState {
    pub openrouter: Option<Arc<dyn LlmProvider>>,
    pub gateway: Option<Arc<dyn LlmProvider>>,
    /// Upstream model always used through the gateway.
    pub gateway_model: String,
    pub rate_limits: Arc<dyn RateLimitStore>,
    pub rate_limit: RateLimitConfig,
}

impl RelayState {
    /// State with no providers and an in-memory rate limiter.
    pub fn new(rate_limit: RateLimitConfig, gateway_model: impl Into<String>) -> Self {
        Self {
            openrouter: None,
            gateway: None,
            gateway_model: gateway_model.into(),
            rate_limits: Arc::new(InMemoryRateLimitStore::new(rate_limit)),
            rate_limit,
        }
    }

    pub fn with_openrouter(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.openrouter = Some(provider);
        self
    }

    pub fn with_gateway(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.gateway = Some(provider);
        self
    }

    pub fn with_rate_limits(mut self, store: Arc<dyn RateLimitStore>) -> Self {
        self.rate_limits = store;
        self
    }

    /// State built from config, with shared keys read from the environment.
    pub fn from_config(config: &AppConfig) -> Self {
        let relay = &config.relay;
        let mut state = Self::new(RateLimitConfig::from(relay), &relay.gateway_model);

        match SecretValue::from_env(&relay.openrouter_key_env) {
            Some(key) => {
                state = state.with_openrouter(Arc::new(OpenRouterProvider::from_config(
                    key,
                    &config.upstream,
                )));
            }
            None => warn!(var = %relay.openrouter_key_env, "Shared OpenRouter key not set"),
        }
        match SecretValue::from_env(&relay.gateway_key_env) {
            Some(key) => {
                state = state.with_gateway(Arc::new(
                    OpenRouterProvider::new(key, &relay.gateway_url).with_name(GATEWAY_PROVIDER),
                ));
            }
            None => warn!(var = %relay.gateway_key_env, "Shared gateway key not set"),
        }
        state
    }
}

/// Build the axum router with the chat route at `chat_route`.
pub fn router(state: Arc<RelayState>, chat_route: &str) -> axum::Router {
    axum::Router::new()
        .route(chat_route, post(handle_chat).options(handle_preflight))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Run the relay on `addr:port` until `shutdown` resolves.
///
/// A background task prunes idle callers from the rate-limit store once per
/// window.
pub async fn serve(
    config: &AppConfig,
    state: Arc<RelayState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), RelayError> {
    let addr = format!("{}:{}", config.relay.listen_addr, config.relay.listen_port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| RelayError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(%addr, route = %config.relay.route, "Relay listening");

    let pruner = {
        let store = state.rate_limits.clone();
        let period = state.rate_limit.window.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                store.prune(Instant::now());
            }
        })
    };

    let app = router(state, &config.relay.route);
    let result = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Relay shutting down");
        })
        .await;
    pruner.abort();
    result?;
    Ok(())
}

/// Caller identity for rate limiting: first `x-forwarded-for` entry, then
/// `x-real-ip`, then the peer address of the connection, then `"unknown"`.
pub fn caller_key(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    match forwarded.or(real_ip) {
        Some(ip) => ip.to_string(),
        None => peer.map_or_else(|| "unknown".to_string(), |ip| ip.to_string()),
    }
}

/// Trial window as shown to users: whole minutes when it divides evenly.
fn window_label(window: Duration) -> String {
    let secs = window.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else {
        format!("{secs} s")
    }
}

fn with_cors(status: StatusCode, body: impl IntoResponse) -> Response {
    let mut response = (status, body).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    response
}

// ── Route handlers ──────────────────────────────────────────────────────

async fn handle_preflight() -> Response {
    with_cors(StatusCode::NO_CONTENT, ())
}

async fn handle_health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok".to_string(),
        version: crate::build_info::VERSION.to_string(),
        git_hash: crate::build_info::GIT_HASH.to_string(),
    })
}

async fn handle_chat(
    State(state): State<Arc<RelayState>>,
    extensions: Extensions,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Present when served with connect info; absent under `oneshot`.
    let peer = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    match chat(&state, &headers, peer, &body).await {
        Ok(reply) => with_cors(StatusCode::OK, Json(reply)),
        Err(err) => {
            warn!(status = err.status().as_u16(), error = %err, "Relay chat failed");
            err.into_response()
        }
    }
}

async fn chat(
    state: &RelayState,
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    body: &[u8],
) -> Result<RelayReply, RouteError> {
    let req: RelayRequest =
        serde_json::from_slice(body).map_err(|e| RouteError::InvalidBody(e.to_string()))?;

    let use_gateway = req.provider.as_deref() == Some(GATEWAY_PROVIDER);
    let selected = RelayModel::select(&req.message, req.model_preference.as_deref());
    debug!(model = selected.upstream_id(), gateway = use_gateway, "Selected model");

    let provider = if use_gateway {
        state
            .gateway
            .clone()
            .ok_or(RouteError::MissingKey("Gateway API key is not configured"))?
    } else {
        state.openrouter.clone().ok_or(RouteError::MissingKey(
            "OpenRouter API key is missing. Please add it in the relay settings or use your own API key.",
        ))?
    };

    if use_gateway {
        let caller = caller_key(headers, peer);
        let now = Instant::now();
        if !state.rate_limits.try_acquire(&caller, now) {
            info!(%caller, "Trial limit reached");
            return Err(RouteError::TrialLimit {
                max: state.rate_limit.max_requests,
                window: window_label(state.rate_limit.window),
            });
        }
        debug!(%caller, remaining = state.rate_limits.remaining(&caller, now), "Trial request accepted");
    }

    let system = req
        .system_prompt
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| relay_system_prompt(&req.tools_context));
    let model = if use_gateway {
        state.gateway_model.clone()
    } else {
        selected.upstream_id().to_string()
    };
    let request = ChatRequest {
        model,
        system: Some(system),
        messages: vec![Message::user(req.message)],
        ..Default::default()
    };

    let response = provider.chat(&request).await?;
    Ok(RelayReply {
        reply: response.content,
        model: if use_gateway {
            GATEWAY_PROVIDER.to_string()
        } else {
            selected.upstream_id().to_string()
        },
        available_models: RelayModel::available_keys(),
    })
}
