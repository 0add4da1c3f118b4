use crate::command::{self, CommandContext};
use anyhow::Result;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Response as HttpResponse, StatusCode},
    response::Response,
    routing::{get, post},
    Router,
};
use darshan_protocol::{CommandRequest, CommandResponse};
use serde_json::json;
use std::sync::Arc;

pub const AUTH_TOKEN_ENV: &str = "DARSHAN_AUTH_TOKEN";

/// Bearer token guarding the HTTP surface.
#[derive(Clone)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn parse(raw: Option<&str>) -> Result<Option<Self>> {
        match raw {
            None => Ok(None),
            Some(raw) => {
                let token = raw.trim();
                if token.is_empty() {
                    anyhow::bail!("Auth token must not be empty");
                }
                Ok(Some(Self(token.to_string())))
            }
        }
    }

    fn matches(&self, headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|presented| presented == self.0)
    }
}

struct HttpState {
    ctx: CommandContext,
    auth_token: Option<AuthToken>,
}

fn is_loopback_bind(bind: &str) -> bool {
    bind.starts_with("127.") || bind.starts_with("localhost:") || bind.starts_with("[::1]")
}

/// Serves the Command API over HTTP: `POST /command`, `GET /health`.
pub async fn serve(bind: &str, public: bool, auth_token: Option<String>) -> Result<()> {
    let auth_token_raw = auth_token.or_else(|| std::env::var(AUTH_TOKEN_ENV).ok());
    let auth_token = AuthToken::parse(auth_token_raw.as_deref())?;
    if public && auth_token.is_none() {
        anyhow::bail!("--public requires an auth token: set --auth-token or export {AUTH_TOKEN_ENV}");
    }
    if !public && !is_loopback_bind(bind) {
        anyhow::bail!("Non-loopback bind {bind} requires --public (and an auth token)");
    }

    let state = Arc::new(HttpState {
        ctx: CommandContext::from_env()?,
        auth_token,
    });
    let app = Router::new()
        .route("/command", post(http_command))
        .route("/health", get(http_health))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(bind).await?;
    let local_addr = listener.local_addr()?;
    log::info!("Serving Command API on http://{local_addr}/command");
    if state.auth_token.is_some() {
        log::info!("Auth enabled: send 'Authorization: Bearer <token>'");
    }

    axum::serve(listener, app).await?;
    Ok(())
}

fn unauthorized() -> Result<Response, StatusCode> {
    let response = CommandResponse::error(
        "unauthorized",
        "Missing or invalid Authorization header".to_string(),
        None,
    );
    build_response(StatusCode::UNAUTHORIZED, &response)
}

fn build_response<T: serde::Serialize>(
    status: StatusCode,
    value: &T,
) -> Result<Response, StatusCode> {
    let bytes = serde_json::to_vec(value).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    HttpResponse::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

async fn http_command(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Response, StatusCode> {
    if let Some(token) = &state.auth_token {
        if !token.matches(&headers) {
            return unauthorized();
        }
    }

    let request: CommandRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            let response = CommandResponse::error(
                "invalid_request",
                format!("Invalid JSON request: {err}"),
                None,
            );
            return build_response(StatusCode::BAD_REQUEST, &response);
        }
    };

    let response = command::execute(&state.ctx, request).await;
    build_response(StatusCode::OK, &response)
}

async fn http_health(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    if let Some(token) = &state.auth_token {
        if !token.matches(&headers) {
            return unauthorized();
        }
    }

    let report = json!({
        "status": "ok",
        "corpus_entries": state.ctx.composer.corpus().len(),
        "states": state.ctx.composer.states().len(),
        "narrative_connector": state.ctx.gateway.has_connector(),
    });
    build_response(StatusCode::OK, &report)
}
