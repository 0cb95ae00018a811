//! Webhook gateway: receives platform callbacks and normalizes them.
//!
//! `GET /webhook` answers the subscription handshake, `POST /webhook`
//! translates events into the canonical model and acknowledges them. The
//! platform is picked by `CHATWIRE_PLATFORM` (defaults to `messenger`).

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chatwire_core::Platform;
use chatwire_translator::translate_inbound;
use chatwire_transport::verify_webhook;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
struct AppState {
    platform: Platform,
    verify_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let platform: Platform = std::env::var("CHATWIRE_PLATFORM")
        .unwrap_or_else(|_| "messenger".into())
        .parse()?;
    let state = Arc::new(AppState {
        platform,
        verify_token: std::env::var("CHATWIRE_VERIFY_TOKEN").ok(),
    });

    let bind = std::env::var("CHATWIRE_BIND").unwrap_or_else(|_| "0.0.0.0:8080".into());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    tracing::info!(%bind, platform = platform.as_str(), "gateway listening");

    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", get(verify).post(receive))
        .with_state(state)
}

async fn verify(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    match verify_webhook(state.verify_token.as_deref(), &params) {
        Some(challenge) => (StatusCode::OK, challenge).into_response(),
        None => {
            tracing::warn!("webhook verification rejected");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// Acknowledges every event with 200 so the platform does not retry;
/// translation problems are logged, not surfaced.
async fn receive(State(state): State<Arc<AppState>>, Json(payload): Json<Value>) -> Response {
    let message = translate_inbound(state.platform, &payload);
    tracing::info!(
        sender = message.sender.id.as_deref().unwrap_or("<unknown>"),
        has_text = message.text.is_some(),
        attachments = message.attachments.len(),
        "inbound event"
    );
    (StatusCode::OK, "EVENT_RECEIVED").into_response()
}
