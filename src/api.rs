//! HTTP surface.
//!
//! Endpoints:
//! - `POST /send-message` — send a WhatsApp message
//! - `GET  /send-message` — 204 keep-alive alias
//! - `GET  /qr`           — pairing QR as an HTML-embedded PNG
//! - `GET  /logs`         — in-memory event log, auto-reloading
//! - `GET  /health`       — status + human-readable uptime

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use warelay_channels::whatsapp::{generate_qr_image, JID_SUFFIX};
use warelay_core::message::OutgoingMessage;
use warelay_core::state::BridgeState;
use warelay_core::traits::Channel;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    channel: Arc<dyn Channel>,
    state: BridgeState,
    started: Instant,
}

impl ApiState {
    pub fn new(channel: Arc<dyn Channel>, state: BridgeState) -> Self {
        Self {
            channel,
            state,
            started: Instant::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendMessageBody {
    #[serde(default)]
    number: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Append the JID domain suffix unless the input already carries one.
fn normalize_recipient(number: &str) -> String {
    if number.ends_with(JID_SUFFIX) {
        number.to_string()
    } else {
        format!("{number}{JID_SUFFIX}")
    }
}

/// `POST /send-message` — send a message through the session client.
async fn send_message(
    State(api): State<ApiState>,
    Json(body): Json<SendMessageBody>,
) -> (StatusCode, Json<Value>) {
    let (number, message) = match (
        body.number.as_deref().filter(|n| !n.trim().is_empty()),
        body.message.as_deref().filter(|m| !m.trim().is_empty()),
    ) {
        (Some(number), Some(message)) => (number, message),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Both number and message are required."})),
            );
        }
    };

    let chat_id = normalize_recipient(number);
    let outgoing = OutgoingMessage {
        text: message.to_string(),
        reply_target: Some(chat_id.clone()),
    };

    match api.channel.send(outgoing).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"success": true, "message": "Message sent successfully."})),
        ),
        Err(e) => {
            error!("send to {chat_id} failed: {e}");
            api.state.append_log(format!("send error: {e}")).await;
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "error": e.to_string()})),
            )
        }
    }
}

/// `GET /send-message` — keep-alive alias, no content.
async fn send_message_probe() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// `GET /qr` — the pending pairing QR rendered as a PNG inside an HTML page.
async fn qr_page(State(api): State<ApiState>) -> Result<Html<String>, (StatusCode, Json<Value>)> {
    let code = api.state.current_challenge().await.ok_or((
        StatusCode::NOT_FOUND,
        Json(json!({"error": "QR code not available yet."})),
    ))?;

    let png = generate_qr_image(&code).map_err(|e| {
        error!("QR rendering failed: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("QR rendering failed: {e}")})),
        )
    })?;

    let encoded = BASE64.encode(&png);
    Ok(Html(format!(
        "<!DOCTYPE html>\n\
         <html>\n<head><title>warelay — pair</title></head>\n\
         <body style=\"font-family: sans-serif; text-align: center;\">\n\
         <h1>Scan to pair</h1>\n\
         <img alt=\"pairing QR code\" src=\"data:image/png;base64,{encoded}\">\n\
         <p>Open WhatsApp &gt; Linked devices and scan the code.</p>\n\
         </body>\n</html>"
    )))
}

/// `GET /logs` — the event log, oldest first, reloading every 5 seconds.
async fn logs_page(State(api): State<ApiState>) -> Html<String> {
    let entries = api.state.recent_logs().await;
    let rendered = if entries.is_empty() {
        "(no events yet)".to_string()
    } else {
        entries
            .iter()
            .map(|e| escape_html(e))
            .collect::<Vec<_>>()
            .join("\n")
    };

    Html(format!(
        "<!DOCTYPE html>\n\
         <html>\n<head>\n\
         <title>warelay — logs</title>\n\
         <meta http-equiv=\"refresh\" content=\"5\">\n\
         </head>\n\
         <body style=\"font-family: monospace;\">\n\
         <h1>Event log</h1>\n\
         <pre>{rendered}</pre>\n\
         </body>\n</html>"
    ))
}

/// `GET /health` — always 200 with a human-readable uptime.
async fn health(State(api): State<ApiState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptime": format_uptime(api.started.elapsed().as_secs()),
    }))
}

/// Format seconds as a composition of months, days, hours, and minutes.
fn format_uptime(secs: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;
    const MONTH: u64 = 30 * DAY;

    let months = secs / MONTH;
    let days = (secs % MONTH) / DAY;
    let hours = (secs % DAY) / HOUR;
    let minutes = (secs % HOUR) / MINUTE;

    let mut parts = Vec::new();
    for (value, unit) in [
        (months, "month"),
        (days, "day"),
        (hours, "hour"),
        (minutes, "minute"),
    ] {
        if value > 0 {
            let s = if value == 1 { "" } else { "s" };
            parts.push(format!("{value} {unit}{s}"));
        }
    }

    if parts.is_empty() {
        "0 minutes".to_string()
    } else {
        parts.join(", ")
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Build the axum router with shared state.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/send-message", post(send_message).get(send_message_probe))
        .route("/qr", get(qr_page))
        .route("/logs", get(logs_page))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind and serve the API. Spawned from `main`.
pub async fn serve(host: String, port: u16, state: ApiState) {
    let app = build_router(state);
    let addr = format!("{host}:{port}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("API server failed to bind to {addr}: {e}");
            return;
        }
    };

    info!("API server listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        error!("API server error: {e}");
    }
}
