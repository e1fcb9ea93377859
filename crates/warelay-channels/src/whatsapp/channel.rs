//! Channel implementation: the poll loop and outbound sends.

use super::events::{EventsResponse, SendRequest};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use warelay_core::config::WhatsAppConfig;
use warelay_core::error::RelayError;
use warelay_core::message::OutgoingMessage;
use warelay_core::traits::{Channel, ChannelEvent};

/// Domain suffix of a personal WhatsApp JID.
pub const JID_SUFFIX: &str = "@s.whatsapp.net";

/// WhatsApp channel backed by a bridge sidecar.
pub struct WhatsAppChannel {
    bridge_url: String,
    poll_interval_ms: u64,
    http: reqwest::Client,
    /// Sequence cursor of the last event we consumed.
    cursor: Arc<AtomicU64>,
    stopped: Arc<AtomicBool>,
}

impl WhatsAppChannel {
    pub fn new(config: &WhatsAppConfig) -> Self {
        Self {
            bridge_url: config.bridge_url.trim_end_matches('/').to_string(),
            poll_interval_ms: config.poll_interval_ms,
            http: reqwest::Client::new(),
            cursor: Arc::new(AtomicU64::new(0)),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Fetch events after the given cursor. A transport error is returned
    /// to the caller; a non-2xx status is treated as "no events" so a
    /// bridge restart doesn't kill the poll loop.
    async fn poll_events(
        http: &reqwest::Client,
        bridge_url: &str,
        after: u64,
    ) -> Result<EventsResponse, RelayError> {
        let url = format!("{bridge_url}/events?after={after}");
        let resp = http
            .get(&url)
            .send()
            .await
            .map_err(|e| RelayError::Channel(format!("bridge poll failed: {e}")))?;

        if !resp.status().is_success() {
            debug!("bridge returned {} for event poll", resp.status());
            return Ok(EventsResponse { events: Vec::new() });
        }

        resp.json()
            .await
            .map_err(|e| RelayError::Channel(format!("bridge event decode failed: {e}")))
    }

    /// The poll loop body, spawned by `start()`.
    async fn run_poll_loop(
        http: reqwest::Client,
        bridge_url: String,
        poll_interval_ms: u64,
        cursor: Arc<AtomicU64>,
        stopped: Arc<AtomicBool>,
        tx: mpsc::Sender<ChannelEvent>,
    ) {
        loop {
            if stopped.load(Ordering::Relaxed) {
                info!("whatsapp poll loop stopping");
                break;
            }

            let after = cursor.load(Ordering::Relaxed);
            match Self::poll_events(&http, &bridge_url, after).await {
                Ok(resp) => {
                    for envelope in resp.events {
                        cursor.store(envelope.seq, Ordering::Relaxed);
                        let event = envelope.event.into_channel_event("whatsapp");
                        if tx.send(event).await.is_err() {
                            info!("whatsapp event receiver dropped, stopping poll loop");
                            return;
                        }
                    }
                }
                Err(e) => {
                    warn!("whatsapp poll error: {e}");
                }
            }

            tokio::time::sleep(std::time::Duration::from_millis(poll_interval_ms)).await;
        }
    }
}

#[async_trait]
impl Channel for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn start(&self) -> Result<mpsc::Receiver<ChannelEvent>, RelayError> {
        let (tx, rx) = mpsc::channel(64);

        // Probe the bridge so a bad URL is visible at startup. Not fatal:
        // the bridge may simply not be up yet.
        match self.http.get(format!("{}/status", self.bridge_url)).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("whatsapp bridge reachable at {}", self.bridge_url);
            }
            _ => {
                warn!(
                    "whatsapp bridge not reachable at {}, polling anyway",
                    self.bridge_url
                );
            }
        }

        tokio::spawn(Self::run_poll_loop(
            self.http.clone(),
            self.bridge_url.clone(),
            self.poll_interval_ms,
            self.cursor.clone(),
            self.stopped.clone(),
            tx,
        ));

        info!("whatsapp channel started");
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), RelayError> {
        let target = message
            .reply_target
            .as_deref()
            .ok_or_else(|| RelayError::Channel("no reply_target on outgoing message".into()))?;

        let url = format!("{}/send", self.bridge_url);
        let body = SendRequest {
            to: target,
            body: &message.text,
        };

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Channel(format!("whatsapp send failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(RelayError::Channel(format!(
                "whatsapp send rejected ({status}): {detail}"
            )));
        }

        debug!("whatsapp message sent to {target}");
        Ok(())
    }

    async fn stop(&self) -> Result<(), RelayError> {
        self.stopped.store(true, Ordering::Relaxed);
        info!("whatsapp channel stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_url_trailing_slash_is_trimmed() {
        let channel = WhatsAppChannel::new(&WhatsAppConfig {
            bridge_url: "http://127.0.0.1:3001/".to_string(),
            poll_interval_ms: 500,
        });
        assert_eq!(channel.bridge_url, "http://127.0.0.1:3001");
    }

    #[tokio::test]
    async fn test_send_without_target_is_channel_error() {
        let channel = WhatsAppChannel::new(&WhatsAppConfig::default());
        let err = channel
            .send(OutgoingMessage {
                text: "hi".into(),
                reply_target: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Channel(_)));
    }
}
