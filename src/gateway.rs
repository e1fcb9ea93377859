//! Gateway — the event loop connecting the channel, state, and provider.
//!
//! Consumes channel events: lifecycle events update the shared state
//! (pending QR, event log); inbound messages run through the reply policy
//! and may call the completion provider. Provider failures are non-fatal:
//! a fixed apology is sent instead and the error is logged.

use std::sync::Arc;
use tracing::{error, info, warn};
use warelay_core::message::{IncomingMessage, OutgoingMessage};
use warelay_core::policy::{ReplyAction, ReplyPolicy};
use warelay_core::state::BridgeState;
use warelay_core::traits::{Channel, ChannelEvent, Provider};

pub struct Gateway {
    channel: Arc<dyn Channel>,
    provider: Arc<dyn Provider>,
    policy: ReplyPolicy,
    state: BridgeState,
    apology: String,
}

impl Gateway {
    pub fn new(
        channel: Arc<dyn Channel>,
        provider: Arc<dyn Provider>,
        policy: ReplyPolicy,
        state: BridgeState,
        apology: String,
    ) -> Self {
        Self {
            channel,
            provider,
            policy,
            state,
            apology,
        }
    }

    /// Run the event loop until ctrl-c.
    pub async fn run(&self) -> anyhow::Result<()> {
        info!(
            "warelay gateway running | channel: {} | provider: {}",
            self.channel.name(),
            self.provider.name()
        );

        let mut rx = self
            .channel
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start channel: {e}"))?;

        loop {
            tokio::select! {
                event = rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event).await,
                        None => {
                            warn!("channel event stream closed");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("received shutdown signal");
                    break;
                }
            }
        }

        if let Err(e) = self.channel.stop().await {
            warn!("failed to stop channel: {e}");
        }
        info!("shutdown complete");
        Ok(())
    }

    /// Process a single channel event.
    pub async fn handle_event(&self, event: ChannelEvent) {
        match event {
            ChannelEvent::Qr(code) => {
                info!("pairing QR updated");
                self.state.record_challenge(&code).await;
            }
            ChannelEvent::Ready => {
                info!("session authenticated");
                self.state.clear_challenge().await;
                self.state.append_log("session authenticated").await;
            }
            ChannelEvent::Disconnected => {
                warn!("session disconnected");
                self.state.append_log("session disconnected").await;
            }
            ChannelEvent::Message(msg) => {
                self.handle_message(msg).await;
            }
        }
    }

    async fn handle_message(&self, incoming: IncomingMessage) {
        let preview: String = incoming.text.chars().take(60).collect();
        info!(
            "[{}] {} says: {preview}",
            incoming.channel,
            incoming.sender_name.as_deref().unwrap_or(&incoming.sender_id),
        );
        self.state
            .append_log(format!("message from {}: {preview}", incoming.sender_id))
            .await;

        match self.policy.decide(&incoming.text) {
            ReplyAction::Canned(text) => {
                self.send_text(&incoming, &text).await;
            }
            ReplyAction::Delegate(prompt) => {
                let reply = match self.provider.complete(&prompt).await {
                    Ok(text) => text,
                    Err(e) => {
                        error!("provider error: {e}");
                        self.state.append_log(format!("provider error: {e}")).await;
                        self.apology.clone()
                    }
                };
                self.send_text(&incoming, &reply).await;
            }
            ReplyAction::Ignore => {}
        }
    }

    async fn send_text(&self, incoming: &IncomingMessage, text: &str) {
        let msg = OutgoingMessage::reply_to(incoming, text);
        if let Err(e) = self.channel.send(msg).await {
            error!("failed to send reply: {e}");
            self.state.append_log(format!("send error: {e}")).await;
        }
    }
}
