//! Trait seams for the two external collaborators.

use crate::error::RelayError;
use crate::message::{IncomingMessage, OutgoingMessage};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// An event emitted by a messaging channel.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// A new pairing QR payload is available. Fires repeatedly while
    /// unauthenticated, since WhatsApp rotates QR codes periodically.
    Qr(String),
    /// The session is authenticated and ready; any pending QR is stale.
    Ready,
    /// An inbound chat message.
    Message(IncomingMessage),
    /// The session dropped. The channel keeps running and may emit a new
    /// `Qr` if re-pairing is required.
    Disconnected,
}

/// A messaging channel (session client adapter).
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name, e.g. "whatsapp".
    fn name(&self) -> &str;

    /// Start the channel and return the event receiver.
    async fn start(&self) -> Result<mpsc::Receiver<ChannelEvent>, RelayError>;

    /// Send a message. Single attempt; errors are reported, not retried.
    async fn send(&self, message: OutgoingMessage) -> Result<(), RelayError>;

    /// Stop the channel.
    async fn stop(&self) -> Result<(), RelayError>;
}

/// A generative-text completion provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name, e.g. "openai".
    fn name(&self) -> &str;

    /// Generate a reply for the given prompt. Single attempt.
    async fn complete(&self, prompt: &str) -> Result<String, RelayError>;
}
