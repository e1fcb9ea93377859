//! Message types flowing between the channel and the gateway.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A message received from the session client.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Channel name, e.g. "whatsapp".
    pub channel: String,
    /// Sender identifier (phone number without domain suffix).
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Chat identifier replies should be addressed to (full JID).
    pub reply_target: Option<String>,
}

/// A message to send out through the session client.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub text: String,
    /// Full JID of the destination chat.
    pub reply_target: Option<String>,
}

impl OutgoingMessage {
    /// Reply to an incoming message with the given text.
    pub fn reply_to(incoming: &IncomingMessage, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply_target: incoming.reply_target.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_to_copies_target() {
        let incoming = IncomingMessage {
            id: Uuid::new_v4(),
            channel: "whatsapp".into(),
            sender_id: "15551234567".into(),
            sender_name: Some("Ada".into()),
            text: "hi".into(),
            timestamp: Utc::now(),
            reply_target: Some("15551234567@s.whatsapp.net".into()),
        };
        let out = OutgoingMessage::reply_to(&incoming, "hello");
        assert_eq!(out.text, "hello");
        assert_eq!(
            out.reply_target.as_deref(),
            Some("15551234567@s.whatsapp.net")
        );
    }
}
