//! Wire types for the bridge's event and send endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warelay_core::message::IncomingMessage;
use warelay_core::traits::ChannelEvent;

/// Response body of `GET /events`.
#[derive(Debug, Deserialize)]
pub(super) struct EventsResponse {
    #[serde(default)]
    pub events: Vec<EventEnvelope>,
}

/// One bridge event with its sequence cursor.
#[derive(Debug, Deserialize)]
pub(super) struct EventEnvelope {
    pub seq: u64,
    #[serde(flatten)]
    pub event: BridgeEvent,
}

/// Bridge event payloads, tagged by `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(super) enum BridgeEvent {
    Qr {
        code: String,
    },
    Ready,
    Disconnected,
    Message {
        from: String,
        body: String,
        #[serde(default)]
        sender_name: Option<String>,
        /// Chat JID to reply to; defaults to the sender when absent.
        #[serde(default)]
        chat: Option<String>,
    },
}

/// Request body of `POST /send`.
#[derive(Debug, Serialize)]
pub(super) struct SendRequest<'a> {
    pub to: &'a str,
    pub body: &'a str,
}

impl BridgeEvent {
    /// Translate a bridge event into the channel-neutral event type.
    pub(super) fn into_channel_event(self, channel: &str) -> ChannelEvent {
        match self {
            BridgeEvent::Qr { code } => ChannelEvent::Qr(code),
            BridgeEvent::Ready => ChannelEvent::Ready,
            BridgeEvent::Disconnected => ChannelEvent::Disconnected,
            BridgeEvent::Message {
                from,
                body,
                sender_name,
                chat,
            } => {
                let reply_target = chat.unwrap_or_else(|| from.clone());
                let sender_id = from
                    .split_once('@')
                    .map(|(user, _)| user.to_string())
                    .unwrap_or(from);
                ChannelEvent::Message(IncomingMessage {
                    id: Uuid::new_v4(),
                    channel: channel.to_string(),
                    sender_id,
                    sender_name,
                    text: body,
                    timestamp: chrono::Utc::now(),
                    reply_target: Some(reply_target),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_qr_event() {
        let raw = r#"{"events":[{"seq":1,"type":"qr","code":"2@abc,def"}]}"#;
        let resp: EventsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.events.len(), 1);
        assert_eq!(resp.events[0].seq, 1);
        assert!(matches!(
            &resp.events[0].event,
            BridgeEvent::Qr { code } if code == "2@abc,def"
        ));
    }

    #[test]
    fn test_decode_lifecycle_and_message_events() {
        let raw = r#"{"events":[
            {"seq":7,"type":"ready"},
            {"seq":8,"type":"message","from":"15551234567@s.whatsapp.net","body":"!ping","sender_name":"Ada"},
            {"seq":9,"type":"disconnected"}
        ]}"#;
        let resp: EventsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.events.len(), 3);
        assert!(matches!(resp.events[0].event, BridgeEvent::Ready));
        assert!(matches!(resp.events[2].event, BridgeEvent::Disconnected));
    }

    #[test]
    fn test_decode_empty_body() {
        let resp: EventsResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.events.is_empty());
    }

    #[test]
    fn test_message_translation_strips_jid_and_defaults_chat() {
        let event = BridgeEvent::Message {
            from: "15551234567@s.whatsapp.net".to_string(),
            body: "hello".to_string(),
            sender_name: None,
            chat: None,
        };
        let ChannelEvent::Message(msg) = event.into_channel_event("whatsapp") else {
            panic!("expected a message event");
        };
        assert_eq!(msg.sender_id, "15551234567");
        assert_eq!(
            msg.reply_target.as_deref(),
            Some("15551234567@s.whatsapp.net")
        );
        assert_eq!(msg.channel, "whatsapp");
        assert_eq!(msg.text, "hello");
    }

    #[test]
    fn test_message_translation_prefers_explicit_chat() {
        let event = BridgeEvent::Message {
            from: "15551234567@s.whatsapp.net".to_string(),
            body: "hi".to_string(),
            sender_name: Some("Ada".to_string()),
            chat: Some("15559876543@s.whatsapp.net".to_string()),
        };
        let ChannelEvent::Message(msg) = event.into_channel_event("whatsapp") else {
            panic!("expected a message event");
        };
        assert_eq!(
            msg.reply_target.as_deref(),
            Some("15559876543@s.whatsapp.net")
        );
        assert_eq!(msg.sender_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_send_request_encoding() {
        let req = SendRequest {
            to: "15551234567@s.whatsapp.net",
            body: "hello",
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(
            json,
            r#"{"to":"15551234567@s.whatsapp.net","body":"hello"}"#
        );
    }
}
