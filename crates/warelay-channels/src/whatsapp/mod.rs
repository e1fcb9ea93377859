//! WhatsApp channel — adapter over a whatsapp-web.js bridge sidecar.
//!
//! The bridge process owns the WhatsApp Web session: the encrypted
//! multi-device protocol, QR pairing, and session persistence all live
//! there, in storage the bridge controls. This channel only polls the
//! bridge for lifecycle and message events and posts outbound sends:
//!
//! ```text
//! [WhatsApp] <--WS--> [whatsapp-web.js bridge :3001] <--HTTP--> [warelay]
//! ```
//!
//! The bridge exposes:
//! - `GET  /events?after=<seq>` — lifecycle (`qr`, `ready`,
//!   `disconnected`) and inbound `message` events, in order
//! - `POST /send` — send a text message to a JID

mod channel;
mod events;
mod qr;

pub use channel::{WhatsAppChannel, JID_SUFFIX};
pub use qr::generate_qr_image;
