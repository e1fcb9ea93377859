//! # warelay-channels
//!
//! Messaging channel adapters. Currently a single channel: WhatsApp via
//! an external bridge sidecar.

pub mod whatsapp;
