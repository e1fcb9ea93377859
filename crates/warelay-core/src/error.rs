//! Error types for the warelay workspace.

use thiserror::Error;

/// Errors surfaced by warelay components.
///
/// None of these are fatal to the process: channel errors become HTTP 500
/// responses, provider errors are swallowed by the gateway (a canned
/// apology is sent instead), and QR errors fail only the `/qr` request.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration could not be loaded or parsed.
    #[error("config error: {0}")]
    Config(String),

    /// The session client (WhatsApp bridge) failed.
    #[error("channel error: {0}")]
    Channel(String),

    /// The completion API call failed or returned an unusable response.
    #[error("provider error: {0}")]
    Provider(String),

    /// QR code rendering or PNG encoding failed.
    #[error("qr error: {0}")]
    Qr(String),
}
