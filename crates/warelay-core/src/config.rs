//! Configuration loading.
//!
//! Settings live in a sectioned `config.toml`; every field has a default
//! so a missing file yields a working configuration. Two values come from
//! the environment instead: `PORT` overrides the HTTP port, and the
//! completion API key is read from `OPENAI_API_KEY` at startup. A missing
//! key is not a startup error; provider calls fail at first use.

use crate::error::RelayError;
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub reply: ReplyConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppConfig {
    /// Base URL of the whatsapp-web.js bridge sidecar.
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// System instruction prepended to every completion request.
    #[serde(default = "default_style_directive")]
    pub style_directive: String,
    /// Filled from `OPENAI_API_KEY` at startup, never from the file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyConfig {
    /// Exact-match trigger for the canned reply.
    #[serde(default = "default_trigger")]
    pub trigger: String,
    #[serde(default = "default_canned")]
    pub canned: String,
    /// What to do with non-trigger messages: "delegate" or "ignore".
    #[serde(default = "default_on_other")]
    pub on_other: String,
    /// Sent when the completion call fails.
    #[serde(default = "default_apology")]
    pub apology: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Ring-buffer capacity of the in-memory event log.
    #[serde(default = "default_log_capacity")]
    pub capacity: usize,
    /// When set, a daily-rolling log file is written to this directory.
    #[serde(default)]
    pub dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4600
}

fn default_bridge_url() -> String {
    "http://127.0.0.1:3001".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_provider_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_style_directive() -> String {
    "You are a concise, friendly WhatsApp assistant. \
     Answer in the language of the incoming message and keep replies short."
        .to_string()
}

fn default_trigger() -> String {
    "!ping".to_string()
}

fn default_canned() -> String {
    "pong".to_string()
}

fn default_on_other() -> String {
    "delegate".to_string()
}

fn default_apology() -> String {
    "Sorry, I couldn't process that message right now.".to_string()
}

fn default_log_capacity() -> usize {
    500
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            bridge_url: default_bridge_url(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            style_directive: default_style_directive(),
            api_key: None,
        }
    }
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            trigger: default_trigger(),
            canned: default_canned(),
            on_other: default_on_other(),
            apology: default_apology(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            capacity: default_log_capacity(),
            dir: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then apply environment
    /// overrides. A missing file yields the defaults; a malformed file is
    /// an error.
    pub fn load(path: &str) -> Result<Self, RelayError> {
        let expanded = shellexpand(path);
        let mut config = if Path::new(&expanded).exists() {
            let raw = std::fs::read_to_string(&expanded)
                .map_err(|e| RelayError::Config(format!("failed to read {expanded}: {e}")))?;
            toml::from_str(&raw)
                .map_err(|e| RelayError::Config(format!("failed to parse {expanded}: {e}")))?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply environment overrides: `PORT` and `OPENAI_API_KEY`.
    fn apply_env(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                self.http.port = port;
            }
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.provider.api_key = Some(key);
            }
        }
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME") {
            return format!("{home}{rest}");
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.http.port, 4600);
        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.reply.trigger, "!ping");
        assert_eq!(config.reply.canned, "pong");
        assert_eq!(config.reply.on_other, "delegate");
        assert_eq!(config.log.capacity, 500);
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        std::env::remove_var("PORT");
        let config = Config::load("/nonexistent/warelay-config.toml").unwrap();
        assert_eq!(config.http.port, 4600);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        std::env::remove_var("PORT");
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[http]\nport = 8080\n\n[reply]\ntrigger = \"!echo\"").unwrap();
        let config = Config::load(f.path().to_str().unwrap()).unwrap();
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.reply.trigger, "!echo");
        // Untouched sections keep their defaults.
        assert_eq!(config.reply.canned, "pong");
        assert_eq!(config.whatsapp.poll_interval_ms, 2000);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "this is not toml [[").unwrap();
        let err = Config::load(f.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }

    #[test]
    fn test_shellexpand_home() {
        std::env::set_var("HOME", "/home/tester");
        assert_eq!(shellexpand("~/data"), "/home/tester/data");
        assert_eq!(shellexpand("/abs/path"), "/abs/path");
    }
}
