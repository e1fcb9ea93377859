//! In-process bridge state shared between the gateway and the HTTP surface.
//!
//! Holds the pending pairing QR payload (present from a `qr` event until
//! the session authenticates) and a bounded in-memory event log. The
//! handle is cheap to clone; writers replace single fields, so readers on
//! other tasks never observe a torn update.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One timestamped event-log line.
#[derive(Debug, Clone)]
struct LogEntry {
    at: DateTime<Utc>,
    text: String,
}

struct StateInner {
    pending_qr: RwLock<Option<String>>,
    log: RwLock<VecDeque<LogEntry>>,
    capacity: usize,
}

/// Cloneable handle to the shared bridge state.
#[derive(Clone)]
pub struct BridgeState {
    inner: Arc<StateInner>,
}

impl BridgeState {
    /// Create state with the given event-log capacity. The log is a ring
    /// buffer: once full, the oldest entry is evicted on append.
    pub fn new(log_capacity: usize) -> Self {
        Self {
            inner: Arc::new(StateInner {
                pending_qr: RwLock::new(None),
                log: RwLock::new(VecDeque::with_capacity(log_capacity.min(1024))),
                capacity: log_capacity.max(1),
            }),
        }
    }

    /// Store the latest pairing token and log it.
    pub async fn record_challenge(&self, token: &str) {
        *self.inner.pending_qr.write().await = Some(token.to_string());
        self.append_log("QR code updated, scan it to pair").await;
    }

    /// Clear the pending token (called when the session authenticates).
    pub async fn clear_challenge(&self) {
        *self.inner.pending_qr.write().await = None;
    }

    /// The currently pending pairing token, if any.
    pub async fn current_challenge(&self) -> Option<String> {
        self.inner.pending_qr.read().await.clone()
    }

    /// Append a line to the event log, evicting the oldest when full.
    pub async fn append_log(&self, text: impl Into<String>) {
        let mut log = self.inner.log.write().await;
        if log.len() == self.inner.capacity {
            log.pop_front();
        }
        log.push_back(LogEntry {
            at: Utc::now(),
            text: text.into(),
        });
    }

    /// All log lines, oldest first, rendered as `[timestamp] text`.
    pub async fn recent_logs(&self) -> Vec<String> {
        self.inner
            .log
            .read()
            .await
            .iter()
            .map(|e| format!("[{}] {}", e.at.format("%Y-%m-%d %H:%M:%S UTC"), e.text))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_challenge_lifecycle() {
        let state = BridgeState::new(10);
        assert_eq!(state.current_challenge().await, None);

        state.record_challenge("token-1").await;
        assert_eq!(state.current_challenge().await.as_deref(), Some("token-1"));

        // A newer QR replaces the old one; at most one pending at a time.
        state.record_challenge("token-2").await;
        assert_eq!(state.current_challenge().await.as_deref(), Some("token-2"));

        state.clear_challenge().await;
        assert_eq!(state.current_challenge().await, None);
    }

    #[tokio::test]
    async fn test_log_order_is_oldest_first() {
        let state = BridgeState::new(10);
        state.append_log("first").await;
        state.append_log("second").await;
        let logs = state.recent_logs().await;
        assert_eq!(logs.len(), 2);
        assert!(logs[0].ends_with("first"));
        assert!(logs[1].ends_with("second"));
    }

    #[tokio::test]
    async fn test_ring_buffer_evicts_oldest() {
        let state = BridgeState::new(3);
        for i in 0..5 {
            state.append_log(format!("entry {i}")).await;
        }
        let logs = state.recent_logs().await;
        assert_eq!(logs.len(), 3);
        assert!(logs[0].ends_with("entry 2"));
        assert!(logs[2].ends_with("entry 4"));
    }

    #[tokio::test]
    async fn test_record_challenge_appends_log() {
        let state = BridgeState::new(10);
        state.record_challenge("tok").await;
        let logs = state.recent_logs().await;
        assert_eq!(logs.len(), 1);
        assert!(logs[0].contains("QR code updated"));
    }
}
