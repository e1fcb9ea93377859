//! Reply policy — decides what to do with an inbound message.
//!
//! A pure decision function: exact match on the trigger string yields the
//! canned reply; anything else either goes to the completion provider or
//! is dropped, depending on configuration. The original versions of this
//! bridge disagreed on the non-trigger case, so the behavior is explicit
//! config here rather than an accident of which version shipped last.

use crate::config::ReplyConfig;

/// What the gateway should do with an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyAction {
    /// Send this fixed text back.
    Canned(String),
    /// Forward this prompt to the completion provider.
    Delegate(String),
    /// Do nothing.
    Ignore,
}

/// Behavior for messages that don't match the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonTriggerBehavior {
    Delegate,
    Ignore,
}

/// Configured reply policy.
#[derive(Debug, Clone)]
pub struct ReplyPolicy {
    trigger: String,
    canned: String,
    on_other: NonTriggerBehavior,
}

impl ReplyPolicy {
    pub fn new(trigger: &str, canned: &str, on_other: NonTriggerBehavior) -> Self {
        Self {
            trigger: trigger.to_string(),
            canned: canned.to_string(),
            on_other,
        }
    }

    /// Build from config. Any `on_other` value other than "ignore" means
    /// delegate.
    pub fn from_config(config: &ReplyConfig) -> Self {
        let on_other = if config.on_other.eq_ignore_ascii_case("ignore") {
            NonTriggerBehavior::Ignore
        } else {
            NonTriggerBehavior::Delegate
        };
        Self::new(&config.trigger, &config.canned, on_other)
    }

    /// Decide the action for a message body.
    pub fn decide(&self, body: &str) -> ReplyAction {
        if body.trim().is_empty() {
            return ReplyAction::Ignore;
        }
        if body == self.trigger {
            return ReplyAction::Canned(self.canned.clone());
        }
        match self.on_other {
            NonTriggerBehavior::Delegate => ReplyAction::Delegate(body.to_string()),
            NonTriggerBehavior::Ignore => ReplyAction::Ignore,
        }
    }
}
