//! Conversation state threaded through one run.

use crate::model::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Messages produced by one node, merged into the state by appending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDelta {
    pub messages: Vec<Message>,
}

/// Append-only message history plus write-once auxiliary fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    aux: BTreeMap<String, Value>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a caller-supplied history.
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            aux: BTreeMap::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Merge a node's delta.
    pub fn apply(&mut self, delta: StateDelta) {
        self.messages.extend(delta.messages);
    }

    pub fn aux(&self, key: &str) -> Option<&Value> {
        self.aux.get(key)
    }

    pub fn aux_fields(&self) -> &BTreeMap<String, Value> {
        &self.aux
    }

    /// Record an auxiliary field. The first write wins; later writes are
    /// dropped with a warning. Returns whether the value was stored.
    pub fn set_aux(&mut self, key: impl Into<String>, value: Value) -> bool {
        let key = key.into();
        if self.aux.contains_key(&key) {
            warn!(%key, "auxiliary field already set; keeping first value");
            return false;
        }
        self.aux.insert(key, value);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_appends_in_order() {
        let mut state = ConversationState::with_messages(vec![Message::user("hi")]);
        state.apply(StateDelta {
            messages: vec![Message::assistant("a"), Message::assistant("b")],
        });
        let texts: Vec<String> = state.messages().iter().map(Message::text).collect();
        assert_eq!(texts, ["hi", "a", "b"]);
        assert_eq!(state.last().map(Message::text).as_deref(), Some("b"));
    }

    #[test]
    fn aux_fields_are_write_once() {
        let mut state = ConversationState::new();
        assert!(state.set_aux("approval_status", Value::String("SUBMITTED".into())));
        assert!(!state.set_aux("approval_status", Value::String("REJECTED".into())));
        assert_eq!(state.aux("approval_status").unwrap(), "SUBMITTED");
    }

    #[test]
    fn empty_aux_is_not_serialized() {
        let state = ConversationState::with_messages(vec![Message::user("hi")]);
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("aux").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
