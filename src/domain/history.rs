//! Conversation history for a single refinement run
//!
//! The history is append-only: messages can be pushed and read, never removed
//! or edited. It is owned by the run that created it and handed back to the
//! caller in the final result as an audit trail.

use serde::{Deserialize, Serialize};

/// Who authored a message in the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The task description (or any caller-supplied instruction)
    Task,
    /// An artifact produced by the generator
    Generation,
    /// Feedback produced by the critic
    Critique,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Task => "task",
            Role::Generation => "generation",
            Role::Critique => "critique",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A role-tagged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn task(content: impl Into<String>) -> Self {
        Self {
            role: Role::Task,
            content: content.into(),
        }
    }

    pub fn generation(content: impl Into<String>) -> Self {
        Self {
            role: Role::Generation,
            content: content.into(),
        }
    }

    pub fn critique(content: impl Into<String>) -> Self {
        Self {
            role: Role::Critique,
            content: content.into(),
        }
    }
}

/// Ordered, append-only sequence of messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history whose first message is the given task
    pub fn with_task(task: impl Into<String>) -> Self {
        let mut history = Self::new();
        history.push_task(task);
        history
    }

    pub fn push_task(&mut self, content: impl Into<String>) {
        self.messages.push(Message::task(content));
    }

    pub fn push_generation(&mut self, content: impl Into<String>) {
        self.messages.push(Message::generation(content));
    }

    pub fn push_critique(&mut self, content: impl Into<String>) {
        self.messages.push(Message::critique(content));
    }

    /// All messages in insertion order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recent message, if any
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The most recent message with the given role
    pub fn last_of(&self, role: Role) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == role)
    }

    /// Iterate over messages with the given role
    pub fn iter_role(&self, role: Role) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| m.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Task).unwrap(), "\"task\"");
        assert_eq!(serde_json::to_string(&Role::Generation).unwrap(), "\"generation\"");
        assert_eq!(serde_json::to_string(&Role::Critique).unwrap(), "\"critique\"");
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Critique.to_string(), "critique");
    }

    #[test]
    fn test_with_task() {
        let history = ConversationHistory::with_task("Write a factorial function");
        assert_eq!(history.len(), 1);
        assert_eq!(history.messages()[0], Message::task("Write a factorial function"));
    }

    #[test]
    fn test_append_order() {
        let mut history = ConversationHistory::with_task("task");
        history.push_generation("v1");
        history.push_critique("add docs");
        history.push_generation("v2");

        let roles: Vec<Role> = history.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Task, Role::Generation, Role::Critique, Role::Generation]);
        assert_eq!(history.last().unwrap().content, "v2");
    }

    #[test]
    fn test_last_of() {
        let mut history = ConversationHistory::with_task("task");
        assert!(history.last_of(Role::Critique).is_none());

        history.push_generation("v1");
        history.push_critique("first");
        history.push_generation("v2");
        history.push_critique("second");

        assert_eq!(history.last_of(Role::Critique).unwrap().content, "second");
        assert_eq!(history.last_of(Role::Generation).unwrap().content, "v2");
        assert_eq!(history.iter_role(Role::Generation).count(), 2);
    }

    #[test]
    fn test_empty() {
        let history = ConversationHistory::new();
        assert!(history.is_empty());
        assert!(history.last().is_none());
    }

    #[test]
    fn test_serializes_as_message_array() {
        let mut history = ConversationHistory::with_task("t");
        history.push_generation("g");
        let json = serde_json::to_value(&history).unwrap();
        assert!(json.is_array());
        assert_eq!(json[1]["role"], "generation");
        assert_eq!(json[1]["content"], "g");
    }
}
