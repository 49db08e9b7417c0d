use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a turn in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message in a conversation.
///
/// Fields are private so a turn cannot change after it has been created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
}

impl Turn {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Create a system turn
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Who authored the turn.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The text exactly as it was appended.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// When the turn was created (UTC). Never sent to the endpoint.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Wire form of a turn: only role and content go to the endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct WireMessage<'a> {
    pub role: Role,
    pub content: &'a str,
}

impl<'a> From<&'a Turn> for WireMessage<'a> {
    fn from(turn: &'a Turn) -> Self {
        Self {
            role: turn.role,
            content: &turn.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }

    #[test]
    fn test_role_deserialization() {
        assert_eq!(serde_json::from_str::<Role>("\"system\"").unwrap(), Role::System);
        assert_eq!(serde_json::from_str::<Role>("\"user\"").unwrap(), Role::User);
        assert_eq!(serde_json::from_str::<Role>("\"assistant\"").unwrap(), Role::Assistant);
        assert!(serde_json::from_str::<Role>("\"tool\"").is_err());
    }

    #[test]
    fn test_turn_constructors() {
        assert_eq!(Turn::system("rules").role(), Role::System);
        assert_eq!(Turn::user("hello").role(), Role::User);

        let turn = Turn::assistant("Hi there!");
        assert_eq!(turn.role(), Role::Assistant);
        assert_eq!(turn.content(), "Hi there!");
    }

    #[test]
    fn test_turn_timestamp_is_set() {
        let before = Utc::now();
        let turn = Turn::user("hello");
        let after = Utc::now();

        assert!(turn.created_at() >= before);
        assert!(turn.created_at() <= after);
    }

    #[test]
    fn test_wire_message_omits_timestamp() {
        let turn = Turn::user("hello");
        let json = serde_json::to_value(WireMessage::from(&turn)).unwrap();

        assert_eq!(json, serde_json::json!({"role": "user", "content": "hello"}));
    }

    #[test]
    fn test_turn_round_trips_through_json() {
        let turn = Turn::assistant("response");
        let json = serde_json::to_string(&turn).unwrap();
        let restored: Turn = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, turn);
    }
}
