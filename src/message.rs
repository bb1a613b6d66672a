//! Chat message data model.

use serde::{Deserialize, Serialize};

/// One message in a conversation: a role plus text content.
///
/// Serializes to the `{"role": ..., "content": ...}` shape the chat
/// collaborator expects, so history can be sent on the wire verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    /// User input message role.
    pub const USER: &'static str = "user";
    /// Assistant reply message role.
    pub const ASSISTANT: &'static str = "assistant";
    /// System instruction message role.
    pub const SYSTEM: &'static str = "system";

    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(Self::USER, content)
    }

    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    #[must_use]
    pub fn system(content: &str) -> Self {
        Self::new(Self::SYSTEM, content)
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_roles() {
        assert_eq!(Message::user("q").role, Message::USER);
        assert_eq!(Message::assistant("a").role, Message::ASSISTANT);
        assert_eq!(Message::system("s").role, Message::SYSTEM);
        assert!(Message::user("q").has_role(Message::USER));
    }

    #[test]
    fn wire_shape_matches_chat_api() {
        let json = serde_json::to_string(&Message::user("hello")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hello"}"#);
    }
}
