use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a chat message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing into the dashboard.
    User,
    /// The assistant backend, or a locally synthesized error notice.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message.
    pub role: Role,
    /// Plain-text body.
    pub content: String,
}

impl Message {
    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Renders the message as a transcript line, `"ROLE: content"`.
    pub fn transcript_line(&self) -> String {
        format!("{}: {}", self.role.to_string().to_uppercase(), self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization() {
        let message = Message::user("Hello");
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"Hello"}"#);
    }

    #[test]
    fn deserialization() {
        let json = r#"{"role":"assistant","content":"Hi"}"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message, Message::assistant("Hi"));
    }

    #[test]
    fn transcript_line() {
        assert_eq!(Message::assistant("Hi").transcript_line(), "ASSISTANT: Hi");
        assert_eq!(Message::user("Hello").transcript_line(), "USER: Hello");
    }
}
