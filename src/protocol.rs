use serde::{Deserialize, Serialize};

/// Body returned to the caller for every failure.
pub const GENERIC_ERROR_MESSAGE: &str = "There was an error processing your request. Try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Inbound payload of `POST /api/chat`.
///
/// `messages` stays optional here so a missing field is reported as invalid input
/// by the handler instead of being rejected by the deserializer.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChatReqInput {
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
}

#[derive(Debug, Serialize)]
pub struct ModerationRequest<'a> {
    pub input: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ModerationResult {
    #[serde(default)]
    pub flagged: bool,
}

#[derive(Debug, Deserialize)]
pub struct ModerationResponse {
    #[serde(default)]
    pub results: Vec<ModerationResult>,
}

/// Outbound chat completion request. Streaming is always requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn generic() -> Self {
        ErrorBody {
            error: GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}
