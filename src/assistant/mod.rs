//! AI writing assistant
//!
//! This module contains everything between the user's chat message and an
//! applied edit: prompt construction, the Gemini client, the chat endpoint
//! logic, the client-side chat session and Markdown extraction from
//! replies.
//!
//! # Architecture
//!
//! - `prompt.rs` - Prompt text for edit and chat actions
//! - `gemini.rs` - `TextGenerator` trait and the Gemini REST client
//! - `chat.rs` - Endpoint logic, chat backends and the in-flight guarded session
//! - `extract.rs` - Finding the revised document inside a reply

mod chat;
mod extract;
mod gemini;
mod prompt;

pub use chat::{
    propose_edit, ChatBackend, ChatRequest, ChatResponse, ChatService, ChatSession,
    DirectChatBackend, HttpChatBackend, SubmitOutcome,
};
pub use prompt::ChatAction;

#[cfg(test)]
pub use gemini::TextGenerator;

use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors from the assistant and its provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantError {
    /// No API key is configured
    MissingCredential,
    /// The chat message was empty
    EmptyMessage,
    /// The provider or chat endpoint answered with an error status
    Http { status: u16, message: String },
    /// The request never completed (DNS, TLS, timeout, broken stream)
    Transport(String),
    /// The provider answered with something unusable
    Provider(String),
}

impl fmt::Display for AssistantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssistantError::MissingCredential => write!(f, "API key not configured"),
            AssistantError::EmptyMessage => write!(f, "Message is required"),
            AssistantError::Http { status, message } => {
                write!(f, "Request failed with status {}: {}", status, message)
            }
            AssistantError::Transport(msg) => write!(f, "Connection error: {}", msg),
            AssistantError::Provider(msg) => write!(f, "Provider error: {}", msg),
        }
    }
}

impl std::error::Error for AssistantError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AssistantError::MissingCredential.to_string(),
            "API key not configured"
        );
        let err = AssistantError::Http {
            status: 429,
            message: "quota".to_string(),
        };
        assert_eq!(err.to_string(), "Request failed with status 429: quota");
    }
}
