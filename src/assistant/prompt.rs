//! Prompt construction
//!
//! The document title and content are embedded in a fixed instruction
//! block, followed by the user's message.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Title used in prompts when the document has none.
pub const DEFAULT_PROMPT_TITLE: &str = "Untitled Document";

/// Content placeholder used in prompts when the document is empty.
pub const EMPTY_CONTENT: &str = "Empty document";

/// What the user wants the assistant to do with the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChatAction {
    /// Return a revised document
    Edit,
    /// Answer a question about the document
    #[default]
    Chat,
}

impl ChatAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatAction::Edit => "edit",
            ChatAction::Chat => "chat",
        }
    }

    fn duties(&self) -> &'static str {
        match self {
            ChatAction::Edit => {
                "- Provide the corrected/improved text in Markdown format\n\
                 - Briefly explain the changes you made"
            }
            ChatAction::Chat => {
                "- Analyze the document and answer the user's question\n\
                 - Give specific suggestions to improve the content"
            }
        }
    }
}

impl fmt::Display for ChatAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

/// Full prompt for a one-shot request.
pub fn build_prompt(message: &str, title: &str, content: &str, action: ChatAction) -> String {
    format!(
        "You are an expert writing assistant specialized in editing Markdown documents.\n\
         \n\
         Current document:\n\
         Title: \"{title}\"\n\
         Content:\n\
         ```markdown\n\
         {content}\n\
         ```\n\
         \n\
         Your job is to:\n\
         {duties}\n\
         \n\
         Be concise but helpful.\n\
         \n\
         User question: {message}",
        title = or_default(title, DEFAULT_PROMPT_TITLE),
        content = or_default(content, EMPTY_CONTENT),
        duties = action.duties(),
        message = message,
    )
}

/// Shorter prompt used by the streaming endpoint. Streaming always answers
/// questions; it never proposes edits.
pub fn build_stream_prompt(message: &str, title: &str, content: &str) -> String {
    format!(
        "You are an expert writing assistant.\n\
         Current document: \"{title}\"\n\
         Content: {content}\n\
         \n\
         Answer the user's question about the document:\n\
         \n\
         Question: {message}",
        title = or_default(title, DEFAULT_PROMPT_TITLE),
        content = or_default(content, EMPTY_CONTENT),
        message = message,
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_prompt() {
        let prompt = build_prompt("fix typos", "Plan", "# Plan\nteh", ChatAction::Edit);
        assert!(prompt.contains("Title: \"Plan\""));
        assert!(prompt.contains("```markdown\n# Plan\nteh\n```"));
        assert!(prompt.contains("corrected/improved text"));
        assert!(prompt.ends_with("User question: fix typos"));
    }

    #[test]
    fn test_chat_prompt_uses_defaults() {
        let prompt = build_prompt("what is this?", "", "", ChatAction::Chat);
        assert!(prompt.contains("Title: \"Untitled Document\""));
        assert!(prompt.contains("Empty document"));
        assert!(prompt.contains("answer the user's question"));
    }

    #[test]
    fn test_stream_prompt() {
        let prompt = build_stream_prompt("summarize", "Notes", "body");
        assert!(prompt.contains("Current document: \"Notes\""));
        assert!(prompt.contains("Content: body"));
        assert!(prompt.ends_with("Question: summarize"));
    }

    #[test]
    fn test_action_serde() {
        assert_eq!(serde_json::to_string(&ChatAction::Edit).unwrap(), "\"edit\"");
        let action: ChatAction = serde_json::from_str("\"chat\"").unwrap();
        assert_eq!(action, ChatAction::Chat);
        assert_eq!(ChatAction::default().to_string(), "chat");
    }
}
