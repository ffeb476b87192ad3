//! Chat endpoint logic and the client-side chat session
//!
//! [`ChatService`] is what the `/api/chat` routes run: it validates the
//! request, builds the prompt and calls the [`TextGenerator`]. It knows
//! nothing about HTTP, so it can be driven directly.
//!
//! [`ChatSession`] is the editor's side. It sends one request at a time
//! through a [`ChatBackend`] on a worker thread. A second submit while one
//! is pending is refused, not queued.

use super::extract::extract_markdown;
use super::gemini::{GeminiClient, TextGenerator};
use super::prompt::{build_prompt, build_stream_prompt, ChatAction};
use super::AssistantError;
use crate::config::AssistantSettings;
use crate::editor::{diff_with, ChangeEntry, DiffMode};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Reply used when the provider returns no text.
const NO_REPLY: &str = "Sorry, I could not generate a response.";

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

/// Body of a chat request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatRequest {
    pub message: String,
    pub document_content: String,
    pub document_title: String,
    pub action: ChatAction,
}

impl ChatRequest {
    pub fn new(message: &str, title: &str, content: &str, action: ChatAction) -> Self {
        Self {
            message: message.to_string(),
            document_content: content.to_string(),
            document_title: title.to_string(),
            action,
        }
    }
}

/// Body of a chat response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ChatAction>,
}

impl ChatResponse {
    fn ok(response: String, action: ChatAction) -> Self {
        Self {
            success: true,
            response: Some(response),
            action: Some(action),
            ..Self::default()
        }
    }

    fn failure(error: &str, details: Option<String>) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            details,
            ..Self::default()
        }
    }
}

/// A response together with its HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub status: u16,
    pub body: ChatResponse,
}

/// One server-sent event carrying a text chunk.
pub fn sse_event(text: &str) -> String {
    format!("data: {}\n\n", json!({ "text": text }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat Service
// ─────────────────────────────────────────────────────────────────────────────

/// Request handling behind the chat routes.
#[derive(Clone)]
pub struct ChatService {
    /// `None` when no API key is configured
    generator: Option<Arc<dyn TextGenerator>>,
}

impl ChatService {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    /// Use the Gemini client when an API key is available.
    pub fn from_settings(settings: &AssistantSettings) -> Self {
        match GeminiClient::from_settings(settings) {
            Ok(client) => Self::new(Some(Arc::new(client))),
            Err(e) => {
                warn!("Chat disabled: {} (set {})", e, settings.api_key_env);
                Self::new(None)
            }
        }
    }

    pub fn has_credential(&self) -> bool {
        self.generator.is_some()
    }

    /// Validate `request` and return the generator to use, or the error
    /// reply to send instead.
    fn check(&self, request: &ChatRequest) -> Result<Arc<dyn TextGenerator>, ChatReply> {
        let generator = self.generator.clone().ok_or_else(|| ChatReply {
            status: 500,
            body: ChatResponse::failure(&AssistantError::MissingCredential.to_string(), None),
        })?;

        if request.message.trim().is_empty() {
            return Err(ChatReply {
                status: 400,
                body: ChatResponse::failure(&AssistantError::EmptyMessage.to_string(), None),
            });
        }

        Ok(generator)
    }

    /// Handle a one-shot chat request.
    pub fn respond(&self, request: &ChatRequest) -> ChatReply {
        let generator = match self.check(request) {
            Ok(generator) => generator,
            Err(reply) => return reply,
        };

        let prompt = build_prompt(
            &request.message,
            &request.document_title,
            &request.document_content,
            request.action,
        );

        match generator.generate(&prompt) {
            Ok(text) => {
                let text = if text.trim().is_empty() {
                    NO_REPLY.to_string()
                } else {
                    text
                };
                info!(
                    "Chat {} answered ({} chars)",
                    request.action,
                    text.chars().count()
                );
                ChatReply {
                    status: 200,
                    body: ChatResponse::ok(text, request.action),
                }
            }
            Err(e) => {
                error!("Chat request failed: {}", e);
                ChatReply {
                    status: 500,
                    body: ChatResponse::failure("Internal server error", Some(e.to_string())),
                }
            }
        }
    }

    /// Stream a reply as server-sent events.
    ///
    /// Returns the error reply instead when the request is rejected before
    /// any chunk is produced. `sink` receives complete SSE events and
    /// returns `false` once the client has gone away.
    pub fn stream(
        &self,
        request: &ChatRequest,
    ) -> Result<impl FnOnce(&mut dyn FnMut(String) -> bool) + Send + 'static, ChatReply> {
        let generator = self.check(request)?;
        let prompt = build_stream_prompt(
            &request.message,
            &request.document_title,
            &request.document_content,
        );

        Ok(move |sink: &mut dyn FnMut(String) -> bool| {
            let mut chunks = 0usize;
            let result = generator.generate_stream(&prompt, &mut |text: &str| {
                chunks += 1;
                sink(sse_event(text))
            });
            match result {
                Ok(()) => debug!("Stream finished after {} chunks", chunks),
                Err(e) => error!("Streaming failed after {} chunks: {}", chunks, e),
            }
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat Backends
// ─────────────────────────────────────────────────────────────────────────────

/// Where a [`ChatSession`] sends its requests.
pub trait ChatBackend: Send + Sync {
    fn send(&self, request: &ChatRequest) -> Result<ChatResponse, AssistantError>;
}

/// Talks to a running chat endpoint over HTTP.
pub struct HttpChatBackend {
    agent: ureq::Agent,
    url: String,
}

impl HttpChatBackend {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            url: format!("{}/api/chat", base_url.trim_end_matches('/')),
        }
    }
}

impl ChatBackend for HttpChatBackend {
    fn send(&self, request: &ChatRequest) -> Result<ChatResponse, AssistantError> {
        let response = match self.agent.post(&self.url).send_json(request) {
            Ok(response) => response,
            // Error statuses still carry a JSON body
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                return serde_json::from_str(&body).map_err(|_| AssistantError::Http {
                    status,
                    message: body,
                });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(AssistantError::Transport(transport.to_string()))
            }
        };

        response
            .into_json()
            .map_err(|e| AssistantError::Provider(format!("Invalid chat response: {}", e)))
    }
}

/// Runs the [`ChatService`] in-process.
pub struct DirectChatBackend {
    service: ChatService,
}

impl DirectChatBackend {
    pub fn new(service: ChatService) -> Self {
        Self { service }
    }
}

impl ChatBackend for DirectChatBackend {
    fn send(&self, request: &ChatRequest) -> Result<ChatResponse, AssistantError> {
        Ok(self.service.respond(request).body)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat Session
// ─────────────────────────────────────────────────────────────────────────────

/// Result of [`ChatSession::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The request is on its way
    Sent,
    /// A request is already pending; nothing was sent
    Busy,
    /// The message was blank; nothing was sent
    Empty,
}

type PendingReply = Receiver<Result<ChatResponse, AssistantError>>;

/// One chat conversation with at most one request in flight.
///
/// A request stays in flight until its reply has been taken with
/// [`poll`](Self::poll).
pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    pending: Option<PendingReply>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            pending: None,
        }
    }

    pub fn is_processing(&self) -> bool {
        self.pending.is_some()
    }

    /// Send `message` about the given document on a worker thread.
    pub fn submit(
        &mut self,
        message: &str,
        title: &str,
        content: &str,
        action: ChatAction,
    ) -> SubmitOutcome {
        let message = message.trim();
        if message.is_empty() {
            return SubmitOutcome::Empty;
        }
        if self.is_processing() {
            debug!("Chat request already in flight, ignoring submit");
            return SubmitOutcome::Busy;
        }

        let request = ChatRequest::new(message, title, content, action);
        let backend = Arc::clone(&self.backend);
        let (tx, rx) = channel();

        thread::spawn(move || {
            // The session may be gone; the reply is then dropped
            let _ = tx.send(backend.send(&request));
        });

        self.pending = Some(rx);
        SubmitOutcome::Sent
    }

    /// Take the reply if it has arrived.
    pub fn poll(&mut self) -> Option<Result<ChatResponse, AssistantError>> {
        let result = match self.pending.as_ref()?.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(worker_stopped()),
        };
        self.pending = None;
        Some(result)
    }
}

fn worker_stopped() -> AssistantError {
    AssistantError::Transport("chat worker stopped".to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Edit Proposals
// ─────────────────────────────────────────────────────────────────────────────

/// A document revision found in an assistant reply, with its change preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditProposal {
    pub content: String,
    pub changes: Vec<ChangeEntry>,
}

impl EditProposal {
    /// `true` when applying would not change anything.
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Extract the revised document from `reply` and diff it against `current`.
pub fn propose_edit(reply: &str, current: &str, mode: DiffMode) -> Option<EditProposal> {
    let content = extract_markdown(reply)?;
    let changes = diff_with(current, &content, mode);
    Some(EditProposal { content, changes })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
