//! Google Gemini client
//!
//! A thin blocking client over the `generateContent` and
//! `streamGenerateContent` REST endpoints. Nothing is retried.

use super::AssistantError;
use crate::config::AssistantSettings;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::json;
use std::io::{BufRead, BufReader};
use std::time::Duration;

/// Anything that can turn a prompt into text.
pub trait TextGenerator: Send + Sync {
    /// Generate a complete reply.
    fn generate(&self, prompt: &str) -> Result<String, AssistantError>;

    /// Generate a reply in chunks. `on_chunk` returns `false` to stop early.
    fn generate_stream(
        &self,
        prompt: &str,
        on_chunk: &mut dyn FnMut(&str) -> bool,
    ) -> Result<(), AssistantError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Response Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Text carried by one server-sent-event line, if any.
fn parse_sse_line(line: &str) -> Option<String> {
    let data = line.strip_prefix("data:")?.trim_start();
    let response: GenerateResponse = serde_json::from_str(data).ok()?;
    let text = response.text();
    (!text.is_empty()).then_some(text)
}

/// Best-effort message from an error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Blocking Gemini REST client.
pub struct GeminiClient {
    agent: ureq::Agent,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Build a client from settings, reading the key from the environment.
    pub fn from_settings(settings: &AssistantSettings) -> Result<Self, AssistantError> {
        let api_key = settings.api_key().ok_or(AssistantError::MissingCredential)?;
        Ok(Self::new(
            &settings.api_base_url,
            &settings.model,
            &api_key,
            Duration::from_secs(settings.timeout_secs),
        ))
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, method)
    }

    fn post(&self, url: &str, prompt: &str) -> Result<ureq::Response, AssistantError> {
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });
        debug!("POST {} ({} prompt bytes)", url, prompt.len());

        self.agent
            .post(url)
            .set("x-goog-api-key", &self.api_key)
            .send_json(body)
            .map_err(|e| match e {
                ureq::Error::Status(status, response) => {
                    let body = response.into_string().unwrap_or_default();
                    let message = error_message(&body);
                    warn!("Gemini returned {}: {}", status, message);
                    AssistantError::Http { status, message }
                }
                ureq::Error::Transport(transport) => {
                    warn!("Gemini request failed: {}", transport);
                    AssistantError::Transport(transport.to_string())
                }
            })
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        let url = self.endpoint("generateContent");
        let response: GenerateResponse = self
            .post(&url, prompt)?
            .into_json()
            .map_err(|e| AssistantError::Provider(format!("Invalid response: {}", e)))?;
        Ok(response.text())
    }

    fn generate_stream(
        &self,
        prompt: &str,
        on_chunk: &mut dyn FnMut(&str) -> bool,
    ) -> Result<(), AssistantError> {
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        let reader = BufReader::new(self.post(&url, prompt)?.into_reader());

        for line in reader.lines() {
            let line = line.map_err(|e| AssistantError::Transport(e.to_string()))?;
            if let Some(text) = parse_sse_line(&line) {
                if !on_chunk(&text) {
                    debug!("Stream consumer stopped early");
                    break;
                }
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
