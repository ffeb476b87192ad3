//! HTTP server for the chat and health endpoints
//!
//! Routes:
//!
//! - `POST /api/chat` - one-shot chat or edit request, JSON reply
//! - `PATCH /api/chat` - streaming chat reply as server-sent events
//! - `GET /api/health` - liveness report
//!
//! Routing is separated from the socket: [`Api::handle`] turns a method,
//! path and body into a [`Reply`], and [`serve`] writes replies with
//! tiny_http. Each connection is handled on its own thread. Event streams
//! bypass tiny_http's buffered body writer and flush every event to the
//! socket as soon as it is produced.

mod health;

use crate::assistant::{ChatRequest, ChatService};
use crate::config::Settings;
use crate::error::{Error, Result};
use health::{unhealthy_body, EnvironmentInfo, HealthReport};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::io::{self, Cursor, Write};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

/// Streaming work: called with a sink for SSE events.
pub type StreamJob = Box<dyn FnOnce(&mut dyn FnMut(String) -> bool) + Send>;

/// Status line and headers of an event-stream reply. The body runs until
/// the connection closes.
const EVENT_STREAM_HEAD: &str = "HTTP/1.1 200 OK\r\n\
Content-Type: text/event-stream\r\n\
Cache-Control: no-cache\r\n\
Connection: close\r\n\r\n";

/// Fallback body when a reply cannot be serialized.
const INTERNAL_ERROR_BODY: &str = r#"{"success":false,"error":"Internal server error"}"#;

// ─────────────────────────────────────────────────────────────────────────────
// Routing
// ─────────────────────────────────────────────────────────────────────────────

/// What to send back for a request.
pub enum Reply {
    Json {
        status: u16,
        body: String,
        /// Add the no-cache header set used by the health route
        no_cache: bool,
    },
    Stream(StreamJob),
}

impl Reply {
    fn json(status: u16, body: String) -> Self {
        Reply::Json {
            status,
            body,
            no_cache: false,
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Reply::Json { status, .. } => *status,
            Reply::Stream(_) => 200,
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        error!("Failed to serialize reply: {}", e);
        INTERNAL_ERROR_BODY.to_string()
    })
}

/// Route table shared by every connection thread.
pub struct Api {
    chat: ChatService,
    started: Instant,
    port: u16,
}

impl Api {
    pub fn new(chat: ChatService, port: u16) -> Self {
        Self {
            chat,
            started: Instant::now(),
            port,
        }
    }

    /// Route one request. `path` may include a query string.
    pub fn handle(&self, method: &Method, path: &str, body: &str) -> Reply {
        let path = path.split('?').next().unwrap_or(path);

        match (method, path) {
            (Method::Post, "/api/chat") => match parse_chat_request(body) {
                Ok(request) => {
                    let reply = self.chat.respond(&request);
                    Reply::json(reply.status, to_json(&reply.body))
                }
                Err(reply) => reply,
            },
            (Method::Patch, "/api/chat") => match parse_chat_request(body) {
                Ok(request) => match self.chat.stream(&request) {
                    Ok(job) => Reply::Stream(Box::new(job)),
                    Err(reply) => Reply::json(reply.status, to_json(&reply.body)),
                },
                Err(reply) => reply,
            },
            (Method::Get, "/api/health") => self.health(),
            _ => Reply::json(
                404,
                to_json(&serde_json::json!({ "success": false, "error": "Not found" })),
            ),
        }
    }

    fn health(&self) -> Reply {
        let environment = EnvironmentInfo::current(self.chat.has_credential(), self.port);
        let report = HealthReport::collect(self.started, environment);

        let (status, body) = match serde_json::to_string(&report) {
            Ok(body) => (200, body),
            Err(e) => {
                error!("Health check failed: {}", e);
                (503, unhealthy_body(&e.to_string()))
            }
        };
        Reply::Json {
            status,
            body,
            no_cache: true,
        }
    }
}

fn parse_chat_request(body: &str) -> std::result::Result<ChatRequest, Reply> {
    serde_json::from_str(body).map_err(|e| {
        warn!("Rejected chat request body: {}", e);
        Reply::json(
            400,
            to_json(&serde_json::json!({ "success": false, "error": "Invalid request body" })),
        )
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Socket Loop
// ─────────────────────────────────────────────────────────────────────────────

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

fn headers(pairs: &[(&str, &str)]) -> Vec<Header> {
    pairs
        .iter()
        .filter_map(|(name, value)| header(name, value))
        .collect()
}

/// Bind to the configured address and serve until the process exits.
pub fn serve(settings: &Settings) -> Result<()> {
    let address = settings.server.address();
    let server = Server::http(&address)
        .map_err(|e| Error::Server(format!("Failed to bind {}: {}", address, e)))?;

    let chat = ChatService::from_settings(&settings.assistant);
    let api = Arc::new(Api::new(chat, settings.server.port));
    info!("Listening on {}", settings.server.base_url());

    for request in server.incoming_requests() {
        let api = Arc::clone(&api);
        thread::spawn(move || handle_request(&api, request));
    }
    Ok(())
}

fn handle_request(api: &Api, mut request: Request) {
    let method = request.method().clone();
    let url = request.url().to_string();

    let mut body = String::new();
    if let Err(e) = request.as_reader().read_to_string(&mut body) {
        warn!("{} {}: failed to read body: {}", method, url, e);
    }

    let reply = api.handle(&method, &url, &body);
    info!("{} {} -> {}", method, url, reply.status());

    let result = match reply {
        Reply::Json {
            status,
            body,
            no_cache,
        } => {
            let mut pairs = vec![("Content-Type", "application/json")];
            if no_cache {
                pairs.extend([
                    ("Cache-Control", "no-cache, no-store, must-revalidate"),
                    ("Pragma", "no-cache"),
                    ("Expires", "0"),
                ]);
            }
            let length = body.len();
            request.respond(Response::new(
                StatusCode(status),
                headers(&pairs),
                Cursor::new(body.into_bytes()),
                Some(length),
                None,
            ))
        }
        Reply::Stream(job) => {
            let mut writer = request.into_writer();
            write_event_stream(&mut *writer, job)
        }
    };

    if let Err(e) = result {
        warn!("{} {}: failed to send response: {}", method, url, e);
    }
}

/// Run `job`, writing and flushing each event as it arrives.
///
/// A failed write means the client went away; the job is told to stop and
/// the error is returned once it has.
fn write_event_stream(writer: &mut dyn Write, job: StreamJob) -> io::Result<()> {
    writer.write_all(EVENT_STREAM_HEAD.as_bytes())?;
    writer.flush()?;

    let mut failure = None;
    let mut events = 0usize;
    job(&mut |event: String| {
        match writer
            .write_all(event.as_bytes())
            .and_then(|()| writer.flush())
        {
            Ok(()) => {
                events += 1;
                true
            }
            Err(e) => {
                failure = Some(e);
                false
            }
        }
    });
    debug!("Event stream closed after {} events", events);

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
