//! Command line interface
//!
//! Every subcommand is a thin wrapper over the library modules: exports go
//! through [`Exporter`], document commands through [`DocumentStore`] and a
//! [`DocumentSession`], and chat through a [`ChatSession`].

use crate::assistant::{
    propose_edit, AssistantError, ChatAction, ChatBackend, ChatResponse, ChatService,
    ChatSession, DirectChatBackend, HttpChatBackend, SubmitOutcome,
};
use crate::config::{
    load_config, load_config_from, resolve_data_dir, save_config_silent, save_config_to, Settings,
};
use crate::editor::{diff_with, DiffMode, DocumentSession, SessionEvent, TextStats};
use crate::error::{Error, Result, ResultExt};
use crate::events::drain;
use crate::export::{ExportFormat, Exporter};
use crate::server;
use crate::storage::{DocumentStore, FileBackend, Folder, SortOrder, StoreEvent, UNTITLED};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How often a pending chat reply is checked for
const CHAT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How often a still-pending chat reply is reported
const CHAT_NOTICE_INTERVAL: Duration = Duration::from_secs(5);

/// Colour given to folders created without `--color`
const DEFAULT_FOLDER_COLOR: &str = "#0066cc";

/// Scribe - Markdown writing assistant
#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the document store
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the chat and health HTTP server
    Serve {
        /// Interface to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Export a Markdown file
    Export {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Output format (defaults to the last one used)
        #[arg(short, long, value_enum)]
        format: Option<ExportFormat>,
        /// Directory to write the export into
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out: PathBuf,
        /// Document title (defaults to the file name)
        #[arg(short, long)]
        title: Option<String>,
        /// Open the exported file afterwards
        #[arg(long)]
        open: bool,
    },

    /// Show changed lines between two files
    Diff {
        original: PathBuf,
        proposed: PathBuf,
        /// Align lines with LCS instead of comparing by position
        #[arg(long)]
        aligned: bool,
    },

    /// Print word, character and reading-time statistics
    Stats {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Manage stored documents
    Docs {
        #[command(subcommand)]
        command: DocsCommand,
    },

    /// Ask the assistant about a document
    Chat {
        message: String,
        /// Markdown file the question is about
        #[arg(short, long, value_name = "FILE", conflicts_with = "doc")]
        file: Option<PathBuf>,
        /// Stored document the question is about
        #[arg(long, value_name = "ID")]
        doc: Option<String>,
        #[arg(short, long, value_enum, default_value_t = ChatAction::Chat)]
        action: ChatAction,
        /// Chat server base URL (defaults to the configured server)
        #[arg(long, value_name = "URL", conflicts_with = "direct")]
        server_url: Option<String>,
        /// Call the AI provider directly instead of a running server
        #[arg(long)]
        direct: bool,
        /// Write the revised document back (edit action only)
        #[arg(long)]
        apply: bool,
        /// Preview changes with LCS alignment
        #[arg(long)]
        aligned: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum DocsCommand {
    /// List documents with collection totals
    List {
        /// Only documents whose title, content or tags contain this
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value_t = SortOrder::Modified)]
        sort: SortOrder,
    },
    /// Create a document
    New {
        #[arg(short, long)]
        title: Option<String>,
        /// Initial content
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Print a document's content
    Show { id: String },
    Rename { id: String, title: String },
    /// Replace a document's content with a file, printing the changed lines
    Edit {
        id: String,
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Align lines with LCS instead of comparing by position
        #[arg(long)]
        aligned: bool,
        /// Only print the changes
        #[arg(long)]
        dry_run: bool,
    },
    Duplicate { id: String },
    Delete { id: String },
    /// Add tags to a document
    Tag {
        id: String,
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Export a stored document
    Export {
        id: String,
        #[arg(short, long, value_enum)]
        format: Option<ExportFormat>,
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out: PathBuf,
        #[arg(long)]
        open: bool,
    },
    /// List folders, optionally adding one
    Folders {
        /// Name of a folder to create
        #[arg(long, value_name = "NAME")]
        add: Option<String>,
        /// Colour of the new folder
        #[arg(long, default_value = DEFAULT_FOLDER_COLOR)]
        color: String,
    },
    /// Print store changes made by other processes
    Watch {
        /// Seconds between checks
        #[arg(long, default_value_t = 1)]
        interval: u64,
        /// Stop after this many checks
        #[arg(long)]
        checks: Option<u64>,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Context
// ─────────────────────────────────────────────────────────────────────────────

/// Settings plus where to save them back.
struct Context {
    settings: Settings,
    config_path: Option<PathBuf>,
    /// `--data-dir` override, not persisted
    data_dir: Option<PathBuf>,
}

impl Context {
    fn load(cli: &Cli) -> Self {
        let settings = match &cli.config {
            Some(path) => load_config_from(path)
                .unwrap_or_warn_default(Settings::default(), "Failed to load configuration"),
            None => load_config(),
        };
        Self {
            settings,
            config_path: cli.config.clone(),
            data_dir: cli.data_dir.clone(),
        }
    }

    fn save(&self) {
        match &self.config_path {
            Some(path) => {
                if let Err(e) = save_config_to(&self.settings, path) {
                    warn!("Failed to save configuration: {}", e);
                }
            }
            None => {
                save_config_silent(&self.settings);
            }
        }
    }

    fn open_store(&self) -> Result<DocumentStore> {
        let dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => resolve_data_dir(&self.settings)?,
        };
        Ok(DocumentStore::open(FileBackend::new(dir)))
    }

    fn exporter(&self, open: bool) -> Exporter {
        let options = self.settings.export.default_options.clone();
        let open = open || options.open_after_export;
        Exporter::new(options.with_open_after_export(open))
    }

    /// Resolve the format and remember it for next time.
    fn export_format(&mut self, requested: Option<ExportFormat>) -> ExportFormat {
        let format = requested.unwrap_or(self.settings.export.last_format);
        if format != self.settings.export.last_format {
            self.settings.export.last_format = format;
            self.save();
        }
        format
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

/// Execute the parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let mut ctx = Context::load(&cli);

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                ctx.settings.server.host = host;
            }
            if let Some(port) = port {
                ctx.settings.server.port = port;
            }
            ctx.settings.sanitize();
            server::serve(&ctx.settings)
        }
        Command::Export {
            file,
            format,
            out,
            title,
            open,
        } => {
            let content = read_file(&file)?;
            let title = title.unwrap_or_else(|| file_title(&file));
            let format = ctx.export_format(format);
            let path = export_to(&ctx.exporter(open), &content, &title, format, &out)?;
            println!("{}", path.display());
            Ok(())
        }
        Command::Diff {
            original,
            proposed,
            aligned,
        } => {
            let changes = diff_with(
                &read_file(&original)?,
                &read_file(&proposed)?,
                diff_mode(aligned),
            );
            if changes.is_empty() {
                println!("No changes");
            }
            for change in &changes {
                println!("{}", change);
            }
            Ok(())
        }
        Command::Stats { file } => {
            println!("{}", TextStats::from_text(&read_file(&file)?));
            Ok(())
        }
        Command::Docs { command } => run_docs(&mut ctx, command),
        Command::Chat {
            message,
            file,
            doc,
            action,
            server_url,
            direct,
            apply,
            aligned,
        } => {
            let backend: Arc<dyn ChatBackend> = if direct {
                Arc::new(DirectChatBackend::new(ChatService::from_settings(
                    &ctx.settings.assistant,
                )))
            } else {
                let url = server_url.unwrap_or_else(|| ctx.settings.server.base_url());
                let timeout = Duration::from_secs(ctx.settings.assistant.timeout_secs);
                Arc::new(HttpChatBackend::new(&url, timeout))
            };
            let target = match (doc, file) {
                (Some(id), _) => ChatTarget::Document(id),
                (None, Some(path)) => ChatTarget::File(path),
                (None, None) => ChatTarget::None,
            };
            run_chat(&ctx, backend, &message, target, action, apply, diff_mode(aligned))
        }
    }
}

fn run_docs(ctx: &mut Context, command: DocsCommand) -> Result<()> {
    let mut store = ctx.open_store()?;

    match command {
        DocsCommand::List { search, sort } => {
            for record in store.query(search.as_deref(), sort) {
                println!(
                    "{}  {}  ({} words, {})",
                    record.id,
                    record.title,
                    record.word_count,
                    record.last_modified.format("%Y-%m-%d %H:%M")
                );
            }
            let stats = store.stats(Utc::now());
            println!(
                "{} documents, {} words, {} modified this week",
                stats.total_documents, stats.total_words, stats.recent_documents
            );
        }
        DocsCommand::New { title, file } => {
            let record = match (title, file) {
                (None, None) => store.create()?,
                (title, file) => {
                    let content = match &file {
                        Some(path) => read_file(path)?,
                        None => String::new(),
                    };
                    let title = title
                        .or_else(|| file.as_deref().map(file_title))
                        .unwrap_or_else(|| UNTITLED.to_string());
                    store.create_with(&title, &content)?
                }
            };
            println!("{}", record.id);
        }
        DocsCommand::Show { id } => {
            let record = store.get(&id).ok_or(Error::DocumentNotFound(id.clone()))?;
            info!(
                "{}: {}",
                record.id,
                TextStats::from_text(&record.content).format_compact()
            );
            println!("# {}\n", record.title);
            println!("{}", record.content);
        }
        DocsCommand::Rename { id, title } => {
            if title.trim().is_empty() {
                return Err(Error::Usage("Title must not be blank".to_string()));
            }
            let mut session = open_session(&store, &id)?;
            let events = session.subscribe();
            session.rename(&mut store, &title)?;
            log_session_events(&session, &events);
        }
        DocsCommand::Edit {
            id,
            file,
            aligned,
            dry_run,
        } => {
            let content = read_file(&file)?;
            let mut session = open_session(&store, &id)?;
            let events = session.subscribe();

            let changes = session.preview(&content, diff_mode(aligned));
            if changes.is_empty() {
                println!("No changes");
                return Ok(());
            }
            for change in &changes {
                println!("{}", change);
            }
            if !dry_run {
                session.update_content(&mut store, &content)?;
                log_session_events(&session, &events);
            }
        }
        DocsCommand::Duplicate { id } => {
            let copy = store.duplicate(&id)?;
            println!("{}", copy.id);
        }
        DocsCommand::Delete { id } => store.delete(&id)?,
        DocsCommand::Tag { id, tags } => {
            let record = store.add_tags(&id, &tags)?;
            println!("{}", record.tags.join(", "));
        }
        DocsCommand::Export {
            id,
            format,
            out,
            open,
        } => {
            let record = store
                .get(&id)
                .cloned()
                .ok_or(Error::DocumentNotFound(id))?;
            let format = ctx.export_format(format);
            let path = export_to(
                &ctx.exporter(open),
                &record.content,
                &record.title,
                format,
                &out,
            )?;
            println!("{}", path.display());
        }
        DocsCommand::Folders { add, color } => {
            if let Some(name) = add {
                let name = name.trim();
                if name.is_empty() {
                    return Err(Error::Usage("Folder name must not be blank".to_string()));
                }
                let mut folders = store.folders();
                folders.push(Folder::new(name, &color));
                store.save_folders(folders)?;
            }
            for folder in store.folders() {
                println!("{}  {}  {}", folder.id, folder.name, folder.color);
            }
        }
        DocsCommand::Watch { interval, checks } => {
            let interval = Duration::from_secs(interval);
            watch_store(&mut store, interval, checks, |event| println!("{:?}", event));
        }
    }
    Ok(())
}

fn open_session(store: &DocumentStore, id: &str) -> Result<DocumentSession> {
    let record = store
        .get(id)
        .ok_or_else(|| Error::DocumentNotFound(id.to_string()))?;
    Ok(DocumentSession::from_record(record))
}

fn log_session_events(session: &DocumentSession, events: &Receiver<SessionEvent>) {
    let id = session.document_id().unwrap_or("unsaved");
    for event in drain(events) {
        debug!("Session event on {}: {:?}", id, event);
    }
}

/// Re-read the store every `interval` and hand each change to `on_event`.
///
/// Runs until `checks` reloads have been attempted, or forever when `None`.
/// Returns the number of events seen.
fn watch_store(
    store: &mut DocumentStore,
    interval: Duration,
    checks: Option<u64>,
    mut on_event: impl FnMut(&StoreEvent),
) -> usize {
    let events = store.subscribe();
    let mut seen = 0;
    let mut done = 0;
    info!("Watching {} documents", store.documents().len());

    while checks.map_or(true, |limit| done < limit) {
        if done > 0 {
            thread::sleep(interval);
        }
        store.refresh();
        for event in drain(&events) {
            on_event(&event);
            seen += 1;
        }
        done += 1;
    }
    seen
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────────────────────────────────────

enum ChatTarget {
    None,
    File(PathBuf),
    Document(String),
}

fn run_chat(
    ctx: &Context,
    backend: Arc<dyn ChatBackend>,
    message: &str,
    target: ChatTarget,
    action: ChatAction,
    apply: bool,
    mode: DiffMode,
) -> Result<()> {
    let mut store = match &target {
        ChatTarget::Document(_) => Some(ctx.open_store()?),
        _ => None,
    };

    let mut document = match (&target, store.as_ref()) {
        (ChatTarget::Document(id), Some(store)) => {
            let record = store.get(id).ok_or(Error::DocumentNotFound(id.clone()))?;
            DocumentSession::from_record(record)
        }
        (ChatTarget::File(path), _) => DocumentSession::unsaved(&file_title(path), &read_file(path)?),
        _ => DocumentSession::scratch(),
    };

    let mut chat = ChatSession::new(backend);
    match chat.submit(message, document.title(), document.content(), action) {
        SubmitOutcome::Sent => {}
        SubmitOutcome::Empty => return Err(AssistantError::EmptyMessage.into()),
        SubmitOutcome::Busy => return Err(Error::Usage("Chat is busy".to_string())),
    }
    let response = await_reply(&mut chat)?;

    if !response.success {
        let error = response.error.unwrap_or_default();
        let message = match response.details {
            Some(details) => format!("{}: {}", error, details),
            None => error,
        };
        return Err(AssistantError::Provider(message).into());
    }

    let reply = response.response.unwrap_or_default();
    println!("{}", reply);

    if action != ChatAction::Edit {
        return Ok(());
    }

    let Some(proposal) = propose_edit(&reply, document.content(), mode) else {
        info!("Reply contains no revised document");
        return Ok(());
    };
    println!();
    for change in &proposal.changes {
        println!("{}", change);
    }
    if !apply || proposal.is_noop() {
        return Ok(());
    }

    match (&target, store.as_mut()) {
        (ChatTarget::Document(_), Some(store)) => {
            let events = document.subscribe();
            document.apply_assistant_edit(store, &proposal.content)?;
            log_session_events(&document, &events);
        }
        (ChatTarget::File(path), _) => {
            fs::write(path, &proposal.content).map_err(|e| Error::FileWrite {
                path: path.clone(),
                source: e,
            })?;
            info!("Applied edit to {}", path.display());
        }
        _ => warn!("No document to apply the edit to"),
    }
    Ok(())
}

/// Poll `chat` until its reply arrives, reporting every few seconds.
fn await_reply(chat: &mut ChatSession) -> Result<ChatResponse> {
    let started = Instant::now();
    let mut next_notice = CHAT_NOTICE_INTERVAL;
    loop {
        if let Some(result) = chat.poll() {
            return Ok(result?);
        }
        if !chat.is_processing() {
            return Err(AssistantError::Transport("no reply".to_string()).into());
        }
        if started.elapsed() >= next_notice {
            info!("Waiting for the assistant ({}s)", started.elapsed().as_secs());
            next_notice += CHAT_NOTICE_INTERVAL;
        }
        thread::sleep(CHAT_POLL_INTERVAL);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn diff_mode(aligned: bool) -> DiffMode {
    if aligned {
        DiffMode::Aligned
    } else {
        DiffMode::Positional
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

/// File stem used as a title when none is given.
fn file_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| UNTITLED.to_string())
}

fn export_to(
    exporter: &Exporter,
    content: &str,
    title: &str,
    format: ExportFormat,
    out: &Path,
) -> Result<PathBuf> {
    let file = exporter.export(content, title, format)?;
    let path = file.write_to(out)?;

    if exporter.options().open_after_export {
        if let Err(e) = open::that(&path) {
            warn!("Failed to open {}: {}", path.display(), e);
        }
    }
    Ok(path)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Env {
        _dir: TempDir,
        data: PathBuf,
        config: PathBuf,
        root: PathBuf,
    }

    fn env() -> Env {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        Env {
            data: root.join("data"),
            config: root.join("config.json"),
            root,
            _dir: dir,
        }
    }

    fn cli(env: &Env, args: &[&str]) -> Cli {
        let mut argv = vec![
            "scribe".to_string(),
            "--config".to_string(),
            env.config.display().to_string(),
            "--data-dir".to_string(),
            env.data.display().to_string(),
        ];
        argv.extend(args.iter().map(|a| a.to_string()));
        Cli::parse_from(argv)
    }

    fn store(env: &Env) -> DocumentStore {
        DocumentStore::open(FileBackend::new(&env.data))
    }

    #[test]
    fn test_parse_export() {
        let cli = Cli::parse_from(["scribe", "export", "notes.md", "--format", "pdf"]);
        match cli.command {
            Command::Export { file, format, out, .. } => {
                assert_eq!(file, PathBuf::from("notes.md"));
                assert_eq!(format, Some(ExportFormat::Pdf));
                assert_eq!(out, PathBuf::from("."));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_chat_defaults() {
        let cli = Cli::parse_from(["scribe", "chat", "fix typos", "--file", "a.md"]);
        match cli.command {
            Command::Chat {
                action, direct, apply, ..
            } => {
                assert_eq!(action, ChatAction::Chat);
                assert!(!direct);
                assert!(!apply);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_conflicting_chat_sources() {
        let result = Cli::try_parse_from([
            "scribe", "chat", "hi", "--file", "a.md", "--doc", "doc_1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_docs_list_sort() {
        let cli = Cli::parse_from(["scribe", "docs", "list", "--sort", "word-count"]);
        match cli.command {
            Command::Docs {
                command: DocsCommand::List { sort, search },
            } => {
                assert_eq!(sort, SortOrder::WordCount);
                assert!(search.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_docs_lifecycle() {
        let env = env();
        let source = env.root.join("plan.md");
        fs::write(&source, "# Plan\n\nship it").unwrap();

        run(cli(&env, &["docs", "new", "--file", source.to_str().unwrap()])).unwrap();
        let id = store(&env).documents()[0].id.clone();
        assert_eq!(store(&env).documents()[0].title, "plan");

        run(cli(&env, &["docs", "rename", &id, "Launch plan"])).unwrap();
        run(cli(&env, &["docs", "tag", &id, "work", " work ", "q3"])).unwrap();
        run(cli(&env, &["docs", "duplicate", &id])).unwrap();

        let reopened = store(&env);
        assert_eq!(reopened.documents().len(), 2);
        let original = reopened.get(&id).unwrap();
        assert_eq!(original.title, "Launch plan");
        assert_eq!(original.tags, vec!["work".to_string(), "q3".to_string()]);

        run(cli(&env, &["docs", "delete", &id])).unwrap();
        assert_eq!(store(&env).documents().len(), 1);
        assert!(run(cli(&env, &["docs", "show", &id])).is_err());
    }

    #[test]
    fn test_rename_to_blank_fails() {
        let env = env();
        run(cli(&env, &["docs", "new"])).unwrap();
        let id = store(&env).documents()[0].id.clone();
        assert!(run(cli(&env, &["docs", "rename", &id, "   "])).is_err());
        assert_eq!(store(&env).documents()[0].title, UNTITLED);
    }

    #[test]
    fn test_export_remembers_format() {
        let env = env();
        let source = env.root.join("My Notes.md");
        fs::write(&source, "# Notes\n\n- one").unwrap();
        let out = env.root.join("out");

        run(cli(
            &env,
            &[
                "export",
                source.to_str().unwrap(),
                "--format",
                "markdown",
                "--out",
                out.to_str().unwrap(),
            ],
        ))
        .unwrap();

        let written: Vec<_> = fs::read_dir(&out).unwrap().collect();
        assert_eq!(written.len(), 1);
        let path = written[0].as_ref().unwrap().path();
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("My_Notes_"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Notes\n\n- one");

        let settings = load_config_from(&env.config).unwrap();
        assert_eq!(settings.export.last_format, ExportFormat::Markdown);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let env = env();
        let missing = env.root.join("missing.md");
        let err = run(cli(&env, &["stats", missing.to_str().unwrap()])).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }

    #[test]
    fn test_docs_edit_saves_through_session() {
        let env = env();
        run(cli(&env, &["docs", "new", "--title", "Plan"])).unwrap();
        let id = store(&env).documents()[0].id.clone();
        let revised = env.root.join("revised.md");
        fs::write(&revised, "# Plan\n\nship friday").unwrap();
        let path = revised.to_str().unwrap();

        run(cli(&env, &["docs", "edit", &id, path, "--dry-run"])).unwrap();
        assert_eq!(store(&env).get(&id).unwrap().content, "");

        run(cli(&env, &["docs", "edit", &id, path, "--aligned"])).unwrap();
        let saved = store(&env);
        let record = saved.get(&id).unwrap();
        assert_eq!(record.content, "# Plan\n\nship friday");
        assert_eq!(record.word_count, 4);
    }

    #[test]
    fn test_docs_edit_unknown_document() {
        let env = env();
        let file = env.root.join("x.md");
        fs::write(&file, "x").unwrap();
        let err = run(cli(&env, &["docs", "edit", "doc_missing", file.to_str().unwrap()])).unwrap_err();
        assert!(matches!(err, Error::DocumentNotFound(_)));
    }

    #[test]
    fn test_docs_folders_add() {
        let env = env();
        run(cli(&env, &["docs", "folders", "--add", "Work", "--color", "#ff0000"])).unwrap();
        run(cli(&env, &["docs", "folders"])).unwrap();

        let folders = store(&env).folders();
        assert_eq!(folders.len(), 2);
        assert_eq!(folders[0].name, "My Documents");
        assert_eq!(folders[1].name, "Work");
        assert_eq!(folders[1].color, "#ff0000");

        assert!(run(cli(&env, &["docs", "folders", "--add", "  "])).is_err());
    }

    #[test]
    fn test_watch_reports_changes_from_other_writers() {
        let env = env();
        let mut watcher = store(&env);
        let mut writer = store(&env);
        writer.create_with("Elsewhere", "written by another process").unwrap();

        let mut seen = Vec::new();
        let count = watch_store(&mut watcher, Duration::ZERO, Some(2), |event| {
            seen.push(event.clone())
        });
        assert_eq!(count, 1);
        assert_eq!(seen, vec![StoreEvent::Reloaded]);
        assert_eq!(watcher.documents().len(), 1);
    }

    #[test]
    fn test_await_reply_returns_failed_response() {
        let backend = Arc::new(DirectChatBackend::new(ChatService::new(None)));
        let mut chat = ChatSession::new(backend);
        assert_eq!(chat.submit("hi", "T", "", ChatAction::Chat), SubmitOutcome::Sent);

        let response = await_reply(&mut chat).unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("API key not configured"));
        assert!(!chat.is_processing());
    }

    #[test]
    fn test_file_title() {
        assert_eq!(file_title(Path::new("/tmp/draft.md")), "draft");
        assert_eq!(file_title(Path::new("/")), UNTITLED);
    }
}
