//! Scribe - Main Entry Point
//!
//! A Markdown writing assistant: DOCX, PDF, HTML and Markdown export, line
//! change previews, a local document store and an AI chat endpoint.

mod assistant;
mod cli;
mod config;
mod editor;
mod error;
mod events;
mod export;
mod markdown;
mod server;
mod storage;

use clap::Parser;
use cli::Cli;
use log::{error, info};
use std::process::ExitCode;

/// Application name constant.
const APP_NAME: &str = "Scribe";

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    info!("Starting {} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
