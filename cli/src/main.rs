//! `redink` command line entry point.
//!
//! Wires config, the stored session, and the API client together, then hands
//! off to one handler per subcommand. Logs go to a file under `~/.redink` so
//! stdout carries nothing but command output.

mod commands;
mod config;
mod render;
mod session;

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use redink_api::ApiClient;
use redink_types::{WritingId, WritingType};

use crate::config::RedinkConfig;

#[derive(Parser)]
#[command(
    name = "redink",
    version,
    about = "Practice writing and get AI feedback from the terminal"
)]
struct Cli {
    /// Server base URL, e.g. http://localhost:8080/api/v1.
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account.
    Signup { email: String },
    /// Sign in and store the session locally.
    Login { email: String },
    /// Sign out and discard the stored session.
    Logout,
    /// Show the signed-in account.
    Whoami,
    /// List your writings.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Print one writing.
    Show { id: WritingId },
    /// Create a writing from --content, --file, or stdin.
    New {
        /// Kind of writing: essay or cover_letter.
        #[arg(long = "type")]
        kind: WritingType,
        title: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(long, conflicts_with = "content")]
        file: Option<PathBuf>,
    },
    /// Change a writing's type, title, or content.
    Edit {
        id: WritingId,
        #[arg(long = "type")]
        kind: Option<WritingType>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long, conflicts_with = "content")]
        file: Option<PathBuf>,
    },
    /// Delete a writing.
    Delete {
        id: WritingId,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Submit a draft for AI analysis.
    Submit {
        id: WritingId,
        /// Stay attached and report progress until the analysis finishes.
        #[arg(long)]
        watch: bool,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Follow a running analysis until it finishes.
    Watch { id: WritingId },
    /// Print the latest analysis for a writing.
    Analysis { id: WritingId },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    let (log_file, init_warnings) = open_redink_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // If we can't open a log file, prefer "no logs" over mixing them into
    // command output on stdout/stderr.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_redink_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let candidates = redink_log_file_candidates();
    let mut warnings = Vec::new();

    for candidate in candidates {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn redink_log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.redink/logs/redink.log
    if let Some(config_path) = RedinkConfig::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("redink.log"));
    }

    // Fallback: ./.redink/logs/redink.log (useful in constrained environments)
    candidates.push(PathBuf::from(".redink").join("logs").join("redink.log"));

    candidates
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config = match RedinkConfig::load() {
        Ok(config) => config,
        Err(err) => {
            render::warn(&format!("{err}; continuing with defaults"));
            None
        }
    };
    let base_url = config::resolve_base_url(cli.server, config.as_ref());

    let client = Arc::new(
        ApiClient::new(&base_url)
            .with_context(|| format!("cannot talk to server '{base_url}'"))?,
    );

    match session::load() {
        Ok(Some(stored)) => client.set_session(stored.as_session()),
        Ok(None) => {}
        Err(err) => render::warn(&format!("{err:#}; continuing signed out")),
    }

    match cli.command {
        Command::Signup { email } => commands::signup(&client, email).await,
        Command::Login { email } => commands::login(&client, email).await,
        Command::Logout => commands::logout(&client).await,
        Command::Whoami => commands::whoami(&client).await,
        Command::List { page, limit } => commands::list(&client, page, limit).await,
        Command::Show { id } => commands::show(&client, id).await,
        Command::New {
            kind,
            title,
            content,
            file,
        } => commands::create(&client, kind, title, content, file).await,
        Command::Edit {
            id,
            kind,
            title,
            content,
            file,
        } => commands::edit(&client, id, kind, title, content, file).await,
        Command::Delete { id, yes } => commands::delete(&client, id, yes).await,
        Command::Submit { id, watch, yes } => commands::submit(&client, id, watch, yes).await,
        Command::Watch { id } => commands::watch(&client, id).await,
        Command::Analysis { id } => commands::analysis(&client, id).await,
    }
}
