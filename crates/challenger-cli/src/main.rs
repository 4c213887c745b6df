//! challenger - save and restore API challenge sessions from the terminal.
//!
//! Keeps a local copy of a session's challenge progress and todo database so
//! it can be pushed back to the server later, e.g. after the server restarts
//! and forgets the session.

use std::io;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use challenger_core::{
    ActionState, ApiClient, ChallengeTracker, Config, FileStore, RestoreOutcome, SaveAction,
    SessionId, SnapshotKind,
};

#[derive(Parser)]
#[command(name = "challenger")]
#[command(about = "Save and restore API challenge sessions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List sessions used on this machine
    List,
    /// Make a session the current one
    Use {
        /// Session GUID
        id: String,
    },
    /// Forget a session and delete its saved snapshots
    Forget {
        /// Session GUID
        id: String,
    },
    /// Show challenge progress and what can be saved or restored
    Status {
        /// Session GUID (defaults to the current session)
        id: Option<String>,
    },
    /// Save the live server state locally
    Save {
        /// Session GUID (defaults to the current session)
        id: Option<String>,
        #[command(flatten)]
        kinds: KindArgs,
    },
    /// Push the locally saved state back to the server
    Restore {
        /// Session GUID (defaults to the current session)
        id: Option<String>,
        #[command(flatten)]
        kinds: KindArgs,
    },
}

#[derive(clap::Args)]
struct KindArgs {
    /// Only challenge progress
    #[arg(long, conflicts_with = "data")]
    progress: bool,
    /// Only the todo database
    #[arg(long)]
    data: bool,
}

impl KindArgs {
    fn selected(&self) -> Vec<SnapshotKind> {
        match (self.progress, self.data) {
            (true, false) => vec![SnapshotKind::Progress],
            (false, true) => vec![SnapshotKind::Data],
            _ => SnapshotKind::ALL.to_vec(),
        }
    }
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let config = Config::load().context("Failed to load config")?;
    let store = FileStore::open(config.storage_dir()?)?;
    let client = ApiClient::new(&config.base_url())?;
    info!(server = %client.base_url(), storage = %store.path().display(), "challenger starting");

    let tracker = ChallengeTracker::new(
        Arc::new(store),
        Arc::new(client.clone()),
        config.marker_ttl_days(),
    );

    match cli.command {
        Commands::List => list(&tracker),
        Commands::Use { id } => {
            let id = parse_id(&id)?;
            if !id.is_guid() {
                warn!(session = %id, "Session id does not look like a GUID");
            }
            tracker.adopt(&id)?;
            println!("Current session: {}", id);
            Ok(())
        }
        Commands::Forget { id } => {
            let id = parse_id(&id)?;
            tracker.forget(&id)?;
            println!("Forgot {}", id);
            Ok(())
        }
        Commands::Status { id } => {
            let id = resolve_session(&tracker, id)?;
            status(&tracker, &client, &id).await
        }
        Commands::Save { id, kinds } => {
            let id = resolve_session(&tracker, id)?;
            save(&tracker, &client, &id, &kinds.selected()).await
        }
        Commands::Restore { id, kinds } => {
            let id = resolve_session(&tracker, id)?;
            restore(&tracker, &id, &kinds.selected()).await
        }
    }
}

fn parse_id(raw: &str) -> Result<SessionId> {
    SessionId::new(raw.trim()).with_context(|| format!("Invalid session id: {:?}", raw))
}

/// Explicit id, else the current session.
fn resolve_session(tracker: &ChallengeTracker, id: Option<String>) -> Result<SessionId> {
    match id {
        Some(raw) => parse_id(&raw),
        None => tracker
            .current()
            .context("No current session - pass a session id or run `challenger use <id>`"),
    }
}

fn list(tracker: &ChallengeTracker) -> Result<()> {
    let sessions = tracker.sessions();
    if sessions.is_empty() {
        println!("No sessions used yet.");
        return Ok(());
    }

    let current = tracker.current();
    println!("Previously used:");
    for id in sessions {
        let marker = if current.as_ref() == Some(&id) { "*" } else { " " };
        let saved: Vec<&str> = SnapshotKind::ALL
            .into_iter()
            .filter(|&kind| tracker.cache().has(&id, kind))
            .map(SnapshotKind::key_suffix)
            .collect();
        if saved.is_empty() {
            println!("{} {}", marker, id);
        } else {
            println!("{} {}  (saved: {})", marker, id, saved.join(", "));
        }
    }
    Ok(())
}

fn describe(label: &str, action: &ActionState) -> String {
    let save = match action.save {
        Some(SaveAction::Offered) => "unsaved changes",
        Some(SaveAction::AlreadySaved) => "saved",
        None => "not available on server",
    };
    let restore = if action.restore_available {
        "restore available"
    } else {
        "nothing to restore"
    };
    format!("{}: {}, {}", label, save, restore)
}

async fn status(tracker: &ChallengeTracker, client: &ApiClient, id: &SessionId) -> Result<()> {
    let live = client.fetch_live(id).await;
    if let Err(ref e) = live.progress {
        warn!(session = %id, error = %e, "Could not fetch live progress");
    }
    if let Err(ref e) = live.data {
        warn!(session = %id, error = %e, "Could not fetch live database");
    }

    let status = tracker.status(id, live.progress(), live.data());

    println!("Session {}", id);
    if let Some(summary) = status.summary {
        println!(
            "{} Challenges: {} complete, {} remain.",
            summary.total, summary.complete, summary.remaining
        );
    }
    if let Some(count) = status.todo_count {
        println!("{} todos in database.", count);
    }
    println!("{}", describe("Progress", &status.progress));
    println!("{}", describe("Todos", &status.data));
    Ok(())
}

async fn save(
    tracker: &ChallengeTracker,
    client: &ApiClient,
    id: &SessionId,
    kinds: &[SnapshotKind],
) -> Result<()> {
    let live = client.fetch_live(id).await;
    let mut failed = false;

    for &kind in kinds {
        let saved = match kind {
            SnapshotKind::Progress => match &live.progress {
                Ok(progress) if !tracker.cache().is_dirty(id, progress) => None,
                Ok(progress) => Some(tracker.save_progress(id, progress)),
                Err(e) => {
                    eprintln!("Could not fetch progress: {}", e);
                    failed = true;
                    continue;
                }
            },
            SnapshotKind::Data => match &live.data {
                Ok(data) if !tracker.cache().is_dirty(id, data) => None,
                Ok(data) => Some(tracker.save_data(id, data)),
                Err(e) => {
                    eprintln!("Could not fetch todos: {}", e);
                    failed = true;
                    continue;
                }
            },
        };

        match saved {
            None => println!("{}: already saved", kind),
            Some(Ok(())) => println!("{}: saved", kind),
            Some(Err(e)) => {
                eprintln!("{}: {:#}", kind, e);
                failed = true;
            }
        }
    }

    if failed {
        bail!("Some snapshots were not saved");
    }
    Ok(())
}

async fn restore(tracker: &ChallengeTracker, id: &SessionId, kinds: &[SnapshotKind]) -> Result<()> {
    let mut failed = false;

    for &kind in kinds {
        let result = match kind {
            SnapshotKind::Progress => tracker.restore_progress(id).await,
            SnapshotKind::Data => tracker.restore_data(id).await,
        };

        match result {
            Ok(RestoreOutcome::NothingCached) => println!("{}: nothing saved locally", kind),
            Ok(RestoreOutcome::Restored { acknowledgment }) => {
                println!("{}: restored", kind);
                info!(session = %id, kind = %kind, response = %acknowledgment, "Server acknowledged restore");
            }
            Err(e) => {
                eprintln!("{}: restore failed: {}", kind, e);
                failed = true;
            }
        }
    }

    if failed {
        bail!("Restore failed");
    }
    Ok(())
}
