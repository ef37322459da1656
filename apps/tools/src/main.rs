use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use shared::domain::SessionId;
use storage::{SessionStore, Storage};
use wizard::load_manifest;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/sessions.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a step manifest without starting the server.
    ValidateManifest { path: PathBuf },
    ListSessions {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    ShowSession {
        session_id: String,
        /// Wizard isolation key the state was stored under.
        state_key: String,
    },
    ClearSession {
        session_id: String,
    },
    /// Delete wizard state that has not been touched for the given number of hours.
    Purge {
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..))]
        older_than_hours: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::ValidateManifest { path } => {
            let steps = load_manifest(&path)?;
            let slugs: Vec<String> = steps.slugs().iter().map(ToString::to_string).collect();
            println!("manifest ok: {} steps ({})", steps.len(), slugs.join(", "));
        }
        Command::ListSessions { limit } => {
            let storage = Storage::new(&cli.database_url).await?;
            for entry in storage.list_sessions(limit).await? {
                println!(
                    "{}\t{}\t{} bytes\t{}",
                    entry.session_id,
                    entry.state_key,
                    entry.size_bytes,
                    entry.updated_at.to_rfc3339()
                );
            }
        }
        Command::ShowSession {
            session_id,
            state_key,
        } => {
            let storage = Storage::new(&cli.database_url).await?;
            let session_id = SessionId::new(session_id);
            let value = storage
                .get(&session_id, &state_key)
                .await?
                .with_context(|| format!("no state '{state_key}' for session {session_id}"))?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Command::ClearSession { session_id } => {
            let storage = Storage::new(&cli.database_url).await?;
            let removed = storage.clear_session(&SessionId::new(session_id)).await?;
            println!("removed {removed} entries");
        }
        Command::Purge { older_than_hours } => {
            let cutoff = purge_cutoff(Utc::now(), older_than_hours)?;
            let storage = Storage::new(&cli.database_url).await?;
            let removed = storage.purge_older_than(cutoff).await?;
            println!("purged {removed} entries last updated before {}", cutoff.to_rfc3339());
        }
    }

    Ok(())
}

fn purge_cutoff(now: DateTime<Utc>, older_than_hours: i64) -> Result<DateTime<Utc>> {
    Duration::try_hours(older_than_hours)
        .and_then(|age| now.checked_sub_signed(age))
        .with_context(|| format!("--older-than-hours {older_than_hours} is out of range"))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
