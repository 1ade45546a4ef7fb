use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "notes")]
#[command(about = "Notes with drafts, kept in SQLite", version)]
#[command(disable_version_flag = true)]
pub(crate) struct Cli {
    /// Path to the database file
    #[arg(short, long, global = true)]
    pub(crate) database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    pub(crate) verbose: bool,

    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    pub(crate) version: Option<bool>,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Create a note right away
    Add {
        title: String,
        description: Option<String>,
    },
    #[command(alias = "ls")]
    List,
    Search {
        text: String,
    },
    /// Show a note and its pending draft
    Show {
        id: i64,
    },
    /// Delete a note and its pending draft
    #[command(alias = "rm")]
    Remove {
        id: i64,
    },
    /// Work with drafts
    #[command(subcommand)]
    Draft(DraftCommand),
    Version,
}

#[derive(Subcommand)]
pub(crate) enum DraftCommand {
    /// Edit the draft of the next note
    New(DraftFields),
    /// Edit the draft of an existing note
    Edit {
        id: i64,
        #[command(flatten)]
        fields: DraftFields,
    },
    /// Print the new-note draft, or the draft of note ID
    Show {
        id: Option<i64>,
    },
    /// Drop the new-note draft, or the draft of note ID
    Discard {
        id: Option<i64>,
        /// Drop every draft
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },
    /// Turn the new-note draft into a note, or apply the draft of note ID
    Publish {
        id: Option<i64>,
    },
}

#[derive(Args)]
pub(crate) struct DraftFields {
    #[arg(short, long)]
    pub(crate) title: Option<String>,
    #[arg(short = 'm', long)]
    pub(crate) description: Option<String>,
}
