//! Versioned schema bootstrap. The version lives in `PRAGMA user_version`.

use super::{Database, StatementExt};
use crate::error::{Error, Result};

/// Schema version written by this build.
pub const VERSION: i64 = 1;

const CREATE_NOTES_TABLE: &str = "CREATE TABLE notes (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    last_update_date TEXT NOT NULL
)";

/// Edits to already-created notes, one row per note.
const CREATE_PENDING_DRAFTS_UPDATE_TABLE: &str = "CREATE TABLE pending_drafts_update (
    note_id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL
)";

/// The draft of the note not created yet. At most one row, with id 0.
const CREATE_PENDING_DRAFT_CREATION_TABLE: &str = "CREATE TABLE pending_draft_creation (
    id INTEGER PRIMARY KEY CHECK (id = 0),
    title TEXT NOT NULL,
    description TEXT NOT NULL
)";

/// Brings the database schema to [`VERSION`].
pub fn initialize(db: &dyn Database) -> Result<()> {
    let current = read_version(db)?;
    if current == VERSION {
        return Ok(());
    }
    if current > VERSION {
        return Err(Error::SchemaDowngrade {
            current,
            target: VERSION,
        });
    }

    db.execute_transaction(&mut || {
        if current == 0 {
            tracing::info!("Creating the database schema");
            create_schema(db)?;
        }
        db.create_statement(&format!("PRAGMA user_version = {VERSION}"))?
            .execute()
    })
}

pub fn read_version(db: &dyn Database) -> Result<i64> {
    db.create_statement("PRAGMA user_version")?.execute()
}

fn create_schema(db: &dyn Database) -> Result<()> {
    for sql in [
        CREATE_NOTES_TABLE,
        CREATE_PENDING_DRAFTS_UPDATE_TABLE,
        CREATE_PENDING_DRAFT_CREATION_TABLE,
    ] {
        db.create_statement(sql)?.execute::<()>()?;
    }
    Ok(())
}
