//! Persistent notes with drafts, stored in SQLite.
//!
//! - [`db::Statement`] / [`db::Cursor`]: typed parameter binding and typed
//!   result access over prepared statements
//! - [`db::DraftsRepository`]: in-memory drafts written back to staging tables
//!   in one transaction
//! - [`db::NotesRepository`]: the committed notes
//! - [`db::schema`]: versioned schema bootstrap

pub mod db;
pub mod domain;
pub mod error;

pub use db::{Database, DraftsRepository, NotesRepository, SqliteDatabase};
pub use domain::{Draft, DraftField, MutableDraft, Note};
pub use error::{Error, Result};
