//! Storage layer.
//!
//! Everything above this module talks to SQL through [`Database`],
//! [`Statement`] and [`Cursor`]; [`SqliteDatabase`] is the SQLite
//! implementation of those traits.

pub mod cursor;
pub mod drafts_repo;
pub mod notes_repo;
pub mod schema;
pub mod sqlite;
pub mod statement;

pub use cursor::{BoxCursor, Column, Cursor, CursorExt};
pub use drafts_repo::DraftsRepository;
pub use notes_repo::NotesRepository;
pub use sqlite::{SqliteCursor, SqliteDatabase, SqliteStatement};
pub use statement::{Bind, Execute, Statement, StatementExt};

use crate::error::Result;

/// Boxed statement borrowing the connection it was prepared on.
pub type BoxStatement<'conn> = Box<dyn Statement<'conn> + 'conn>;

/// The storage capability repositories are built on.
pub trait Database {
    /// Prepares a single SQL statement with `?N` positional placeholders.
    fn create_statement<'conn>(&'conn self, sql: &str) -> Result<BoxStatement<'conn>>;

    /// Runs `body` between BEGIN and COMMIT. An error from `body` rolls the
    /// transaction back and is returned unchanged. Called while a transaction
    /// is already open, `body` joins it.
    fn execute_transaction(&self, body: &mut dyn FnMut() -> Result<()>) -> Result<()>;
}
